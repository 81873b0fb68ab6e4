use thiserror::Error;

/// Errors reported by pools, backing stores and the containers built on them.
///
/// Every error is reported synchronously by the call that triggered it and
/// leaves the structure exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// A fixed backing (or an allocator with a hard maximum) was asked for
    /// more than it can ever provide.
    #[error("Capacity exceeded: requested {requested}, capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    /// The underlying allocator failed.
    #[error("Out of memory: allocator refused {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// A reference or position that does not belong to this structure,
    /// or that no longer names a live element.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Access past the logical end.
    #[error("Index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },
}

impl AllocError {
    /// True for [`AllocError::CapacityExceeded`].
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, AllocError::CapacityExceeded { .. })
    }
}

pub type Result<T, E = AllocError> = std::result::Result<T, E>;
