//! ## ankare-core::alloc::stats
//! **Allocator statistics and tracking**
//!
//! [`MemoryStats`] is fed by the [`Counting`](super::allocator::Counting)
//! allocator. Fixed-mode structures never reach an allocator, so a counter
//! that stays at zero is the "no heap touched" check.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Allocation counters.
///
/// Atomic so one instance can be shared through an `Arc` by every clone of a
/// counting allocator.
#[derive(Debug, Default)]
pub struct MemoryStats {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    failures: AtomicUsize,
    bytes_in_use: AtomicUsize,
    peak_bytes: AtomicUsize,
}

impl MemoryStats {
    /// Creates a new `MemoryStats` instance with all counters initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_allocation(&self, bytes: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let in_use = self.bytes_in_use.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak_bytes.fetch_max(in_use, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_deallocation(&self, bytes: usize) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_in_use.fetch_sub(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful allocator calls.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::Relaxed)
    }

    /// Allocator calls that returned an error.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn bytes_in_use(&self) -> usize {
        self.bytes_in_use.load(Ordering::Relaxed)
    }

    /// High-water mark of `bytes_in_use`.
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes.load(Ordering::Relaxed)
    }

    /// Allocations plus deallocations: every time the heap was touched.
    pub fn touches(&self) -> usize {
        self.allocations() + self.deallocations()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            allocations: self.allocations(),
            deallocations: self.deallocations(),
            failures: self.failures(),
            bytes_in_use: self.bytes_in_use(),
            peak_bytes: self.peak_bytes(),
        }
    }
}

/// Point-in-time copy of [`MemoryStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub allocations: usize,
    pub deallocations: usize,
    pub failures: usize,
    pub bytes_in_use: usize,
    pub peak_bytes: usize,
}
