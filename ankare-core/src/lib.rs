//! # ankare-core
//!
//! Allocation substrate for containers that must not touch the heap
//! unexpectedly. Every structure in this crate runs in one of two modes:
//!
//! - **Fixed**: bound to caller-owned storage for its whole life. Capacity
//!   never changes and running out of room is a reported error.
//! - **Growable**: owns its storage through a [`RawAllocator`] and grows by
//!   amortized doubling.
//!
//! The mode is a generic parameter, so a fixed-only build carries no
//! growth code on its hot paths.
//!
//! ### Key Submodules:
//! - `alloc`: raw slots, free-list pools, backing strategies, growth planning,
//!   allocators and statistics
//! - `collections`: linked list, contiguous buffer, string buffer and ring
//!   buffer built on `alloc`
//!
//! ### Expectations:
//! - O(1) slot recycling through an intrusive free list
//! - Zero allocator calls for fixed-mode structures
//! - O(log n) allocator calls for n appends to a growable structure
//!
//! [`RawAllocator`]: alloc::allocator::RawAllocator

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod alloc;
pub mod collections;
pub mod error;

pub mod prelude {
    pub use crate::alloc::*;
    pub use crate::collections::*;
    pub use crate::error::*;
}

pub use error::{AllocError, Result};
