//! ## ankare-core::alloc::allocator
//! **The allocator capability consumed by growable backings**
//!
//! Growable pools and buffers never call `std::alloc` directly; they go
//! through a [`RawAllocator`]. That keeps every heap touch observable
//! ([`Counting`]) and boundable ([`Bounded`]).

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use tracing::trace;

use super::stats::MemoryStats;
use crate::error::{AllocError, Result};

/// Allocation capability: `allocate`, `deallocate`, `construct`, `destroy`
/// and `max_size`.
pub trait RawAllocator {
    /// Allocates a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Returns a block obtained from [`RawAllocator::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator with the same
    /// `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Largest single block, in bytes, this allocator can ever provide.
    fn max_size(&self) -> usize {
        isize::MAX as usize
    }

    /// Writes `value` into uninitialized storage.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes and properly aligned.
    unsafe fn construct<T>(&self, ptr: NonNull<T>, value: T)
    where
        Self: Sized,
    {
        // SAFETY: upheld by the caller.
        unsafe { ptr::write(ptr.as_ptr(), value) }
    }

    /// Drops the value at `ptr` in place, leaving the storage uninitialized.
    ///
    /// # Safety
    ///
    /// `ptr` must point at an initialized `T` that is not used afterwards.
    unsafe fn destroy<T>(&self, ptr: NonNull<T>)
    where
        Self: Sized,
    {
        // SAFETY: upheld by the caller.
        unsafe { ptr::drop_in_place(ptr.as_ptr()) }
    }

    /// Largest number of `T` a single block can hold.
    fn max_elements<T>(&self) -> usize
    where
        Self: Sized,
    {
        match mem::size_of::<T>() {
            0 => usize::MAX,
            size => self.max_size() / size,
        }
    }

    /// Allocates an uninitialized array of `count` elements.
    ///
    /// Zero-sized requests never reach the allocator.
    fn allocate_array<T>(&self, count: usize) -> Result<NonNull<T>>
    where
        Self: Sized,
    {
        let layout = array_layout::<T>(count, self.max_elements::<T>())?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        if layout.size() > self.max_size() {
            return Err(AllocError::CapacityExceeded {
                requested: count,
                capacity: self.max_elements::<T>(),
            });
        }
        self.allocate(layout).map(NonNull::cast)
    }

    /// Releases an array obtained from [`RawAllocator::allocate_array`].
    ///
    /// # Safety
    ///
    /// `ptr` and `count` must match a previous `allocate_array::<T>` call and
    /// the elements must already be dropped or moved out.
    unsafe fn deallocate_array<T>(&self, ptr: NonNull<T>, count: usize)
    where
        Self: Sized,
    {
        if let Ok(layout) = Layout::array::<T>(count) {
            if layout.size() != 0 {
                // SAFETY: upheld by the caller.
                unsafe { self.deallocate(ptr.cast(), layout) }
            }
        }
    }
}

fn array_layout<T>(count: usize, max: usize) -> Result<Layout> {
    Layout::array::<T>(count).map_err(|_| AllocError::CapacityExceeded {
        requested: count,
        capacity: max,
    })
}

impl<A: RawAllocator + ?Sized> RawAllocator for &A {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded contract.
        unsafe { (**self).deallocate(ptr, layout) }
    }

    fn max_size(&self) -> usize {
        (**self).max_size()
    }
}

/// The process heap, via `std::alloc`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Global;

impl RawAllocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        // SAFETY: callers never pass a zero-sized layout.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::OutOfMemory {
            bytes: layout.size(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded contract.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// Wraps an allocator and records every call in a shared [`MemoryStats`].
///
/// Clones share the same statistics, so one `Counting` can be handed to
/// several structures and inspected afterwards.
#[derive(Clone, Debug)]
pub struct Counting<A = Global> {
    inner: A,
    stats: Arc<MemoryStats>,
}

impl Counting<Global> {
    pub fn new() -> Self {
        Self::wrap(Global)
    }
}

impl Default for Counting<Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: RawAllocator> Counting<A> {
    pub fn wrap(inner: A) -> Self {
        Self {
            inner,
            stats: Arc::new(MemoryStats::new()),
        }
    }

    /// The statistics shared by this allocator and its clones.
    pub fn stats(&self) -> &Arc<MemoryStats> {
        &self.stats
    }
}

impl<A: RawAllocator> RawAllocator for Counting<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        match self.inner.allocate(layout) {
            Ok(ptr) => {
                self.stats.record_allocation(layout.size());
                trace!(bytes = layout.size(), "block allocated");
                Ok(ptr)
            }
            Err(err) => {
                self.stats.record_failure();
                Err(err)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.record_deallocation(layout.size());
        trace!(bytes = layout.size(), "block released");
        // SAFETY: forwarded contract.
        unsafe { self.inner.deallocate(ptr, layout) }
    }

    fn max_size(&self) -> usize {
        self.inner.max_size()
    }
}

/// Allocator with a hard byte budget.
///
/// A single request larger than the budget can never succeed and reports
/// `CapacityExceeded`; a request that fits the budget but not what is left of
/// it reports `OutOfMemory`.
#[derive(Debug)]
pub struct Bounded<A = Global> {
    inner: A,
    limit: usize,
    in_use: Cell<usize>,
}

impl Bounded<Global> {
    pub fn new(limit: usize) -> Self {
        Self::wrap(Global, limit)
    }
}

impl<A: RawAllocator> Bounded<A> {
    pub fn wrap(inner: A, limit: usize) -> Self {
        Self {
            inner,
            limit,
            in_use: Cell::new(0),
        }
    }

    /// Bytes currently handed out.
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<A: RawAllocator> RawAllocator for Bounded<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        if layout.size() > self.limit {
            return Err(AllocError::CapacityExceeded {
                requested: layout.size(),
                capacity: self.limit,
            });
        }
        let in_use = self.in_use.get();
        if in_use + layout.size() > self.limit {
            return Err(AllocError::OutOfMemory {
                bytes: layout.size(),
            });
        }
        let ptr = self.inner.allocate(layout)?;
        self.in_use.set(in_use + layout.size());
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.in_use.set(self.in_use.get().saturating_sub(layout.size()));
        // SAFETY: forwarded contract.
        unsafe { self.inner.deallocate(ptr, layout) }
    }

    fn max_size(&self) -> usize {
        self.limit.min(self.inner.max_size())
    }
}
