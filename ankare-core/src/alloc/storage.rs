//! ## ankare-core::alloc::storage
//! **Contiguous element blocks for buffers and rings**
//!
//! [`Storage`] is the contiguous counterpart of
//! [`SlotBacking`](super::backing::SlotBacking): it owns exactly one block of
//! possibly-uninitialized `T` and knows how to obtain a replacement. The
//! container on top tracks which indices are initialized.

use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use super::allocator::{Global, RawAllocator};
use super::backing::StoreMode;
use super::growth::GrowthPolicy;
use crate::error::{AllocError, Result};

/// One block of element storage.
pub trait Storage<T> {
    const MODE: StoreMode;

    fn is_fixed(&self) -> bool {
        Self::MODE.is_fixed()
    }

    /// Elements the current block can hold.
    fn capacity(&self) -> usize;

    fn as_ptr(&self) -> *const T;

    fn as_mut_ptr(&mut self) -> *mut T;

    /// Largest block this storage can ever hold.
    fn max_capacity(&self) -> usize;

    /// Smallest block the first growth should produce.
    fn initial_capacity(&self) -> usize {
        0
    }

    /// Obtains a fresh block of `capacity` elements without installing it.
    fn allocate_block(&mut self, capacity: usize) -> Result<NonNull<T>>;

    /// Releases the current block and makes `block` current.
    ///
    /// # Safety
    ///
    /// `block` must come from [`Storage::allocate_block`] on this storage
    /// with the same `capacity` (or be dangling with `capacity == 0`), and
    /// every value in the old block must already be moved out or dropped.
    unsafe fn install_block(&mut self, block: NonNull<T>, capacity: usize);
}

/// Caller-owned block of `MaybeUninit<T>`.
pub struct FixedStorage<'a, T> {
    ptr: NonNull<T>,
    cap: usize,
    _block: PhantomData<&'a mut [MaybeUninit<T>]>,
}

impl<'a, T> FixedStorage<'a, T> {
    pub fn new(block: &'a mut [MaybeUninit<T>]) -> Self {
        let cap = block.len();
        Self {
            ptr: NonNull::from(block).cast(),
            cap,
            _block: PhantomData,
        }
    }
}

impl<T> Storage<T> for FixedStorage<'_, T> {
    const MODE: StoreMode = StoreMode::Fixed;

    fn capacity(&self) -> usize {
        self.cap
    }

    fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    fn max_capacity(&self) -> usize {
        self.cap
    }

    fn allocate_block(&mut self, capacity: usize) -> Result<NonNull<T>> {
        Err(AllocError::CapacityExceeded {
            requested: capacity,
            capacity: self.cap,
        })
    }

    unsafe fn install_block(&mut self, block: NonNull<T>, capacity: usize) {
        // Only ever handed its own block back.
        debug_assert!(block == self.ptr && capacity == self.cap);
    }
}

impl<T> fmt::Debug for FixedStorage<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedStorage").field("capacity", &self.cap).finish()
    }
}

/// Heap block obtained from a [`RawAllocator`], replaced wholesale on growth.
pub struct HeapStorage<T, A: RawAllocator = Global> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    policy: GrowthPolicy,
}

impl<T> HeapStorage<T, Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self::with_policy_in(Global, policy)
    }
}

impl<T> Default for HeapStorage<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: RawAllocator> HeapStorage<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self::with_policy_in(alloc, GrowthPolicy::default())
    }

    pub fn with_policy_in(alloc: A, policy: GrowthPolicy) -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            alloc,
            policy,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }
}

impl<T, A: RawAllocator> Storage<T> for HeapStorage<T, A> {
    const MODE: StoreMode = StoreMode::Growable;

    fn capacity(&self) -> usize {
        self.cap
    }

    fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    fn max_capacity(&self) -> usize {
        let limit = self.alloc.max_elements::<T>();
        self.policy.max_capacity.map_or(limit, |max| max.min(limit))
    }

    fn initial_capacity(&self) -> usize {
        self.policy.initial_capacity
    }

    fn allocate_block(&mut self, capacity: usize) -> Result<NonNull<T>> {
        let max = self.max_capacity();
        if capacity > max {
            return Err(AllocError::CapacityExceeded {
                requested: capacity,
                capacity: max,
            });
        }
        self.alloc.allocate_array::<T>(capacity)
    }

    unsafe fn install_block(&mut self, block: NonNull<T>, capacity: usize) {
        // SAFETY: the old block came from `allocate_block` with `self.cap`
        // elements, all of which the caller has emptied.
        unsafe { self.alloc.deallocate_array(self.ptr, self.cap) };
        self.ptr = block;
        self.cap = capacity;
    }
}

impl<T, A: RawAllocator> Drop for HeapStorage<T, A> {
    fn drop(&mut self) {
        // SAFETY: owning containers drop their elements before the storage.
        unsafe { self.alloc.deallocate_array(self.ptr, self.cap) };
    }
}

impl<T, A: RawAllocator> fmt::Debug for HeapStorage<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapStorage")
            .field("capacity", &self.cap)
            .field("policy", &self.policy)
            .finish()
    }
}

/// An uninitialized block of `N` elements, for fixed buffers on the stack.
///
/// ```
/// use ankare_core::alloc::uninit_block;
/// use ankare_core::collections::ContiguousBuffer;
///
/// let mut block = uninit_block::<u32, 4>();
/// let mut buf = ContiguousBuffer::fixed(&mut block);
/// buf.push(1).unwrap();
/// assert_eq!(buf.capacity(), 4);
/// ```
pub fn uninit_block<T, const N: usize>() -> [MaybeUninit<T>; N] {
    std::array::from_fn(|_| MaybeUninit::uninit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::allocator::Counting;

    #[test]
    fn fixed_storage_never_allocates() {
        let mut block = uninit_block::<u64, 3>();
        let mut storage = FixedStorage::new(&mut block);
        assert!(storage.is_fixed());
        assert_eq!(storage.capacity(), 3);
        assert_eq!(storage.max_capacity(), 3);
        assert_eq!(
            storage.allocate_block(6).unwrap_err(),
            AllocError::CapacityExceeded {
                requested: 6,
                capacity: 3
            }
        );
    }

    #[test]
    fn heap_storage_swaps_blocks() {
        let counting = Counting::new();
        let mut storage: HeapStorage<u32, _> = HeapStorage::new_in(counting.clone());
        assert_eq!(storage.capacity(), 0);

        let block = storage.allocate_block(4).unwrap();
        unsafe { storage.install_block(block, 4) };
        assert_eq!(storage.capacity(), 4);
        assert_eq!(storage.as_ptr(), block.as_ptr() as *const u32);

        let bigger = storage.allocate_block(8).unwrap();
        unsafe { storage.install_block(bigger, 8) };
        assert_eq!(counting.stats().allocations(), 2);
        assert_eq!(counting.stats().deallocations(), 1);

        drop(storage);
        assert_eq!(counting.stats().bytes_in_use(), 0);
    }

    #[test]
    fn policy_caps_heap_blocks() {
        let mut storage: HeapStorage<u8> = HeapStorage::with_policy(GrowthPolicy {
            initial_capacity: 2,
            max_capacity: Some(16),
        });
        assert_eq!(storage.max_capacity(), 16);
        assert_eq!(storage.initial_capacity(), 2);
        assert!(matches!(
            storage.allocate_block(17),
            Err(AllocError::CapacityExceeded {
                requested: 17,
                capacity: 16
            })
        ));
    }
}
