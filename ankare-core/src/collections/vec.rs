//! ## ankare-core::collections::vec
//! **Contiguous growable array**
//!
//! [`ContiguousBuffer`] keeps `len` initialized elements at the front of one
//! [`Storage`] block. A fixed buffer fails with `CapacityExceeded` when the
//! block is full; a growable one doubles through [`grow`], so `n` pushes cost
//! O(log n) allocator calls.

use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};

use crate::alloc::allocator::{Global, RawAllocator};
use crate::alloc::backing::StoreMode;
use crate::alloc::growth::{self, grow, GrowthPolicy, Live};
use crate::alloc::raw;
use crate::alloc::storage::{FixedStorage, HeapStorage, Storage};
use crate::error::{AllocError, Result};

/// Contiguous array over a [`Storage`] block.
pub struct ContiguousBuffer<T, S: Storage<T>> {
    store: S,
    len: usize,
    _marker: PhantomData<T>,
}

/// Buffer over a caller-owned block.
pub type FixedVec<'a, T> = ContiguousBuffer<T, FixedStorage<'a, T>>;

/// Buffer that owns a heap block.
pub type GrowableVec<T, A = Global> = ContiguousBuffer<T, HeapStorage<T, A>>;

impl<'a, T> ContiguousBuffer<T, FixedStorage<'a, T>> {
    pub fn fixed(block: &'a mut [MaybeUninit<T>]) -> Self {
        Self::new(FixedStorage::new(block))
    }
}

impl<T> ContiguousBuffer<T, HeapStorage<T, Global>> {
    pub fn growable() -> Self {
        Self::new(HeapStorage::new())
    }

    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self::new(HeapStorage::with_policy(policy))
    }

    /// Growable buffer that already holds room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut buf = Self::growable();
        buf.reserve(capacity)?;
        Ok(buf)
    }
}

impl<T, A: RawAllocator> ContiguousBuffer<T, HeapStorage<T, A>> {
    pub fn growable_in(alloc: A) -> Self {
        Self::new(HeapStorage::new_in(alloc))
    }

    pub fn with_policy_in(alloc: A, policy: GrowthPolicy) -> Self {
        Self::new(HeapStorage::with_policy_in(alloc, policy))
    }
}

impl<T, S: Storage<T>> ContiguousBuffer<T, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            len: 0,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn mode(&self) -> StoreMode {
        S::MODE
    }

    pub fn is_fixed(&self) -> bool {
        self.store.is_fixed()
    }

    pub fn storage(&self) -> &S {
        &self.store
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` elements are initialized.
        unsafe { raw::run(self.store.as_ptr(), 0, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first `len` elements are initialized.
        unsafe { raw::run_mut(self.store.as_mut_ptr(), 0, self.len) }
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        self.ensure_room(1)?;
        // SAFETY: `len < capacity` after `ensure_room`.
        unsafe { raw::write(self.store.as_mut_ptr(), self.len, value) };
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: index `len` was the last initialized element.
        Some(unsafe { raw::read(self.store.as_ptr(), self.len) })
    }

    /// Inserts at `index`, shifting the tail right.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(AllocError::OutOfRange {
                index,
                len: self.len,
            });
        }
        self.ensure_room(1)?;
        let base = self.store.as_mut_ptr();
        // SAFETY: `index..len` is initialized and `len + 1 <= capacity`.
        unsafe {
            raw::shift(base, index, index + 1, self.len - index);
            raw::write(base, index, value);
        }
        self.len += 1;
        Ok(())
    }

    /// Removes the element at `index`, shifting the tail left.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(AllocError::OutOfRange {
                index,
                len: self.len,
            });
        }
        let base = self.store.as_mut_ptr();
        // SAFETY: `index < len`; the hole is closed before `len` shrinks.
        let value = unsafe {
            let value = raw::read(base, index);
            raw::shift(base, index + 1, index, self.len - index - 1);
            value
        };
        self.len -= 1;
        Ok(value)
    }

    /// Makes room for `additional` more elements.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.ensure_room(additional)
    }

    /// Releases unused capacity. Does nothing for fixed buffers.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        growth::shrink_to_fit(&mut self.store, Live::contiguous(self.len), 0)
    }

    /// Drops every element past `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        self.len = len;
        // SAFETY: `len..len + tail` was initialized and is now outside the
        // buffer, so a panicking destructor cannot cause a double drop.
        unsafe { raw::drop_run(self.store.as_mut_ptr(), len, tail) };
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Swaps contents with a buffer of any storage.
    ///
    /// Fails with `CapacityExceeded`, leaving both buffers untouched, if a
    /// fixed side cannot hold the other's elements.
    pub fn swap_contents<S2: Storage<T>>(
        &mut self,
        other: &mut ContiguousBuffer<T, S2>,
    ) -> Result<()> {
        check_fits(other.len, &self.store)?;
        check_fits(self.len, &other.store)?;
        self.ensure_room(other.len.saturating_sub(self.len))?;
        other.ensure_room(self.len.saturating_sub(other.len))?;

        let common = self.len.min(other.len);
        let ours = self.store.as_mut_ptr();
        let theirs = other.store.as_mut_ptr();
        // SAFETY: both blocks are distinct, `0..common` is initialized in
        // each, and each block has room for the other's length.
        unsafe {
            raw::exchange(ours, theirs, common);
            if self.len > common {
                raw::migrate(ours, common, theirs, common, self.len - common);
            } else {
                raw::migrate(theirs, common, ours, common, other.len - common);
            }
        }
        std::mem::swap(&mut self.len, &mut other.len);
        Ok(())
    }

    fn ensure_room(&mut self, additional: usize) -> Result<()> {
        let needed = self
            .len
            .checked_add(additional)
            .ok_or(AllocError::CapacityExceeded {
                requested: usize::MAX,
                capacity: self.store.max_capacity(),
            })?;
        if needed <= self.store.capacity() {
            return Ok(());
        }
        grow(&mut self.store, Live::contiguous(self.len), needed, 0)?;
        Ok(())
    }
}

impl<T: Clone, S: Storage<T>> ContiguousBuffer<T, S> {
    /// Appends clones of `items`; nothing is appended if room cannot be made.
    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<()> {
        self.ensure_room(items.len())?;
        for item in items {
            // SAFETY: room for all of `items` was made above.
            unsafe { raw::write(self.store.as_mut_ptr(), self.len, item.clone()) };
            self.len += 1;
        }
        Ok(())
    }

    /// Replaces the contents with clones of `items`.
    ///
    /// A fixed buffer too small for `items` reports `CapacityExceeded` and
    /// keeps its contents.
    pub fn assign_from_slice(&mut self, items: &[T]) -> Result<()> {
        check_fits(items.len(), &self.store)?;
        self.ensure_room(items.len().saturating_sub(self.len))?;
        self.clear();
        self.extend_from_slice(items)
    }

    /// Makes `dst` a copy of this buffer, whatever its storage.
    pub fn clone_into<S2: Storage<T>>(&self, dst: &mut ContiguousBuffer<T, S2>) -> Result<()> {
        dst.assign_from_slice(self.as_slice())
    }

    /// Heap-backed copy of this buffer.
    pub fn to_growable(&self) -> Result<GrowableVec<T>> {
        let mut copy = GrowableVec::with_capacity(self.len)?;
        copy.extend_from_slice(self.as_slice())?;
        Ok(copy)
    }
}

fn check_fits<T, S: Storage<T>>(len: usize, store: &S) -> Result<()> {
    if len > store.max_capacity() {
        return Err(AllocError::CapacityExceeded {
            requested: len,
            capacity: store.max_capacity(),
        });
    }
    Ok(())
}

impl<T, S: Storage<T>> Drop for ContiguousBuffer<T, S> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, S: Storage<T>> Deref for ContiguousBuffer<T, S> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, S: Storage<T>> DerefMut for ContiguousBuffer<T, S> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, S: Storage<T>> AsRef<[T]> for ContiguousBuffer<T, S> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: fmt::Debug, S: Storage<T>> fmt::Debug for ContiguousBuffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq, S: Storage<T>, S2: Storage<T>> PartialEq<ContiguousBuffer<T, S2>>
    for ContiguousBuffer<T, S>
{
    fn eq(&self, other: &ContiguousBuffer<T, S2>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq, S: Storage<T>> PartialEq<[T]> for ContiguousBuffer<T, S> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}
