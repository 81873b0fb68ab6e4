//! ## ankare-core::collections::ring
//! **Circular buffer over one block**
//!
//! Elements live between a `head` and a `tail` [`CircularCursor`]; the block
//! always keeps one slot unused, so a ring of capacity `n` needs `n + 1`
//! slots. Inserts and erases in the middle move whichever side of the
//! position is shorter. Growth copies the contents into the new block
//! starting at the logical front, which also unwraps them.

use std::fmt;
use std::iter::Chain;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ops::{Index, IndexMut};
use std::slice;

use tracing::trace;

use crate::alloc::allocator::{Global, RawAllocator};
use crate::alloc::backing::StoreMode;
use crate::alloc::growth::{self, grow, GrowthPolicy, Live};
use crate::alloc::raw;
use crate::alloc::storage::{FixedStorage, HeapStorage, Storage};
use crate::collections::cursor::CircularCursor;
use crate::error::{AllocError, Result};

/// Ring slots reserved beyond the element capacity.
const SPARE: usize = 1;

/// Double-ended circular buffer over a [`Storage`] block.
pub struct RingBuffer<T, S: Storage<T>> {
    store: S,
    head: CircularCursor,
    tail: CircularCursor,
    _marker: PhantomData<T>,
}

/// Ring over a caller-owned block of `capacity + 1` slots.
pub type FixedRing<'a, T> = RingBuffer<T, FixedStorage<'a, T>>;

/// Ring that owns a heap block.
pub type GrowableRing<T, A = Global> = RingBuffer<T, HeapStorage<T, A>>;

pub type Iter<'a, T> = Chain<slice::Iter<'a, T>, slice::Iter<'a, T>>;

impl<'a, T> RingBuffer<T, FixedStorage<'a, T>> {
    /// Ring over `block`; it holds at most `block.len() - 1` elements.
    pub fn fixed(block: &'a mut [MaybeUninit<T>]) -> Self {
        Self::new(FixedStorage::new(block))
    }
}

impl<T> RingBuffer<T, HeapStorage<T, Global>> {
    pub fn growable() -> Self {
        Self::new(HeapStorage::new())
    }

    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self::new(HeapStorage::with_policy(policy))
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut ring = Self::growable();
        ring.reserve(capacity)?;
        Ok(ring)
    }
}

impl<T, A: RawAllocator> RingBuffer<T, HeapStorage<T, A>> {
    pub fn growable_in(alloc: A) -> Self {
        Self::new(HeapStorage::new_in(alloc))
    }

    pub fn with_policy_in(alloc: A, policy: GrowthPolicy) -> Self {
        Self::new(HeapStorage::with_policy_in(alloc, policy))
    }
}

impl<T, S: Storage<T>> RingBuffer<T, S> {
    pub fn new(store: S) -> Self {
        let head = CircularCursor::over(store.capacity());
        Self {
            store,
            head,
            tail: head,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.head.distance(&self.tail)
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Most elements the current block can hold.
    pub fn capacity(&self) -> usize {
        self.store.capacity().saturating_sub(SPARE)
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
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

    /// Address of the current block; changes only when the ring reallocates.
    pub fn as_ptr(&self) -> *const T {
        self.store.as_ptr()
    }

    /// Cursor at the first element.
    pub fn head(&self) -> CircularCursor {
        self.head
    }

    /// Cursor one past the last element.
    pub fn tail(&self) -> CircularCursor {
        self.tail
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        // SAFETY: logical `index < len` maps to an initialized slot.
        Some(unsafe { raw::get(self.store.as_ptr(), self.slot(index)) })
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        let slot = self.slot(index);
        // SAFETY: as in `get`, with exclusive access through `&mut self`.
        Some(unsafe { raw::get_mut(self.store.as_mut_ptr(), slot) })
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    pub fn push_back(&mut self, value: T) -> Result<()> {
        self.ensure_room(1)?;
        // SAFETY: the ring is not full, so the tail slot is free.
        unsafe { raw::write(self.store.as_mut_ptr(), self.tail.pos(), value) };
        self.tail.increment();
        Ok(())
    }

    pub fn push_front(&mut self, value: T) -> Result<()> {
        self.ensure_room(1)?;
        self.head.decrement();
        // SAFETY: the ring was not full, so the slot before the head is free.
        unsafe { raw::write(self.store.as_mut_ptr(), self.head.pos(), value) };
        Ok(())
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.tail.decrement();
        // SAFETY: the slot before the old tail held the last element.
        Some(unsafe { raw::read(self.store.as_ptr(), self.tail.pos()) })
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the head slot holds the first element.
        let value = unsafe { raw::read(self.store.as_ptr(), self.head.pos()) };
        self.head.increment();
        Some(value)
    }

    /// Inserts so that `value` ends up at logical `index`.
    ///
    /// Moves `min(index, len - index)` elements.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(AllocError::OutOfRange { index, len });
        }
        self.ensure_room(1)?;
        let base = self.store.as_mut_ptr();
        if index < len - index {
            self.head.decrement();
            for k in 0..index {
                // SAFETY: slot k + 1 is initialized, slot k was vacated by the
                // previous step (or is the new head slot).
                unsafe { raw::relocate(base, self.slot(k + 1), self.slot(k)) };
            }
        } else {
            for k in (index..len).rev() {
                // SAFETY: mirror image of the branch above, towards the tail.
                unsafe { raw::relocate(base, self.slot(k), self.slot(k + 1)) };
            }
            self.tail.increment();
        }
        // SAFETY: slot `index` was vacated by the shift.
        unsafe { raw::write(base, self.slot(index), value) };
        trace!(index, len = len + 1, "ring insert");
        Ok(())
    }

    /// Removes and returns the element at logical `index`.
    ///
    /// Moves `min(index, len - index - 1)` elements.
    pub fn erase(&mut self, index: usize) -> Result<T> {
        let len = self.len();
        if index >= len {
            return Err(AllocError::OutOfRange { index, len });
        }
        let base = self.store.as_mut_ptr();
        // SAFETY: `index < len`; the hole is filled by the shift below.
        let value = unsafe { raw::read(base, self.slot(index)) };
        if index < len - 1 - index {
            for k in (0..index).rev() {
                // SAFETY: slot k is initialized, slot k + 1 is the hole.
                unsafe { raw::relocate(base, self.slot(k), self.slot(k + 1)) };
            }
            self.head.increment();
        } else {
            for k in index + 1..len {
                // SAFETY: slot k is initialized, slot k - 1 is the hole.
                unsafe { raw::relocate(base, self.slot(k), self.slot(k - 1)) };
            }
            self.tail.decrement();
        }
        trace!(index, len = len - 1, "ring erase");
        Ok(value)
    }

    /// Makes room for `additional` more elements.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.ensure_room(additional)
    }

    /// Releases unused capacity. Does nothing for fixed rings.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        let before = self.store.capacity();
        let len = self.len();
        let live = self.live();
        growth::shrink_to_fit(&mut self.store, live, SPARE)?;
        if self.store.capacity() != before {
            self.reset_cursors(len);
        }
        Ok(())
    }

    /// Drops every element; the capacity is kept.
    pub fn clear(&mut self) {
        let (first, second) = self.live_runs();
        self.tail = self.head;
        let base = self.store.as_mut_ptr();
        // SAFETY: the runs were initialized and are no longer reachable.
        unsafe {
            raw::drop_run(base, first.start, first.len());
            raw::drop_run(base, second.start, second.len());
        }
    }

    /// The contents in logical order as at most two slices.
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let (first, second) = self.live_runs();
        let base = self.store.as_ptr();
        // SAFETY: both runs are initialized.
        unsafe {
            (
                raw::run(base, first.start, first.len()),
                raw::run(base, second.start, second.len()),
            )
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let (first, second) = self.as_slices();
        first.iter().chain(second.iter())
    }

    /// Physical slot of logical `index`.
    fn slot(&self, index: usize) -> usize {
        self.head.offset(index).pos()
    }

    fn live_runs(&self) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let len = self.len();
        let start = self.head.pos();
        let first = len.min(self.head.span() - start);
        (start..start + first, 0..len - first)
    }

    fn live(&self) -> Live {
        let (first, second) = self.live_runs();
        Live::split(first, second)
    }

    fn reset_cursors(&mut self, len: usize) {
        self.head = CircularCursor::over(self.store.capacity());
        self.tail = self.head.offset(len);
    }

    fn ensure_room(&mut self, additional: usize) -> Result<()> {
        let len = self.len();
        let needed = len
            .checked_add(additional)
            .ok_or(AllocError::CapacityExceeded {
                requested: usize::MAX,
                capacity: self.capacity(),
            })?;
        if needed <= self.capacity() {
            return Ok(());
        }
        let live = self.live();
        grow(&mut self.store, live, needed, SPARE)?;
        self.reset_cursors(len);
        Ok(())
    }
}

impl<T: Clone, S: Storage<T>> RingBuffer<T, S> {
    /// Inserts a copy of the element at logical `src` so that it lands at
    /// logical `index`.
    ///
    /// The copy is taken before anything moves, so `src` may be any
    /// position, including one the insert shifts or one that growth
    /// relocates.
    pub fn insert_from(&mut self, index: usize, src: usize) -> Result<()> {
        let value = self
            .get(src)
            .cloned()
            .ok_or(AllocError::OutOfRange {
                index: src,
                len: self.len(),
            })?;
        self.insert(index, value)
    }

    /// Replaces the contents with clones of `items`.
    ///
    /// A fixed ring too small for `items` reports `CapacityExceeded` and
    /// keeps its contents.
    pub fn assign_from_slice(&mut self, items: &[T]) -> Result<()> {
        let len = self.len();
        if items.len() > self.capacity() {
            self.ensure_room(items.len() - len)?;
        }
        self.clear();
        for item in items {
            self.push_back(item.clone())?;
        }
        Ok(())
    }
}

impl<T, S: Storage<T>> Drop for RingBuffer<T, S> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, S: Storage<T>> Index<usize> for RingBuffer<T, S> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("ring index {index} out of range for length {}", self.len()),
        }
    }
}

impl<T, S: Storage<T>> IndexMut<usize> for RingBuffer<T, S> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("ring index {index} out of range for length {len}"),
        }
    }
}

impl<'a, T, S: Storage<T>> IntoIterator for &'a RingBuffer<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: fmt::Debug, S: Storage<T>> fmt::Debug for RingBuffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, S: Storage<T>, S2: Storage<T>> PartialEq<RingBuffer<T, S2>>
    for RingBuffer<T, S>
{
    fn eq(&self, other: &RingBuffer<T, S2>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}
