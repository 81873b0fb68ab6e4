//! ## ankare-core::alloc::backing
//! **Fixed vs growable slot provisioning**
//!
//! A [`Pool`](super::pool::Pool) gets its slots from a [`SlotBacking`]:
//!
//! - [`FixedSlots`] borrows a caller-owned arena for the pool's whole life.
//!   Every slot is available up front and nothing is ever allocated.
//! - [`HeapSlots`] asks a [`RawAllocator`] for slots on demand.
//!
//! The backing is a type parameter, so the pool's hot path is monomorphised
//! per mode instead of branching on every call.

use std::marker::PhantomData;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::allocator::{Global, RawAllocator};
use super::raw::{self, BlockHeader, Slot, SlotRun};
use crate::error::{AllocError, Result};

/// The two backing-store regimes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Caller-owned storage; capacity never changes.
    Fixed,
    /// Self-managed heap storage with amortized growth.
    #[default]
    Growable,
}

impl StoreMode {
    pub fn is_fixed(self) -> bool {
        self == StoreMode::Fixed
    }
}

/// Source of slots for a pool.
pub trait SlotBacking<T> {
    const MODE: StoreMode;

    fn is_fixed(&self) -> bool {
        Self::MODE.is_fixed()
    }

    /// Hard upper bound on slots, if there is one.
    fn capacity(&self) -> Option<usize>;

    /// Slots that exist from construction. Returned once.
    fn seed(&mut self) -> Option<SlotRun<T>>;

    /// Obtains `count` fresh vacant slots as one run.
    fn provision(&mut self, count: usize) -> Result<SlotRun<T>>;

    /// Visits every slot this backing has handed out.
    fn for_each_slot<F: FnMut(&mut Slot<T>)>(&mut self, f: F);
}

/// A caller-owned slot arena.
pub struct FixedSlots<'a, T> {
    run: SlotRun<T>,
    seeded: bool,
    _arena: PhantomData<&'a mut [Slot<T>]>,
}

impl<'a, T> FixedSlots<'a, T> {
    pub fn new(arena: &'a mut [Slot<T>]) -> Self {
        for slot in arena.iter_mut() {
            slot.clear();
        }
        let len = arena.len();
        // SAFETY: the arena is exclusively borrowed for `'a`, which outlives
        // this backing and therefore every pool built on it.
        let run = unsafe { SlotRun::new(NonNull::from(arena).cast(), len) };
        Self {
            run,
            seeded: false,
            _arena: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.run.len()
    }

    pub fn is_empty(&self) -> bool {
        self.run.len() == 0
    }
}

impl<T> SlotBacking<T> for FixedSlots<'_, T> {
    const MODE: StoreMode = StoreMode::Fixed;

    fn capacity(&self) -> Option<usize> {
        Some(self.run.len())
    }

    fn seed(&mut self) -> Option<SlotRun<T>> {
        if self.seeded {
            return None;
        }
        self.seeded = true;
        // SAFETY: same arena, same lifetime as `self.run`.
        Some(unsafe { SlotRun::new(self.run.base(), self.run.len()) })
    }

    fn provision(&mut self, count: usize) -> Result<SlotRun<T>> {
        Err(AllocError::CapacityExceeded {
            requested: self.run.len().saturating_add(count),
            capacity: self.run.len(),
        })
    }

    fn for_each_slot<F: FnMut(&mut Slot<T>)>(&mut self, mut f: F) {
        for slot in self.run.iter() {
            // SAFETY: the arena is exclusively borrowed by this backing.
            f(unsafe { raw::slot_mut(slot) });
        }
    }
}

/// Slots allocated on demand from a [`RawAllocator`].
///
/// Every block carries its own header and the headers form a chain, so the
/// backing never touches memory that did not come from its allocator.
/// Blocks are only returned to the allocator when the backing is dropped;
/// freed slots are recycled through the pool's free list instead.
pub struct HeapSlots<T, A: RawAllocator = Global> {
    alloc: A,
    last: Option<NonNull<BlockHeader<T>>>,
    total: usize,
}

impl<T> HeapSlots<T, Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T> Default for HeapSlots<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: RawAllocator> HeapSlots<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            alloc,
            last: None,
            total: 0,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Slots obtained from the allocator so far.
    pub fn total(&self) -> usize {
        self.total
    }

    fn blocks(&self) -> impl Iterator<Item = SlotRun<T>> + '_ {
        let mut cursor = self.last;
        std::iter::from_fn(move || {
            let header = cursor?;
            // SAFETY: every header in the chain is owned by this backing.
            let (run, next) = unsafe { raw::block_parts(header) };
            cursor = next;
            Some(run)
        })
    }
}

impl<T, A: RawAllocator> SlotBacking<T> for HeapSlots<T, A> {
    const MODE: StoreMode = StoreMode::Growable;

    fn capacity(&self) -> Option<usize> {
        None
    }

    fn seed(&mut self) -> Option<SlotRun<T>> {
        None
    }

    fn provision(&mut self, count: usize) -> Result<SlotRun<T>> {
        let (layout, offset) = match raw::block_layout::<T>(count) {
            Some((layout, offset)) if layout.size() <= self.alloc.max_size() => (layout, offset),
            _ => {
                return Err(AllocError::CapacityExceeded {
                    requested: count,
                    capacity: self.alloc.max_elements::<Slot<T>>(),
                })
            }
        };
        let block = self.alloc.allocate(layout)?;
        // SAFETY: `block` was allocated with the layout computed for `count`.
        let (header, run) = unsafe { raw::init_block(block, count, offset, self.last) };
        self.last = Some(header);
        self.total += count;
        debug!(count, total = self.total, "slots provisioned");
        Ok(run)
    }

    fn for_each_slot<F: FnMut(&mut Slot<T>)>(&mut self, mut f: F) {
        for block in self.blocks() {
            for slot in block.iter() {
                // SAFETY: blocks are owned by this backing.
                f(unsafe { raw::slot_mut(slot) });
            }
        }
    }
}

impl<T, A: RawAllocator> Drop for HeapSlots<T, A> {
    fn drop(&mut self) {
        while let Some(header) = self.last {
            // SAFETY: the header is still allocated; the owning pool has
            // already dropped any live values.
            let (run, next) = unsafe { raw::block_parts(header) };
            self.last = next;
            if let Some((layout, _)) = raw::block_layout::<T>(run.len()) {
                // SAFETY: the block was allocated with this layout.
                unsafe { self.alloc.deallocate(header.cast(), layout) };
            }
        }
    }
}
