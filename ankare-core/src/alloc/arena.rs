//! ## ankare-core::alloc::arena
//! **Start-up arena provisioning using `bumpalo`**
//!
//! Fixed-mode structures borrow their storage. [`SlotArena`] carves that
//! storage out of one bump region at start-up, so a whole family of fixed
//! pools and buffers costs a handful of allocations up front and nothing
//! afterwards.

use std::mem::MaybeUninit;

use bumpalo::Bump;
use tracing::debug;

use super::raw::Slot;

/// Bump region that hands out slot arrays and uninitialized blocks.
///
/// Values left in the arena are never dropped by it; the structures bound to
/// the arena drop their own contents.
pub struct SlotArena {
    bump: Bump,
}

impl SlotArena {
    pub fn new() -> Self {
        SlotArena { bump: Bump::new() }
    }

    /// Pre-sizes the region so the first `bytes` of provisioning do not
    /// allocate again.
    pub fn with_capacity(bytes: usize) -> Self {
        SlotArena {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// `count` vacant slots for a [`Pool`](super::pool::Pool).
    pub fn slots<T>(&self, count: usize) -> &mut [Slot<T>] {
        debug!(count, "slot arena provisioned");
        self.bump.alloc_slice_fill_with(count, |_| Slot::vacant())
    }

    /// `count` uninitialized elements for a contiguous buffer.
    pub fn block<T>(&self, count: usize) -> &mut [MaybeUninit<T>] {
        debug!(count, "element block provisioned");
        self.bump
            .alloc_slice_fill_with(count, |_| MaybeUninit::uninit())
    }

    /// Block for a ring buffer that must hold `capacity` elements; rings keep
    /// one slot unused.
    pub fn ring_block<T>(&self, capacity: usize) -> &mut [MaybeUninit<T>] {
        self.block(capacity.saturating_add(1))
    }

    /// Bytes reserved from the system so far.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Reclaims every block at once. Requires that nothing borrows the arena.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

impl Default for SlotArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::pool::Pool;

    #[test]
    fn slots_back_a_fixed_pool() {
        let arena = SlotArena::new();
        let slots = arena.slots::<u32>(4);
        assert_eq!(slots.len(), 4);
        assert!(slots.iter().all(Slot::is_vacant));

        let mut pool = Pool::fixed(slots);
        for i in 0..4 {
            pool.insert(i).unwrap();
        }
        assert!(pool.insert(4).is_err());
    }

    #[test]
    fn ring_block_has_one_spare_slot() {
        let arena = SlotArena::with_capacity(256);
        assert_eq!(arena.block::<u64>(3).len(), 3);
        assert_eq!(arena.ring_block::<u64>(3).len(), 4);
    }

    #[test]
    fn reset_reclaims_blocks() {
        let mut arena = SlotArena::new();
        {
            let block = arena.block::<u8>(1024);
            assert_eq!(block.len(), 1024);
        }
        let before = arena.allocated_bytes();
        arena.reset();
        let again = arena.block::<u8>(16);
        assert_eq!(again.len(), 16);
        assert!(arena.allocated_bytes() <= before);
    }
}
