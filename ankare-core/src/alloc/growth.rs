//! ## ankare-core::alloc::growth
//! **Amortized growth and block migration**
//!
//! Growth happens in a fixed order: plan the new capacity, allocate the new
//! block, move the live elements across, release the old block, install the
//! new one. Allocation is the only step that can fail and it runs before
//! anything is touched, so a failed growth leaves the container exactly as it
//! was.
//!
//! ### Key Items:
//! - [`next_capacity`]: the doubling rule.
//! - [`grow`] / [`shrink_to_fit`]: reallocation for any [`Storage`].
//! - [`Live`]: which parts of the old block hold elements, in logical order.

use std::ops::Range;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::raw;
use super::storage::Storage;
use crate::error::{AllocError, Result};

/// `max(min_needed, current == 0 ? 1 : current * 2)`, saturating.
pub const fn next_capacity(current: usize, min_needed: usize) -> usize {
    let doubled = if current == 0 {
        1
    } else {
        current.saturating_mul(2)
    };
    if doubled > min_needed {
        doubled
    } else {
        min_needed
    }
}

/// Tunables for growable storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPolicy {
    /// Lower bound for the first block.
    pub initial_capacity: usize,
    /// Hard ceiling; `None` defers to the allocator's `max_size`.
    pub max_capacity: Option<usize>,
}

impl GrowthPolicy {
    pub const fn new(initial_capacity: usize, max_capacity: Option<usize>) -> Self {
        Self {
            initial_capacity,
            max_capacity,
        }
    }
}

/// The initialized parts of a block, in logical order.
///
/// A contiguous buffer has one run; a wrapped ring has two.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Live {
    pub first: Range<usize>,
    pub second: Range<usize>,
}

impl Live {
    pub fn contiguous(len: usize) -> Self {
        Self {
            first: 0..len,
            second: 0..0,
        }
    }

    pub fn split(first: Range<usize>, second: Range<usize>) -> Self {
        Self { first, second }
    }

    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replaces the storage's block with one that holds at least `min_needed`
/// elements and moves `live` into its front.
///
/// `spare` extra slots are added on top of the element capacity (a ring keeps
/// one slot unused). Returns the new element capacity.
pub fn grow<T, S: Storage<T>>(
    store: &mut S,
    live: Live,
    min_needed: usize,
    spare: usize,
) -> Result<usize> {
    let current = store.capacity().saturating_sub(spare);
    let max = store.max_capacity().saturating_sub(spare);
    if min_needed > max {
        return Err(AllocError::CapacityExceeded {
            requested: min_needed,
            capacity: max,
        });
    }
    let target = next_capacity(current, min_needed)
        .max(store.initial_capacity())
        .min(max);
    relocate(store, &live, target + spare)?;
    debug!(from = current, to = target, "storage grew");
    Ok(target)
}

/// Reallocates to exactly the live length, or releases the block when empty.
///
/// Fixed storage keeps its block.
pub fn shrink_to_fit<T, S: Storage<T>>(store: &mut S, live: Live, spare: usize) -> Result<()> {
    if S::MODE.is_fixed() {
        return Ok(());
    }
    let len = live.len();
    let target = if len == 0 { 0 } else { len + spare };
    if target >= store.capacity() {
        return Ok(());
    }
    let from = store.capacity();
    if target == 0 {
        // SAFETY: nothing is live; a dangling zero-length block is accepted.
        unsafe { store.install_block(NonNull::dangling(), 0) };
    } else {
        relocate(store, &live, target)?;
    }
    debug!(from, to = target, "storage shrank");
    Ok(())
}

fn relocate<T, S: Storage<T>>(store: &mut S, live: &Live, block_len: usize) -> Result<()> {
    let block = store.allocate_block(block_len)?;
    let src = store.as_ptr();
    let dst = block.as_ptr();
    let head = live.first.len();
    // SAFETY: `live` names the initialized runs of the current block, the new
    // block has room for all of them, and the blocks are distinct.
    unsafe {
        raw::migrate(src, live.first.start, dst, 0, head);
        raw::migrate(src, live.second.start, dst, head, live.second.len());
        store.install_block(block, block_len);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::allocator::{Bounded, Counting};
    use crate::alloc::storage::{uninit_block, FixedStorage, HeapStorage};

    #[test]
    fn doubling_rule() {
        assert_eq!(next_capacity(0, 0), 1);
        assert_eq!(next_capacity(0, 5), 5);
        assert_eq!(next_capacity(4, 5), 8);
        assert_eq!(next_capacity(4, 20), 20);
        assert_eq!(next_capacity(usize::MAX, usize::MAX), usize::MAX);
    }

    fn filled(values: &[u32]) -> HeapStorage<u32, Counting> {
        let mut store = HeapStorage::new_in(Counting::new());
        grow(&mut store, Live::default(), values.len(), 0).unwrap();
        for (i, v) in values.iter().enumerate() {
            unsafe { raw::write(store.as_mut_ptr(), i, *v) };
        }
        store
    }

    #[test]
    fn grow_moves_live_runs_in_order() {
        let mut store = filled(&[1, 2, 3, 4]);
        // Logical order: 3, 4, 1, 2.
        let cap = grow(&mut store, Live::split(2..4, 0..2), 5, 0).unwrap();
        assert_eq!(cap, 8);
        assert_eq!(unsafe { raw::run(store.as_ptr(), 0, 4) }, &[3, 4, 1, 2]);
        assert_eq!(store.allocator().stats().allocations(), 2);
        assert_eq!(store.allocator().stats().deallocations(), 1);
    }

    #[test]
    fn grow_respects_initial_and_spare() {
        let mut store: HeapStorage<u8> = HeapStorage::with_policy(GrowthPolicy::new(16, None));
        assert_eq!(grow(&mut store, Live::default(), 1, 1).unwrap(), 16);
        assert_eq!(store.capacity(), 17);
    }

    #[test]
    fn grow_clamps_to_max() {
        let mut store: HeapStorage<u8> = HeapStorage::with_policy(GrowthPolicy::new(0, Some(6)));
        assert_eq!(grow(&mut store, Live::default(), 4, 0).unwrap(), 4);
        assert_eq!(grow(&mut store, Live::default(), 5, 0).unwrap(), 6);
        assert_eq!(
            grow(&mut store, Live::default(), 7, 0),
            Err(AllocError::CapacityExceeded {
                requested: 7,
                capacity: 6
            })
        );
        assert_eq!(store.capacity(), 6);
    }

    #[test]
    fn failed_allocation_keeps_old_block() {
        let bounded = Bounded::new(8);
        let mut store: HeapStorage<u32, _> = HeapStorage::new_in(&bounded);
        grow(&mut store, Live::default(), 1, 0).unwrap();
        unsafe { raw::write(store.as_mut_ptr(), 0, 42) };
        let before = store.as_ptr();

        assert!(matches!(
            grow(&mut store, Live::contiguous(1), 2, 0),
            Err(AllocError::OutOfMemory { bytes: 8 })
        ));
        assert_eq!(store.as_ptr(), before);
        assert_eq!(store.capacity(), 1);
        assert_eq!(unsafe { raw::read(store.as_ptr(), 0) }, 42);
    }

    #[test]
    fn fixed_storage_rejects_growth() {
        let mut block = uninit_block::<u32, 2>();
        let mut store = FixedStorage::new(&mut block);
        assert_eq!(
            grow(&mut store, Live::contiguous(2), 3, 0),
            Err(AllocError::CapacityExceeded {
                requested: 3,
                capacity: 2
            })
        );
        assert!(shrink_to_fit(&mut store, Live::contiguous(0), 0).is_ok());
        assert_eq!(store.capacity(), 2);
    }

    #[test]
    fn shrink_to_fit_releases_when_empty() {
        let mut store = filled(&[7, 8, 9]);
        grow(&mut store, Live::contiguous(3), 10, 0).unwrap();
        shrink_to_fit(&mut store, Live::contiguous(3), 0).unwrap();
        assert_eq!(store.capacity(), 3);
        assert_eq!(unsafe { raw::run(store.as_ptr(), 0, 3) }, &[7, 8, 9]);

        shrink_to_fit(&mut store, Live::contiguous(0), 0).unwrap();
        assert_eq!(store.capacity(), 0);
        assert_eq!(store.allocator().stats().bytes_in_use(), 0);
    }
}
