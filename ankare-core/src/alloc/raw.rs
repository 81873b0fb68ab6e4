//! ## ankare-core::alloc::raw
//! **Raw slot and block primitives**
//!
//! Every reinterpretation of raw memory in the crate goes through this module:
//!
//! - [`Slot`] overlays a free-list link on the bytes of an unused element. A
//!   small state tag records which member of the overlay is current, so slot
//!   accessors are safe and a free slot can never be read as a value.
//! - The block helpers move, read and drop elements inside contiguous blocks
//!   of possibly-uninitialized `T`. They are `unsafe fn`s; callers own the
//!   "which indices are initialized" bookkeeping.

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use std::slice;

/// Which member of a slot's overlay is current.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotState {
    /// Linked into a free list; the body holds a link.
    Free,
    /// Handed out by `allocate()` but not yet constructed.
    Reserved,
    /// Holds exactly one constructed `T`.
    Live,
}

union SlotBody<T> {
    next: Option<NonNull<Slot<T>>>,
    value: ManuallyDrop<T>,
}

/// One unit of pool storage: either a free-list link or one live `T`.
///
/// Slots are handed to a [`Pool`](super::pool::Pool) either as a caller-owned
/// arena (`&mut [Slot<T>]`) or allocated by the pool itself. A slot never
/// drops its contents on its own; the owning pool does.
pub struct Slot<T> {
    state: SlotState,
    generation: u32,
    body: SlotBody<T>,
}

impl<T> Slot<T> {
    /// An unlinked, unoccupied slot.
    pub const fn vacant() -> Self {
        Slot {
            state: SlotState::Free,
            generation: 0,
            body: SlotBody { next: None },
        }
    }

    /// A stack- or static-friendly arena of `N` vacant slots.
    ///
    /// ```
    /// use ankare_core::alloc::{Pool, Slot};
    ///
    /// let mut arena = Slot::<u64>::array::<8>();
    /// let mut pool = Pool::fixed(&mut arena);
    /// let slot = pool.insert(7).unwrap();
    /// assert_eq!(pool.get(slot), Some(&7));
    /// ```
    pub fn array<const N: usize>() -> [Slot<T>; N] {
        std::array::from_fn(|_| Slot::vacant())
    }

    /// True if the slot holds no value and is not handed out.
    pub fn is_vacant(&self) -> bool {
        self.state == SlotState::Free
    }

    pub(crate) fn state(&self) -> SlotState {
        self.state
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }

    /// Overlays a free-list link on the slot.
    pub(crate) fn link(&mut self, next: Option<NonNull<Slot<T>>>) {
        debug_assert_ne!(self.state, SlotState::Live, "linking a live slot");
        self.state = SlotState::Free;
        self.body.next = next;
    }

    /// The link stored in a free slot.
    pub(crate) fn next(&self) -> Option<NonNull<Slot<T>>> {
        debug_assert_eq!(self.state, SlotState::Free);
        // SAFETY: a free slot's body was last written by `link`.
        unsafe { self.body.next }
    }

    /// Free -> Reserved. Returns the new generation.
    pub(crate) fn claim(&mut self) -> u32 {
        debug_assert_eq!(self.state, SlotState::Free);
        self.generation = self.generation.wrapping_add(1);
        self.state = SlotState::Reserved;
        self.generation
    }

    /// Reserved -> Live.
    pub(crate) fn write(&mut self, value: T) {
        debug_assert_eq!(self.state, SlotState::Reserved);
        self.body.value = ManuallyDrop::new(value);
        self.state = SlotState::Live;
    }

    /// Live -> Reserved, moving the value out.
    pub(crate) fn take(&mut self) -> T {
        debug_assert_eq!(self.state, SlotState::Live);
        self.state = SlotState::Reserved;
        // SAFETY: the slot was Live, so `value` is the initialized member.
        unsafe { ManuallyDrop::take(&mut self.body.value) }
    }

    pub(crate) fn value(&self) -> Option<&T> {
        match self.state {
            // SAFETY: Live slots hold an initialized `value`.
            SlotState::Live => Some(unsafe { &*self.body.value }),
            _ => None,
        }
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut T> {
        match self.state {
            // SAFETY: Live slots hold an initialized `value`.
            SlotState::Live => Some(unsafe { &mut *self.body.value }),
            _ => None,
        }
    }

    /// Drops a live value in place and unlinks the slot.
    pub(crate) fn clear(&mut self) {
        if self.state == SlotState::Live {
            // SAFETY: Live slots hold an initialized `value`; the state is
            // reset right after so it is never dropped twice.
            unsafe { ManuallyDrop::drop(&mut self.body.value) };
            self.state = SlotState::Reserved;
        }
        self.link(None);
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::vacant()
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}

/// A contiguous run of slots handed out by a backing.
pub struct SlotRun<T> {
    base: NonNull<Slot<T>>,
    len: usize,
}

impl<T> SlotRun<T> {
    /// # Safety
    ///
    /// `base` must point at `len` initialized slots that stay valid for as
    /// long as the run (or any pointer derived from it) is used.
    pub(crate) unsafe fn new(base: NonNull<Slot<T>>, len: usize) -> Self {
        Self { base, len }
    }

    pub(crate) fn base(&self) -> NonNull<Slot<T>> {
        self.base
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Pointers to each slot of the run, lowest address first.
    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = NonNull<Slot<T>>> + '_ {
        // SAFETY: every index is below `len`, inside the run.
        (0..self.len).map(move |i| unsafe { self.base.add(i) })
    }
}

impl<T> fmt::Debug for SlotRun<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotRun")
            .field("base", &self.base)
            .field("len", &self.len)
            .finish()
    }
}

/// Header at the front of every heap slot block; blocks form a singly-linked
/// chain through `next`, newest first.
pub(crate) struct BlockHeader<T> {
    next: Option<NonNull<BlockHeader<T>>>,
    len: usize,
    _marker: PhantomData<T>,
}

/// Layout of a header followed by `count` slots, and the offset of the
/// first slot.
pub(crate) fn block_layout<T>(count: usize) -> Option<(Layout, usize)> {
    let slots = Layout::array::<Slot<T>>(count).ok()?;
    let (layout, offset) = Layout::new::<BlockHeader<T>>().extend(slots).ok()?;
    Some((layout.pad_to_align(), offset))
}

/// Writes a header and `count` vacant slots into a fresh block.
///
/// # Safety
///
/// `raw` must point at an allocation of `block_layout::<T>(count)`.
pub(crate) unsafe fn init_block<T>(
    raw: NonNull<u8>,
    count: usize,
    offset: usize,
    next: Option<NonNull<BlockHeader<T>>>,
) -> (NonNull<BlockHeader<T>>, SlotRun<T>) {
    let header = raw.cast::<BlockHeader<T>>();
    // SAFETY: the layout starts with a header and has `count` slots at
    // `offset`.
    unsafe {
        ptr::write(header.as_ptr(), BlockHeader { next, len: count, _marker: PhantomData });
        let base = NonNull::new_unchecked(raw.as_ptr().add(offset)).cast::<Slot<T>>();
        for i in 0..count {
            ptr::write(base.as_ptr().add(i), Slot::vacant());
        }
        (header, SlotRun::new(base, count))
    }
}

/// The slots of a block and the block that was provisioned before it.
///
/// # Safety
///
/// `header` must come from [`init_block`] and still be allocated.
pub(crate) unsafe fn block_parts<T>(
    header: NonNull<BlockHeader<T>>,
) -> (SlotRun<T>, Option<NonNull<BlockHeader<T>>>) {
    // SAFETY: upheld by the caller; the layout is recomputed from the stored
    // length, which is the one the block was created with.
    unsafe {
        let BlockHeader { next, len, .. } = ptr::read(header.as_ptr());
        let offset = block_layout::<T>(len).map_or(0, |(_, offset)| offset);
        let base = NonNull::new_unchecked(header.as_ptr().cast::<u8>().add(offset));
        (SlotRun::new(base.cast(), len), next)
    }
}

/// Reborrows a slot pointer.
///
/// # Safety
///
/// `slot` must point at a live `Slot<T>` that nothing else borrows for `'a`.
#[inline]
pub(crate) unsafe fn slot_mut<'a, T>(slot: NonNull<Slot<T>>) -> &'a mut Slot<T> {
    // SAFETY: upheld by the caller.
    unsafe { &mut *slot.as_ptr() }
}

/// Shared counterpart of [`slot_mut`].
///
/// # Safety
///
/// `slot` must point at a live `Slot<T>` that nothing mutates for `'a`.
#[inline]
pub(crate) unsafe fn slot_ref<'a, T>(slot: NonNull<Slot<T>>) -> &'a Slot<T> {
    // SAFETY: upheld by the caller.
    unsafe { &*slot.as_ptr() }
}

// Block helpers. `base` always points at the first element of a block that
// is at least as long as every index passed alongside it.

/// Moves the value at `index` out of the block.
///
/// # Safety
///
/// `index` must be in bounds and initialized. The slot is uninitialized
/// afterwards.
#[inline]
pub(crate) unsafe fn read<T>(base: *const T, index: usize) -> T {
    // SAFETY: upheld by the caller.
    unsafe { ptr::read(base.add(index)) }
}

/// Writes `value` into an uninitialized in-bounds index.
///
/// # Safety
///
/// `index` must be in bounds. Any value already there is overwritten without
/// being dropped.
#[inline]
pub(crate) unsafe fn write<T>(base: *mut T, index: usize, value: T) {
    // SAFETY: upheld by the caller.
    unsafe { ptr::write(base.add(index), value) }
}

/// Moves one element from `from` to `to` inside the same block.
///
/// # Safety
///
/// Both indices in bounds, `from` initialized, `to` uninitialized (or equal
/// to `from`). `from` is uninitialized afterwards unless the two are equal.
#[inline]
pub(crate) unsafe fn relocate<T>(base: *mut T, from: usize, to: usize) {
    // SAFETY: upheld by the caller; `ptr::copy` tolerates from == to.
    unsafe { ptr::copy(base.add(from), base.add(to), 1) }
}

/// Moves `count` elements from one block into another.
///
/// # Safety
///
/// The source run must be initialized, the destination run uninitialized,
/// and the two blocks distinct allocations.
#[inline]
pub(crate) unsafe fn migrate<T>(
    src: *const T,
    src_offset: usize,
    dst: *mut T,
    dst_offset: usize,
    count: usize,
) {
    // SAFETY: upheld by the caller.
    unsafe { ptr::copy_nonoverlapping(src.add(src_offset), dst.add(dst_offset), count) }
}

/// Moves `count` elements within a block; the runs may overlap.
///
/// # Safety
///
/// Both runs in bounds and the source run initialized. The part of the
/// source not covered by the destination is uninitialized afterwards.
#[inline]
pub(crate) unsafe fn shift<T>(base: *mut T, from: usize, to: usize, count: usize) {
    // SAFETY: upheld by the caller.
    unsafe { ptr::copy(base.add(from), base.add(to), count) }
}

/// Swaps two initialized runs of `count` elements living in distinct blocks.
///
/// # Safety
///
/// Both runs in bounds, initialized and non-overlapping.
#[inline]
pub(crate) unsafe fn exchange<T>(a: *mut T, b: *mut T, count: usize) {
    // SAFETY: upheld by the caller.
    unsafe { ptr::swap_nonoverlapping(a, b, count) }
}

/// Drops `count` initialized elements starting at `offset`.
///
/// # Safety
///
/// The run must be in bounds and initialized; it is uninitialized afterwards.
#[inline]
pub(crate) unsafe fn drop_run<T>(base: *mut T, offset: usize, count: usize) {
    // SAFETY: upheld by the caller.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(offset), count)) }
}

/// Borrows an initialized run.
///
/// # Safety
///
/// The run must be in bounds and initialized, and `base` must stay valid and
/// unaliased by writes for `'a`.
#[inline]
pub(crate) unsafe fn run<'a, T>(base: *const T, offset: usize, count: usize) -> &'a [T] {
    // SAFETY: upheld by the caller.
    unsafe { slice::from_raw_parts(base.add(offset), count) }
}

/// Mutably borrows an initialized run.
///
/// # Safety
///
/// As [`run`], plus exclusive access for `'a`.
#[inline]
pub(crate) unsafe fn run_mut<'a, T>(base: *mut T, offset: usize, count: usize) -> &'a mut [T] {
    // SAFETY: upheld by the caller.
    unsafe { slice::from_raw_parts_mut(base.add(offset), count) }
}

/// Borrows one initialized element.
///
/// # Safety
///
/// As [`run`] for a run of one.
#[inline]
pub(crate) unsafe fn get<'a, T>(base: *const T, index: usize) -> &'a T {
    // SAFETY: upheld by the caller.
    unsafe { &*base.add(index) }
}

/// Mutably borrows one initialized element.
///
/// # Safety
///
/// As [`run_mut`] for a run of one.
#[inline]
pub(crate) unsafe fn get_mut<'a, T>(base: *mut T, index: usize) -> &'a mut T {
    // SAFETY: upheld by the caller.
    unsafe { &mut *base.add(index) }
}
