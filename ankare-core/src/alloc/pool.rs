//! ## ankare-core::alloc::pool
//! **Intrusive free-list pool**
//!
//! Free slots are chained through their own unused bytes, so `allocate` and
//! `deallocate` are O(1) pointer swaps and never touch an allocator once a
//! slot exists. Whether new slots can be created at all is up to the
//! [`SlotBacking`].
//!
//! Raw slot management (`allocate`/`deallocate`) and value management
//! (`construct`/`destroy`) are separate steps; `insert`/`remove` combine them.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

use super::allocator::{Global, RawAllocator};
use super::backing::{FixedSlots, HeapSlots, SlotBacking, StoreMode};
use super::raw::{self, Slot, SlotRun, SlotState};
use crate::error::{AllocError, Result};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique pool identity, carried by every [`SlotRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolId(u64);

impl PoolId {
    fn next() -> Self {
        PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Reference to a slot handed out by a [`Pool`].
///
/// Carries the slot's generation and the owning pool's id: a reference that
/// outlived its slot, or one presented to another pool, is rejected with
/// [`AllocError::InvalidArgument`] instead of aliasing recycled storage.
pub struct SlotRef<T> {
    slot: NonNull<Slot<T>>,
    generation: u32,
    pool: PoolId,
}

impl<T> SlotRef<T> {
    /// Address of the underlying slot.
    pub fn addr(&self) -> usize {
        self.slot.as_ptr() as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn pool(&self) -> PoolId {
        self.pool
    }
}

impl<T> Clone for SlotRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SlotRef<T> {}

impl<T> PartialEq for SlotRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.generation == other.generation && self.pool == other.pool
    }
}

impl<T> Eq for SlotRef<T> {}

impl<T> Hash for SlotRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
        self.generation.hash(state);
        self.pool.hash(state);
    }
}

impl<T> fmt::Debug for SlotRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SlotRef({:#x}, gen={}, pool={})",
            self.addr(),
            self.generation,
            self.pool.0
        )
    }
}

/// Free-list pool of `T`-sized slots over a [`SlotBacking`].
pub struct Pool<T, B: SlotBacking<T>> {
    head: Option<NonNull<Slot<T>>>,
    backing: B,
    id: PoolId,
    live: usize,
    free: usize,
    overflowed: bool,
    _marker: PhantomData<T>,
}

/// Pool over a caller-owned arena.
pub type FixedPool<'a, T> = Pool<T, FixedSlots<'a, T>>;

/// Pool that allocates slots on demand.
pub type GrowablePool<T, A = Global> = Pool<T, HeapSlots<T, A>>;

impl<'a, T> Pool<T, FixedSlots<'a, T>> {
    /// Binds a pool to `arena`; all of its slots start on the free list.
    pub fn fixed(arena: &'a mut [Slot<T>]) -> Self {
        Self::new(FixedSlots::new(arena))
    }
}

impl<T> Pool<T, HeapSlots<T, Global>> {
    pub fn growable() -> Self {
        Self::new(HeapSlots::new())
    }
}

impl<T, A: RawAllocator> Pool<T, HeapSlots<T, A>> {
    pub fn growable_in(alloc: A) -> Self {
        Self::new(HeapSlots::new_in(alloc))
    }
}

impl<T, B: SlotBacking<T>> Pool<T, B> {
    pub fn new(mut backing: B) -> Self {
        let seed = backing.seed();
        let mut pool = Self {
            head: None,
            backing,
            id: PoolId::next(),
            live: 0,
            free: 0,
            overflowed: false,
            _marker: PhantomData,
        };
        if let Some(run) = seed {
            pool.chain(run);
        }
        pool
    }

    /// Hands out one uninitialized slot.
    ///
    /// Pops the free list if it is non-empty, otherwise asks the backing for
    /// a new slot. A fixed backing has none to give and reports
    /// `CapacityExceeded`.
    pub fn allocate(&mut self) -> Result<SlotRef<T>> {
        let slot = match self.head {
            Some(slot) => {
                // SAFETY: free-list entries point into this pool's backing.
                self.head = unsafe { raw::slot_ref(slot) }.next();
                self.free -= 1;
                slot
            }
            None => self.allocate_new_slot()?,
        };
        // SAFETY: `slot` belongs to this pool and is no longer linked.
        let generation = unsafe { raw::slot_mut(slot) }.claim();
        self.live += 1;
        trace!(pool = self.id.0, live = self.live, "slot allocated");
        Ok(SlotRef {
            slot,
            generation,
            pool: self.id,
        })
    }

    /// Returns an empty slot to the free list.
    ///
    /// A slot that still holds a value is rejected; `destroy` it first (or
    /// use [`Pool::remove`]).
    pub fn deallocate(&mut self, slot: SlotRef<T>) -> Result<()> {
        let ptr = self.resolve(slot)?;
        // SAFETY: `resolve` checked the slot belongs to this pool.
        if unsafe { raw::slot_ref(ptr) }.state() == SlotState::Live {
            return Err(AllocError::InvalidArgument(
                "slot still holds a value; destroy it first",
            ));
        }
        self.push_free(ptr);
        self.live -= 1;
        trace!(pool = self.id.0, live = self.live, "slot deallocated");
        Ok(())
    }

    /// Moves `value` into an allocated, empty slot.
    pub fn construct(&mut self, slot: SlotRef<T>, value: T) -> Result<()> {
        let ptr = self.resolve(slot)?;
        // SAFETY: `resolve` checked the slot belongs to this pool.
        let slot = unsafe { raw::slot_mut(ptr) };
        if slot.state() != SlotState::Reserved {
            return Err(AllocError::InvalidArgument("slot already holds a value"));
        }
        slot.write(value);
        Ok(())
    }

    /// Moves the value out of a slot, leaving it allocated but empty.
    pub fn destroy(&mut self, slot: SlotRef<T>) -> Result<T> {
        let ptr = self.resolve(slot)?;
        // SAFETY: `resolve` checked the slot belongs to this pool.
        let slot = unsafe { raw::slot_mut(ptr) };
        if slot.state() != SlotState::Live {
            return Err(AllocError::InvalidArgument("slot holds no value"));
        }
        Ok(slot.take())
    }

    /// `allocate` + `construct`.
    pub fn insert(&mut self, value: T) -> Result<SlotRef<T>> {
        let slot = self.allocate()?;
        // SAFETY: freshly claimed by this pool.
        unsafe { raw::slot_mut(slot.slot) }.write(value);
        Ok(slot)
    }

    /// `destroy` + `deallocate`.
    pub fn remove(&mut self, slot: SlotRef<T>) -> Result<T> {
        let value = self.destroy(slot)?;
        self.push_free(slot.slot);
        self.live -= 1;
        trace!(pool = self.id.0, live = self.live, "slot deallocated");
        Ok(value)
    }

    pub fn get(&self, slot: SlotRef<T>) -> Option<&T> {
        let ptr = self.resolve(slot).ok()?;
        // SAFETY: checked by `resolve`; the borrow is tied to `&self`.
        unsafe { raw::slot_ref(ptr) }.value()
    }

    pub fn get_mut(&mut self, slot: SlotRef<T>) -> Option<&mut T> {
        let ptr = self.resolve(slot).ok()?;
        // SAFETY: checked by `resolve`; the borrow is tied to `&mut self`.
        unsafe { raw::slot_mut(ptr) }.value_mut()
    }

    /// Makes sure at least `additional` slots sit on the free list.
    ///
    /// A growable pool allocates the shortfall as a single block. A fixed
    /// pool cannot add slots and reports `CapacityExceeded` without changing
    /// anything.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.free >= additional {
            return Ok(());
        }
        let run = self.backing.provision(additional - self.free)?;
        self.chain(run);
        Ok(())
    }

    /// Drops every live value and returns every slot to the free list.
    ///
    /// Outstanding [`SlotRef`]s become stale.
    /// The rebuilt free list follows address order within each block, the
    /// same order a fresh pool hands slots out in.
    pub fn clear(&mut self) {
        let mut head = None;
        let mut tail: Option<NonNull<Slot<T>>> = None;
        let mut count = 0;
        self.backing.for_each_slot(|slot| {
            slot.clear();
            let ptr = NonNull::from(slot);
            match tail {
                // SAFETY: `prev` was cleared earlier in this walk.
                Some(prev) => unsafe { raw::slot_mut(prev) }.link(Some(ptr)),
                None => head = Some(ptr),
            }
            tail = Some(ptr);
            count += 1;
        });
        self.head = head;
        self.free = count;
        self.live = 0;
    }

    /// Slots currently handed out.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots waiting on the free list.
    pub fn free_slots(&self) -> usize {
        self.free
    }

    /// Slots this pool has obtained so far, free or not.
    pub fn provisioned(&self) -> usize {
        self.live + self.free
    }

    /// Hard upper bound on slots; `None` for growable pools.
    pub fn capacity(&self) -> Option<usize> {
        self.backing.capacity()
    }

    pub fn mode(&self) -> StoreMode {
        B::MODE
    }

    pub fn is_fixed(&self) -> bool {
        self.backing.is_fixed()
    }

    /// True once an allocation has failed for lack of capacity.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// True if `slot` was handed out by this pool and is still allocated.
    pub fn contains(&self, slot: SlotRef<T>) -> bool {
        self.resolve(slot).is_ok()
    }

    fn resolve(&self, slot: SlotRef<T>) -> Result<NonNull<Slot<T>>> {
        if slot.pool != self.id {
            return Err(AllocError::InvalidArgument(
                "slot belongs to a different pool",
            ));
        }
        // SAFETY: the pool id matches, so the pointer is into this pool's
        // backing, which keeps every slot alive as long as the pool.
        let current = unsafe { raw::slot_ref(slot.slot) };
        if current.generation() != slot.generation || current.state() == SlotState::Free {
            return Err(AllocError::InvalidArgument("stale slot reference"));
        }
        Ok(slot.slot)
    }

    fn allocate_new_slot(&mut self) -> Result<NonNull<Slot<T>>> {
        match self.backing.provision(1) {
            Ok(run) => Ok(run.base()),
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    fn note_failure(&mut self, err: &AllocError) {
        if !err.is_capacity_exceeded() {
            return;
        }
        if self.overflowed {
            debug!(pool = self.id.0, %err, "pool still over capacity");
        } else {
            self.overflowed = true;
            warn!(
                pool = self.id.0,
                mode = ?B::MODE,
                live = self.live,
                %err,
                "pool overflowed its capacity"
            );
        }
    }

    fn chain(&mut self, run: SlotRun<T>) {
        for slot in run.iter().rev() {
            self.push_free(slot);
        }
    }

    fn push_free(&mut self, slot: NonNull<Slot<T>>) {
        // SAFETY: callers only pass slots owned by this pool's backing.
        unsafe { raw::slot_mut(slot) }.link(self.head);
        self.head = Some(slot);
        self.free += 1;
    }
}

impl<T, B: SlotBacking<T>> Drop for Pool<T, B> {
    fn drop(&mut self) {
        self.backing.for_each_slot(Slot::clear);
    }
}

impl<T, B: SlotBacking<T>> fmt::Debug for Pool<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id.0)
            .field("mode", &B::MODE)
            .field("live", &self.live)
            .field("free", &self.free)
            .field("overflowed", &self.overflowed)
            .finish()
    }
}
