//! Growable containers reach the process heap only through their injected
//! allocator: every heap call made while one runs shows up in its stats.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use ankare_core::alloc::{Counting, GrowablePool, Pool};
use ankare_core::collections::{
    ContiguousBuffer, GrowableList, GrowableRing, GrowableVec, LinkedList, RingBuffer,
};

struct TallyingHeap;

thread_local! {
    static CALLS: Cell<usize> = const { Cell::new(0) };
}

fn tally() {
    let _ = CALLS.try_with(|calls| calls.set(calls.get() + 1));
}

unsafe impl GlobalAlloc for TallyingHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        tally();
        // SAFETY: forwarded contract.
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        tally();
        // SAFETY: forwarded contract.
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static HEAP: TallyingHeap = TallyingHeap;

fn heap_calls() -> usize {
    CALLS.with(Cell::get)
}

/// Runs `work` twice and returns (heap calls, allocator touches) for the
/// second run, so one-time lazy setup stays out of the count.
fn calls_during(work: impl Fn(&Counting)) -> (usize, usize) {
    work(&Counting::new());
    let counting = Counting::new();
    let before = heap_calls();
    work(&counting);
    let heap = heap_calls() - before;
    (heap, counting.stats().touches())
}

#[test]
fn growable_pool_uses_only_its_allocator() {
    let (heap, touches) = calls_during(|counting| {
        let mut pool: GrowablePool<u64, _> = Pool::growable_in(counting.clone());
        let mut last = None;
        for i in 0..40 {
            last = Some(pool.insert(i).unwrap());
        }
        if let Some(slot) = last {
            pool.remove(slot).unwrap();
        }
        pool.reserve(64).unwrap();
        pool.clear();
    });
    assert!(touches > 0);
    assert_eq!(heap, touches);
}

#[test]
fn growable_buffer_uses_only_its_allocator() {
    let (heap, touches) = calls_during(|counting| {
        let mut buf: GrowableVec<u32, _> = ContiguousBuffer::growable_in(counting.clone());
        for i in 0..100 {
            buf.push(i).unwrap();
        }
        buf.insert(0, 7).unwrap();
        buf.truncate(3);
        buf.shrink_to_fit().unwrap();
    });
    assert!(touches > 0);
    assert_eq!(heap, touches);
}

#[test]
fn growable_ring_uses_only_its_allocator() {
    let (heap, touches) = calls_during(|counting| {
        let mut ring: GrowableRing<u32, _> = RingBuffer::growable_in(counting.clone());
        for i in 0..50 {
            ring.push_back(i).unwrap();
            if i % 3 == 0 {
                ring.pop_front();
            }
        }
        ring.push_front(9).unwrap();
        ring.shrink_to_fit().unwrap();
    });
    assert!(touches > 0);
    assert_eq!(heap, touches);
}

#[test]
fn growable_list_uses_only_its_allocator() {
    let (heap, touches) = calls_during(|counting| {
        let mut list: GrowableList<u32, _> = LinkedList::growable_in(counting.clone());
        for i in 0..30 {
            list.push_back(i).unwrap();
        }
        list.pop_front();
        list.clear();
        list.push_front(1).unwrap();
    });
    assert!(touches > 0);
    assert_eq!(heap, touches);
}
