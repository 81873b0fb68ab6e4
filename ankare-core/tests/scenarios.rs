//! End-to-end behaviour of the substrate in both modes.

use std::collections::HashSet;

use ankare_core::alloc::{uninit_block, Counting, Pool, Slot, SlotArena};
use ankare_core::collections::{
    ContiguousBuffer, GrowableRing, GrowableVec, LinkedList, NodeSlot, RingBuffer,
};
use ankare_core::AllocError;

#[test]
fn fixed_pool_of_n_hands_out_n_distinct_slots() {
    const N: usize = 16;
    let mut arena = Slot::<u64>::array::<N>();
    let mut pool = Pool::fixed(&mut arena);

    let refs: Vec<_> = (0..N).map(|_| pool.allocate().unwrap()).collect();
    let distinct: HashSet<_> = refs.iter().map(|r| r.addr()).collect();
    assert_eq!(distinct.len(), N);
    assert!(refs.iter().all(|r| r.addr() != 0));
    assert!(pool.allocate().unwrap_err().is_capacity_exceeded());
    assert_eq!(pool.len(), N);
    assert!(pool.overflowed());
}

#[test]
fn three_slot_arena_reuses_freed_slot() {
    let mut arena = Slot::<char>::array::<3>();
    let mut pool = Pool::fixed(&mut arena);
    let first = pool.allocate().unwrap();
    let second = pool.allocate().unwrap();
    let third = pool.allocate().unwrap();
    let addrs: HashSet<_> = [first, second, third].iter().map(|r| r.addr()).collect();
    assert_eq!(addrs.len(), 3);

    assert!(matches!(
        pool.allocate(),
        Err(AllocError::CapacityExceeded { .. })
    ));

    pool.deallocate(second).unwrap();
    assert_eq!(pool.allocate().unwrap().addr(), second.addr());
}

#[test]
fn fixed_ring_wraps_without_reallocating() {
    let arena = SlotArena::new();
    let mut ring = RingBuffer::fixed(arena.ring_block::<char>(4));
    for c in ['A', 'B', 'C'] {
        ring.push_back(c).unwrap();
    }
    let block = ring.as_ptr();

    ring.push_front('Z').unwrap();
    assert_eq!(ring.iter().collect::<String>(), "ZABC");
    assert_eq!(ring.pop_back(), Some('C'));
    assert_eq!(ring.iter().collect::<String>(), "ZAB");
    ring.push_back('D').unwrap();
    assert_eq!(ring.iter().collect::<String>(), "ZABD");
    assert_eq!(ring.as_ptr(), block);

    let counting = Counting::new();
    let mut heap: GrowableRing<char, _> = RingBuffer::growable_in(counting.clone());
    heap.reserve(4).unwrap();
    heap.assign_from_slice(&['A', 'B', 'C']).unwrap();
    heap.push_front('Z').unwrap();
    heap.pop_back();
    heap.push_back('D').unwrap();
    assert_eq!(heap, ring);
    assert_eq!(counting.stats().allocations(), 1);
}

#[test]
fn growth_from_zero_doubles() {
    let counting = Counting::new();
    let mut buf: GrowableVec<u8, _> = ContiguousBuffer::growable_in(counting.clone());
    assert_eq!(buf.capacity(), 0);

    let mut seen = Vec::new();
    for i in 0..4 {
        buf.push(i).unwrap();
        seen.push((buf.capacity(), counting.stats().allocations()));
    }
    assert_eq!(seen, [(1, 1), (2, 2), (4, 3), (4, 3)]);
}

#[test]
fn insert_from_copies_before_shifting() {
    let mut block = uninit_block::<String, 5>();
    let mut fixed = RingBuffer::fixed(&mut block);
    let mut heap = GrowableRing::with_capacity(4).unwrap();
    for s in ["A", "B", "C"] {
        fixed.push_back(s.to_string()).unwrap();
        heap.push_back(s.to_string()).unwrap();
    }

    let end = fixed.len();
    fixed.insert_from(end, 0).unwrap();
    heap.insert_from(end, 0).unwrap();
    assert_eq!(
        fixed.iter().map(String::as_str).collect::<Vec<_>>(),
        ["A", "B", "C", "A"]
    );
    assert_eq!(fixed, heap);

    // A source that the shift moves.
    heap.erase(3).unwrap();
    heap.insert_from(0, 2).unwrap();
    assert_eq!(
        heap.iter().map(String::as_str).collect::<Vec<_>>(),
        ["C", "A", "B", "C"]
    );
}

#[test]
fn appends_touch_the_allocator_logarithmically() {
    const M: usize = 10_000;
    let counting = Counting::new();
    let mut buf: GrowableVec<u32, _> = ContiguousBuffer::growable_in(counting.clone());
    let mut ring: GrowableRing<u32, _> = RingBuffer::growable_in(counting.clone());
    for i in 0..M as u32 {
        buf.push(i).unwrap();
        ring.push_back(i).unwrap();
    }
    // ceil(log2(M)) + 1 allocations per structure.
    let per_structure = (usize::BITS - (M - 1).leading_zeros()) as usize + 1;
    assert_eq!(counting.stats().allocations(), 2 * per_structure);
    assert!(counting.stats().touches() < 4 * per_structure);
}

#[test]
fn push_pop_round_trip_at_every_fill_level() {
    const CAP: usize = 6;
    for fill in 0..CAP {
        let mut block = uninit_block::<usize, { CAP + 1 }>();
        let mut ring = RingBuffer::fixed(&mut block);
        // Offset the head so some fill levels wrap.
        ring.push_back(0).unwrap();
        ring.pop_front();
        for i in 0..fill {
            ring.push_back(i).unwrap();
        }
        let before: Vec<_> = ring.iter().copied().collect();

        ring.push_back(99).unwrap();
        assert_eq!(ring.pop_back(), Some(99));
        assert_eq!(ring.len(), fill);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), before);

        ring.push_front(98).unwrap();
        assert_eq!(ring.pop_front(), Some(98));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), before);
    }
}

#[test]
fn lifo_reuse_across_containers() {
    let mut arena = NodeSlot::<u32>::array::<4>();
    let mut list = LinkedList::fixed(&mut arena);
    list.push_back(1).unwrap();
    let last = list.push_back(2).unwrap();
    list.remove(last).unwrap();
    let again = list.push_back(3).unwrap();
    assert_eq!(again.addr(), last.addr());
    assert_ne!(again, last);
    assert!(list.get(last).is_none());
}

#[test]
fn failed_mutation_leaves_fixed_structures_unchanged() {
    let mut block = uninit_block::<i32, 3>();
    let mut buf = ContiguousBuffer::fixed(&mut block);
    buf.extend_from_slice(&[1, 2, 3]).unwrap();
    assert!(buf.insert(1, 9).is_err());
    assert!(buf.extend_from_slice(&[4]).is_err());
    assert_eq!(&buf[..], &[1, 2, 3]);

    let mut ring_block = uninit_block::<i32, 3>();
    let mut ring = RingBuffer::fixed(&mut ring_block);
    ring.push_back(1).unwrap();
    ring.push_front(0).unwrap();
    assert!(ring.insert(1, 5).is_err());
    assert!(ring.push_front(-1).is_err());
    assert_eq!(ring.iter().copied().collect::<Vec<_>>(), [0, 1]);
}
