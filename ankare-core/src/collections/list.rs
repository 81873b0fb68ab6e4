//! ## ankare-core::collections::list
//! **Doubly-linked list on a [`NodePool`]**
//!
//! Every node is a pool slot, so a fixed list never allocates and a growable
//! list allocates one slot at a time (or one block per `reserve`). Positions
//! are [`NodeRef`]s returned by the insert operations.

use std::fmt;

use crate::alloc::allocator::{Global, RawAllocator};
use crate::alloc::backing::{FixedSlots, HeapSlots, SlotBacking, StoreMode};
use crate::collections::node::{Node, NodePool, NodeRef, NodeSlot};
use crate::error::{AllocError, Result};

pub struct LinkedList<T, B: SlotBacking<Node<T>>> {
    nodes: NodePool<T, B>,
    head: Option<NodeRef<T>>,
    tail: Option<NodeRef<T>>,
    len: usize,
}

/// List over a caller-owned node arena.
pub type FixedList<'a, T> = LinkedList<T, FixedSlots<'a, Node<T>>>;

/// List that allocates nodes on demand.
pub type GrowableList<T, A = Global> = LinkedList<T, HeapSlots<Node<T>, A>>;

impl<'a, T> LinkedList<T, FixedSlots<'a, Node<T>>> {
    pub fn fixed(arena: &'a mut [NodeSlot<T>]) -> Self {
        Self::with_nodes(NodePool::fixed(arena))
    }
}

impl<T> LinkedList<T, HeapSlots<Node<T>, Global>> {
    pub fn growable() -> Self {
        Self::with_nodes(NodePool::growable())
    }
}

impl<T, A: RawAllocator> LinkedList<T, HeapSlots<Node<T>, A>> {
    pub fn growable_in(alloc: A) -> Self {
        Self::with_nodes(NodePool::growable_in(alloc))
    }
}

impl<T, B: SlotBacking<Node<T>>> LinkedList<T, B> {
    pub fn with_nodes(nodes: NodePool<T, B>) -> Self {
        Self {
            nodes,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mode(&self) -> StoreMode {
        self.nodes.mode()
    }

    pub fn is_fixed(&self) -> bool {
        self.nodes.is_fixed()
    }

    /// Node limit for fixed lists.
    pub fn capacity(&self) -> Option<usize> {
        self.nodes.capacity()
    }

    pub fn overflowed(&self) -> bool {
        self.nodes.overflowed()
    }

    pub fn nodes(&self) -> &NodePool<T, B> {
        &self.nodes
    }

    pub fn front_node(&self) -> Option<NodeRef<T>> {
        self.head
    }

    pub fn back_node(&self) -> Option<NodeRef<T>> {
        self.tail
    }

    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|n| self.get(n))
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|n| self.get(n))
    }

    pub fn get(&self, node: NodeRef<T>) -> Option<&T> {
        self.nodes.node(node).map(Node::value)
    }

    pub fn get_mut(&mut self, node: NodeRef<T>) -> Option<&mut T> {
        self.nodes.value_mut(node)
    }

    /// Following node, if `node` belongs to this list.
    pub fn next(&self, node: NodeRef<T>) -> Option<NodeRef<T>> {
        self.nodes.node(node).and_then(Node::next)
    }

    pub fn prev(&self, node: NodeRef<T>) -> Option<NodeRef<T>> {
        self.nodes.node(node).and_then(Node::prev)
    }

    pub fn push_front(&mut self, value: T) -> Result<NodeRef<T>> {
        let node = self.nodes.allocate_node(value, None, self.head)?;
        match self.head {
            Some(old) => self.nodes.set_prev(old, Some(node)),
            None => self.tail = Some(node),
        }
        self.head = Some(node);
        self.len += 1;
        Ok(node)
    }

    pub fn push_back(&mut self, value: T) -> Result<NodeRef<T>> {
        let node = self.nodes.allocate_node(value, self.tail, None)?;
        match self.tail {
            Some(old) => self.nodes.set_next(old, Some(node)),
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(node)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let node = self.head?;
        self.remove(node).ok()
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let node = self.tail?;
        self.remove(node).ok()
    }

    /// Inserts `value` just before `at`.
    pub fn insert_before(&mut self, at: NodeRef<T>, value: T) -> Result<NodeRef<T>> {
        let prev = self.linked(at)?.prev();
        let node = self.nodes.allocate_node(value, prev, Some(at))?;
        self.nodes.set_prev(at, Some(node));
        match prev {
            Some(p) => self.nodes.set_next(p, Some(node)),
            None => self.head = Some(node),
        }
        self.len += 1;
        Ok(node)
    }

    /// Inserts `value` just after `at`.
    pub fn insert_after(&mut self, at: NodeRef<T>, value: T) -> Result<NodeRef<T>> {
        let next = self.linked(at)?.next();
        let node = self.nodes.allocate_node(value, Some(at), next)?;
        self.nodes.set_next(at, Some(node));
        match next {
            Some(n) => self.nodes.set_prev(n, Some(node)),
            None => self.tail = Some(node),
        }
        self.len += 1;
        Ok(node)
    }

    /// Unlinks `node` and returns its value; its slot goes back to the pool.
    pub fn remove(&mut self, node: NodeRef<T>) -> Result<T> {
        let removed = self.nodes.release(node)?;
        let (prev, next) = (removed.prev(), removed.next());
        match prev {
            Some(p) => self.nodes.set_next(p, next),
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes.set_prev(n, prev),
            None => self.tail = prev,
        }
        self.len -= 1;
        Ok(removed.into_value())
    }

    /// Ensures `additional` more nodes can be pushed without failing.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.nodes.reserve(additional)
    }

    /// Drops every value; every node slot returns to the pool.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, T, B> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    fn linked(&self, node: NodeRef<T>) -> Result<&Node<T>> {
        self.nodes
            .node(node)
            .ok_or(AllocError::InvalidArgument("node is not in this list"))
    }
}

impl<T: Clone, B: SlotBacking<Node<T>>> LinkedList<T, B> {
    /// Replaces the contents with clones of `items`.
    ///
    /// A fixed list too small for `items` reports `CapacityExceeded` and
    /// keeps its contents.
    pub fn assign_from_slice(&mut self, items: &[T]) -> Result<()> {
        self.reserve(items.len().saturating_sub(self.len))?;
        self.clear();
        for item in items {
            self.push_back(item.clone())?;
        }
        Ok(())
    }
}

/// Front-to-back iterator over a [`LinkedList`].
pub struct Iter<'a, T, B: SlotBacking<Node<T>>> {
    list: &'a LinkedList<T, B>,
    front: Option<NodeRef<T>>,
    back: Option<NodeRef<T>>,
    remaining: usize,
}

impl<'a, T, B: SlotBacking<Node<T>>> Iterator for Iter<'a, T, B> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.nodes.node(self.front?)?;
        self.front = node.next();
        self.remaining -= 1;
        Some(node.value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, B: SlotBacking<Node<T>>> DoubleEndedIterator for Iter<'a, T, B> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.nodes.node(self.back?)?;
        self.back = node.prev();
        self.remaining -= 1;
        Some(node.value())
    }
}

impl<T, B: SlotBacking<Node<T>>> ExactSizeIterator for Iter<'_, T, B> {}

impl<'a, T, B: SlotBacking<Node<T>>> IntoIterator for &'a LinkedList<T, B> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, B>;

    fn into_iter(self) -> Iter<'a, T, B> {
        self.iter()
    }
}

impl<T: fmt::Debug, B: SlotBacking<Node<T>>> fmt::Debug for LinkedList<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, B: SlotBacking<Node<T>>, B2: SlotBacking<Node<T>>>
    PartialEq<LinkedList<T, B2>> for LinkedList<T, B>
{
    fn eq(&self, other: &LinkedList<T, B2>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::allocator::Counting;
    use std::rc::Rc;

    fn contents<T: Clone, B: SlotBacking<Node<T>>>(list: &LinkedList<T, B>) -> Vec<T> {
        list.iter().cloned().collect()
    }

    #[test]
    fn fixed_list_uses_only_the_arena() {
        let mut arena = NodeSlot::<u32>::array::<3>();
        let mut list = LinkedList::fixed(&mut arena);
        list.push_back(2).unwrap();
        list.push_front(1).unwrap();
        list.push_back(3).unwrap();
        assert_eq!(contents(&list), [1, 2, 3]);
        assert!(list.push_back(4).unwrap_err().is_capacity_exceeded());
        assert!(list.overflowed());
        assert_eq!(list.len(), 3);

        assert_eq!(list.pop_front(), Some(1));
        list.push_back(4).unwrap();
        assert_eq!(contents(&list), [2, 3, 4]);
    }

    #[test]
    fn insert_around_a_node() {
        let mut list = GrowableList::growable();
        let mid = list.push_back('m').unwrap();
        list.insert_before(mid, 'b').unwrap();
        list.insert_after(mid, 'x').unwrap();
        let first = list.front_node().unwrap();
        list.insert_before(first, 'a').unwrap();
        assert_eq!(contents(&list), ['a', 'b', 'm', 'x']);
        assert_eq!(list.back(), Some(&'x'));
        assert_eq!(list.iter().rev().copied().collect::<String>(), "xmba");

        assert_eq!(list.remove(mid), Ok('m'));
        assert_eq!(contents(&list), ['a', 'b', 'x']);
        assert!(matches!(
            list.insert_after(mid, 'z'),
            Err(AllocError::InvalidArgument(_))
        ));
    }

    #[test]
    fn pop_from_both_ends() {
        let mut list = GrowableList::growable();
        for i in 0..4 {
            list.push_back(i).unwrap();
        }
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_front(), Some(0));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), Some(1));
        assert_eq!(list.pop_back(), None);
        assert!(list.front_node().is_none() && list.back_node().is_none());
    }

    #[test]
    fn freed_nodes_are_recycled_without_allocating() {
        let counting = Counting::new();
        let mut list: GrowableList<u64, _> = LinkedList::growable_in(counting.clone());
        list.reserve(8).unwrap();
        for round in 0..10 {
            for i in 0..8 {
                list.push_back(round * 8 + i).unwrap();
            }
            list.clear();
        }
        assert_eq!(counting.stats().allocations(), 1);
    }

    #[test]
    fn fixed_assign_too_large_keeps_contents() {
        let mut arena = NodeSlot::<String>::array::<2>();
        let mut list = LinkedList::fixed(&mut arena);
        list.push_back("keep".to_string()).unwrap();
        let err = list
            .assign_from_slice(&["a".into(), "b".into(), "c".into()])
            .unwrap_err();
        assert_eq!(
            err,
            AllocError::CapacityExceeded {
                requested: 3,
                capacity: 2
            }
        );
        assert_eq!(contents(&list), ["keep"]);
        list.assign_from_slice(&["x".into(), "y".into()]).unwrap();
        assert_eq!(contents(&list), ["x", "y"]);
    }

    #[test]
    fn lists_compare_across_backings() {
        let mut arena = NodeSlot::<i32>::array::<4>();
        let mut fixed = LinkedList::fixed(&mut arena);
        let mut heap = GrowableList::growable();
        fixed.assign_from_slice(&[1, 2, 3]).unwrap();
        heap.assign_from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(fixed, heap);
        *heap.get_mut(heap.back_node().unwrap()).unwrap() = 4;
        assert_ne!(fixed, heap);
        assert_eq!(format!("{heap:?}"), "[1, 2, 4]");
    }

    #[test]
    fn clear_drops_values_and_keeps_the_list_usable() {
        let shared = Rc::new(());
        let mut arena = NodeSlot::<Rc<()>>::array::<4>();
        let mut list = LinkedList::fixed(&mut arena);
        for _ in 0..4 {
            list.push_back(Rc::clone(&shared)).unwrap();
        }
        assert_eq!(Rc::strong_count(&shared), 5);

        list.clear();
        assert_eq!(Rc::strong_count(&shared), 1);
        assert!(list.is_empty());
        for _ in 0..4 {
            list.push_back(Rc::clone(&shared)).unwrap();
        }
        assert_eq!(list.len(), 4);
        drop(list);
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn drop_releases_values() {
        let shared = Rc::new(());
        {
            let mut list = GrowableList::growable();
            for _ in 0..3 {
                list.push_front(Rc::clone(&shared)).unwrap();
            }
            list.pop_back();
            assert_eq!(Rc::strong_count(&shared), 3);
        }
        assert_eq!(Rc::strong_count(&shared), 1);
    }
}
