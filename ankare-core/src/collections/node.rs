//! ## ankare-core::collections::node
//! **Free-list pool of doubly-linked nodes**
//!
//! [`NodePool`] is a [`Pool`] whose slots hold [`Node`]s. Links between nodes
//! are [`SlotRef`]s, so a link into a recycled slot is detected rather than
//! followed.

use std::fmt;

use crate::alloc::allocator::{Global, RawAllocator};
use crate::alloc::backing::{FixedSlots, HeapSlots, SlotBacking, StoreMode};
use crate::alloc::pool::{Pool, SlotRef};
use crate::alloc::raw::Slot;
use crate::error::Result;

/// Reference to a node handed out by a [`NodePool`].
pub type NodeRef<T> = SlotRef<Node<T>>;

/// Arena element for a fixed node pool.
pub type NodeSlot<T> = Slot<Node<T>>;

/// A value plus its neighbours.
pub struct Node<T> {
    value: T,
    prev: Option<NodeRef<T>>,
    next: Option<NodeRef<T>>,
}

impl<T> Node<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn prev(&self) -> Option<NodeRef<T>> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeRef<T>> {
        self.next
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Pool of linked-list nodes.
pub struct NodePool<T, B: SlotBacking<Node<T>>> {
    pool: Pool<Node<T>, B>,
}

impl<'a, T> NodePool<T, FixedSlots<'a, Node<T>>> {
    pub fn fixed(arena: &'a mut [NodeSlot<T>]) -> Self {
        Self {
            pool: Pool::fixed(arena),
        }
    }
}

impl<T> NodePool<T, HeapSlots<Node<T>, Global>> {
    pub fn growable() -> Self {
        Self {
            pool: Pool::growable(),
        }
    }
}

impl<T, A: RawAllocator> NodePool<T, HeapSlots<Node<T>, A>> {
    pub fn growable_in(alloc: A) -> Self {
        Self {
            pool: Pool::growable_in(alloc),
        }
    }
}

impl<T, B: SlotBacking<Node<T>>> NodePool<T, B> {
    /// Allocates and constructs an unlinked-or-prelinked node.
    pub fn allocate_node(
        &mut self,
        value: T,
        prev: Option<NodeRef<T>>,
        next: Option<NodeRef<T>>,
    ) -> Result<NodeRef<T>> {
        self.pool.insert(Node { value, prev, next })
    }

    /// Destroys a node and returns its slot to the free list.
    pub fn release(&mut self, node: NodeRef<T>) -> Result<Node<T>> {
        self.pool.remove(node)
    }

    pub fn node(&self, node: NodeRef<T>) -> Option<&Node<T>> {
        self.pool.get(node)
    }

    pub fn value_mut(&mut self, node: NodeRef<T>) -> Option<&mut T> {
        self.pool.get_mut(node).map(|n| &mut n.value)
    }

    pub fn set_prev(&mut self, node: NodeRef<T>, prev: Option<NodeRef<T>>) {
        if let Some(n) = self.pool.get_mut(node) {
            n.prev = prev;
        }
    }

    pub fn set_next(&mut self, node: NodeRef<T>, next: Option<NodeRef<T>>) {
        if let Some(n) = self.pool.get_mut(node) {
            n.next = next;
        }
    }

    pub fn contains(&self, node: NodeRef<T>) -> bool {
        self.pool.contains(node)
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.pool.reserve(additional)
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn free_slots(&self) -> usize {
        self.pool.free_slots()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.pool.capacity()
    }

    pub fn mode(&self) -> StoreMode {
        self.pool.mode()
    }

    pub fn is_fixed(&self) -> bool {
        self.pool.is_fixed()
    }

    pub fn overflowed(&self) -> bool {
        self.pool.overflowed()
    }
}

impl<T, B: SlotBacking<Node<T>>> fmt::Debug for NodePool<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodePool").field(&self.pool).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_link_through_refs() {
        let mut arena = NodeSlot::<&str>::array::<2>();
        let mut nodes = NodePool::fixed(&mut arena);
        let a = nodes.allocate_node("a", None, None).unwrap();
        let b = nodes.allocate_node("b", Some(a), None).unwrap();
        nodes.set_next(a, Some(b));

        assert_eq!(nodes.node(a).and_then(Node::next), Some(b));
        assert_eq!(nodes.node(b).and_then(Node::prev), Some(a));
        assert!(nodes.allocate_node("c", None, None).is_err());
        assert!(nodes.overflowed());

        let released = nodes.release(a).unwrap();
        assert_eq!(released.into_value(), "a");
        assert!(!nodes.contains(a));
        // The dangling link in `b` no longer resolves.
        let stale = nodes.node(b).and_then(Node::prev);
        assert!(stale.is_some_and(|r| nodes.node(r).is_none()));
    }

    #[test]
    fn value_mut_edits_in_place() {
        let mut nodes = NodePool::growable();
        let n = nodes.allocate_node(1, None, None).unwrap();
        *nodes.value_mut(n).unwrap() += 1;
        assert_eq!(nodes.node(n).map(Node::value), Some(&2));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.capacity(), None);
    }
}
