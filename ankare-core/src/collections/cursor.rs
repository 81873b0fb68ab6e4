//! ## ankare-core::collections::cursor
//! **Wrapping indices over a ring block**
//!
//! A [`CircularCursor`] is a position inside the inclusive index range
//! `left..=right` of a block. Stepping past `right` wraps to `left` and the
//! other way round. A ring over a block of `right - left + 1` slots holds at
//! most `right - left` elements; the spare slot tells full from empty.

/// Position in a ring block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CircularCursor {
    pos: usize,
    left: usize,
    right: usize,
}

impl CircularCursor {
    /// Cursor at `pos` over `left..=right`.
    pub fn new(pos: usize, left: usize, right: usize) -> Self {
        debug_assert!(left <= right && (left..=right).contains(&pos));
        Self { pos, left, right }
    }

    /// Cursor at index 0 of a block of `block_len` slots.
    ///
    /// An empty block gets a single-slot period and zero capacity.
    pub fn over(block_len: usize) -> Self {
        Self::new(0, 0, block_len.saturating_sub(1))
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }

    /// Number of slots in the block.
    pub fn span(&self) -> usize {
        self.right - self.left + 1
    }

    /// Most elements a ring over this block can hold.
    pub fn capacity(&self) -> usize {
        self.right - self.left
    }

    pub fn increment(&mut self) {
        if self.pos == self.right {
            self.pos = self.left;
        } else {
            self.pos += 1;
        }
    }

    pub fn decrement(&mut self) {
        if self.pos == self.left {
            self.pos = self.right;
        } else {
            self.pos -= 1;
        }
    }

    /// Moves `n` steps forward, wrapping as often as needed.
    pub fn advance(&mut self, n: usize) {
        let span = self.span();
        let offset = self.pos - self.left;
        self.pos = self.left + (offset + n % span) % span;
    }

    /// Moves `n` steps backward, wrapping as often as needed.
    pub fn retreat(&mut self, n: usize) {
        let span = self.span();
        let offset = self.pos - self.left;
        self.pos = self.left + (offset + span - n % span) % span;
    }

    /// Copy of this cursor moved `n` steps forward.
    pub fn offset(mut self, n: usize) -> Self {
        self.advance(n);
        self
    }

    /// Forward steps from `self` to `other`, through the wrap if needed.
    pub fn distance(&self, other: &Self) -> usize {
        debug_assert_eq!((self.left, self.right), (other.left, other.right));
        let span = self.span();
        (other.pos + span - self.pos) % span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_and_decrement_wrap() {
        let mut cursor = CircularCursor::new(3, 0, 3);
        cursor.increment();
        assert_eq!(cursor.pos(), 0);
        cursor.decrement();
        assert_eq!(cursor.pos(), 3);
        cursor.decrement();
        assert_eq!(cursor.pos(), 2);
    }

    #[test]
    fn advance_and_retreat_are_modulo_span() {
        let mut cursor = CircularCursor::new(2, 0, 4);
        assert_eq!(cursor.span(), 5);
        assert_eq!(cursor.capacity(), 4);
        cursor.advance(4);
        assert_eq!(cursor.pos(), 1);
        cursor.advance(10);
        assert_eq!(cursor.pos(), 1);
        cursor.retreat(3);
        assert_eq!(cursor.pos(), 3);
        cursor.retreat(12);
        assert_eq!(cursor.pos(), 1);
    }

    #[test]
    fn offset_bounds_are_respected() {
        let cursor = CircularCursor::new(5, 4, 7);
        assert_eq!(cursor.offset(2).pos(), 7);
        assert_eq!(cursor.offset(3).pos(), 4);
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn distance_goes_forward_through_the_wrap() {
        let a = CircularCursor::new(3, 0, 4);
        let b = CircularCursor::new(1, 0, 4);
        assert_eq!(a.distance(&b), 3);
        assert_eq!(b.distance(&a), 2);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn empty_block_has_no_capacity() {
        let mut cursor = CircularCursor::over(0);
        assert_eq!(cursor.capacity(), 0);
        cursor.increment();
        assert_eq!(cursor.pos(), 0);
    }
}
