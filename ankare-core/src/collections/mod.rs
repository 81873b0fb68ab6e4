//! ## ankare-core::collections
//! **Containers built on the allocation substrate**
//!
//! Each container exists in a fixed flavour (borrowing caller storage) and a
//! growable flavour (owning heap storage) with identical behaviour apart
//! from what happens when room runs out.
//!
//! ### Key Submodules:
//! - `node` / `list`: doubly-linked list over a node pool
//! - `vec`: contiguous array
//! - `string`: UTF-8 text over `vec`
//! - `cursor` / `ring`: wrapping indices and the circular buffer

pub mod cursor;
pub mod list;
pub mod node;
pub mod ring;
pub mod string;
pub mod vec;

pub use cursor::CircularCursor;
pub use list::{FixedList, GrowableList, LinkedList};
pub use node::{Node, NodePool, NodeRef, NodeSlot};
pub use ring::{FixedRing, GrowableRing, RingBuffer};
pub use string::{FixedString, GrowableString, StringBuffer};
pub use vec::{ContiguousBuffer, FixedVec, GrowableVec};
