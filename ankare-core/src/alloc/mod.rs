//! ## ankare-core::alloc
//! **Raw slots, free-list pools and backing strategies**
//!
//! ### Key Submodules:
//! - `raw`: the only place that reinterprets raw memory (slot unions, block
//!   pointer primitives)
//! - `pool`: intrusive free-list pool over slots
//! - `backing`: fixed vs growable slot provisioning for pools
//! - `storage`: fixed vs growable contiguous blocks
//! - `growth`: amortized doubling, migration and shrink-to-fit
//! - `allocator`: the allocator capability and its implementations
//! - `arena`: start-up provisioning of fixed arenas using `bumpalo`
//! - `stats`: allocation counters

pub mod allocator;
pub mod arena;
pub mod backing;
pub mod growth;
pub mod pool;
pub mod raw;
pub mod stats;
pub mod storage;

pub use allocator::{Bounded, Counting, Global, RawAllocator};
pub use arena::SlotArena;
pub use backing::{FixedSlots, HeapSlots, SlotBacking, StoreMode};
pub use growth::{next_capacity, GrowthPolicy, Live};
pub use pool::{FixedPool, GrowablePool, Pool, PoolId, SlotRef};
pub use raw::Slot;
pub use stats::{MemoryStats, StatsSnapshot};
pub use storage::{uninit_block, FixedStorage, HeapStorage, Storage};
