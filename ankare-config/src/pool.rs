//! Node pool sizing.
//!
//! Selects between a fixed arena of `arena_slots` slots and a growable pool
//! that pre-reserves `reserve` slots.

use std::fmt;

use ankare_core::alloc::{FixedPool, GrowablePool, Pool, SlotArena, SlotRef, StoreMode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Backing regime for pools built from this configuration.
    #[serde(default)]
    pub mode: StoreMode,

    /// Arena size for fixed pools (slots).
    #[serde(default = "default_arena_slots")]
    #[validate(range(min = 1, max = 16777216))]
    pub arena_slots: usize,

    /// Slots to pre-populate the free list with (growable pools).
    #[serde(default)]
    #[validate(range(max = 16777216))]
    pub reserve: usize,
}

fn default_arena_slots() -> usize {
    1024
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::default(),
            arena_slots: default_arena_slots(),
            reserve: 0,
        }
    }
}

impl PoolConfig {
    /// Builds a pool in the configured mode.
    ///
    /// A fixed pool takes `arena_slots` slots from `arena`; a growable pool
    /// leaves the arena alone. Both start with `reserve` slots on the free
    /// list.
    pub fn build<'a, T>(
        &self,
        arena: &'a SlotArena,
    ) -> Result<ConfiguredPool<'a, T>, ConfigError> {
        let pool = match self.mode {
            StoreMode::Fixed => {
                let mut pool = Pool::fixed(arena.slots(self.arena_slots));
                pool.reserve(self.reserve)?;
                ConfiguredPool::Fixed(pool)
            }
            StoreMode::Growable => {
                let mut pool = Pool::growable();
                pool.reserve(self.reserve)?;
                ConfiguredPool::Growable(pool)
            }
        };
        Ok(pool)
    }
}

/// A pool whose mode was chosen at runtime by a [`PoolConfig`].
pub enum ConfiguredPool<'a, T> {
    Fixed(FixedPool<'a, T>),
    Growable(GrowablePool<T>),
}

impl<T> ConfiguredPool<'_, T> {
    pub fn mode(&self) -> StoreMode {
        match self {
            ConfiguredPool::Fixed(pool) => pool.mode(),
            ConfiguredPool::Growable(pool) => pool.mode(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ConfiguredPool::Fixed(pool) => pool.len(),
            ConfiguredPool::Growable(pool) => pool.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn free_slots(&self) -> usize {
        match self {
            ConfiguredPool::Fixed(pool) => pool.free_slots(),
            ConfiguredPool::Growable(pool) => pool.free_slots(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        match self {
            ConfiguredPool::Fixed(pool) => pool.capacity(),
            ConfiguredPool::Growable(pool) => pool.capacity(),
        }
    }

    pub fn insert(&mut self, value: T) -> ankare_core::Result<SlotRef<T>> {
        match self {
            ConfiguredPool::Fixed(pool) => pool.insert(value),
            ConfiguredPool::Growable(pool) => pool.insert(value),
        }
    }

    pub fn get(&self, slot: SlotRef<T>) -> Option<&T> {
        match self {
            ConfiguredPool::Fixed(pool) => pool.get(slot),
            ConfiguredPool::Growable(pool) => pool.get(slot),
        }
    }

    pub fn remove(&mut self, slot: SlotRef<T>) -> ankare_core::Result<T> {
        match self {
            ConfiguredPool::Fixed(pool) => pool.remove(slot),
            ConfiguredPool::Growable(pool) => pool.remove(slot),
        }
    }
}

impl<T> fmt::Debug for ConfiguredPool<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfiguredPool::Fixed(pool) => f.debug_tuple("Fixed").field(pool).finish(),
            ConfiguredPool::Growable(pool) => f.debug_tuple("Growable").field(pool).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ankare_core::AllocError;

    #[test]
    fn fixed_config_builds_an_arena_pool() {
        let config = PoolConfig {
            mode: StoreMode::Fixed,
            arena_slots: 4,
            reserve: 2,
        };
        let arena = SlotArena::new();
        let mut pool = config.build::<u32>(&arena).unwrap();
        assert_eq!(pool.mode(), StoreMode::Fixed);
        assert_eq!(pool.capacity(), Some(4));
        assert!(arena.allocated_bytes() > 0);

        let slots: Vec<_> = (0..4).map(|i| pool.insert(i).unwrap()).collect();
        assert!(pool.insert(4).unwrap_err().is_capacity_exceeded());
        assert_eq!(pool.remove(slots[1]), Ok(1));
        assert_eq!(pool.get(slots[2]), Some(&2));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn growable_config_pre_reserves() {
        let config = PoolConfig {
            mode: StoreMode::Growable,
            arena_slots: 1,
            reserve: 16,
        };
        let arena = SlotArena::new();
        let mut pool = config.build::<String>(&arena).unwrap();
        assert_eq!(pool.mode(), StoreMode::Growable);
        assert_eq!(pool.capacity(), None);
        assert_eq!(pool.free_slots(), 16);
        assert_eq!(arena.allocated_bytes(), 0);

        let slot = pool.insert("a".to_string()).unwrap();
        assert_eq!(pool.get(slot).map(String::as_str), Some("a"));
        assert!(!pool.is_empty());
    }

    #[test]
    fn fixed_reserve_beyond_the_arena_is_an_alloc_error() {
        let config = PoolConfig {
            mode: StoreMode::Fixed,
            arena_slots: 2,
            reserve: 3,
        };
        let arena = SlotArena::new();
        assert!(matches!(
            config.build::<u8>(&arena),
            Err(ConfigError::Alloc(AllocError::CapacityExceeded { .. }))
        ));
    }
}
