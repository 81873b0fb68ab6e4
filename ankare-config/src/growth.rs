//! Growth tuning for growable containers.

use ankare_core::alloc::GrowthPolicy;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// How growable storage sizes its blocks.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct GrowthConfig {
    /// Smallest block the first growth allocates (elements).
    #[serde(default)]
    #[validate(range(max = 16777216))]
    pub initial_capacity: usize,

    /// Hard ceiling on elements per block; unset defers to the allocator.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_capacity: Option<usize>,
}

impl GrowthConfig {
    pub fn policy(&self) -> GrowthPolicy {
        GrowthPolicy::new(self.initial_capacity, self.max_capacity)
    }
}

impl From<&GrowthConfig> for GrowthPolicy {
    fn from(config: &GrowthConfig) -> Self {
        config.policy()
    }
}
