//! # ankare-config
//!
//! Layered configuration for the allocation substrate: growth tuning, pool
//! sizing and telemetry switches.
//!
//! Hierarchy, lowest precedence first:
//! 1. Built-in defaults
//! 2. `config/ankare.yaml`
//! 3. `config/<ANKARE_ENV>.yaml`
//! 4. `ANKARE_*` environment variables, `__` separating sections
//!    (`ANKARE_GROWTH__INITIAL_CAPACITY=64`)

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod growth;
mod pool;
mod telemetry;
pub mod validation;

pub use error::ConfigError;
pub use growth::GrowthConfig;
pub use pool::{ConfiguredPool, PoolConfig};
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/ankare.yaml";
const ENV_PREFIX: &str = "ANKARE_";

/// Top-level configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq, Eq)]
pub struct AnkareConfig {
    #[serde(default)]
    #[validate(nested)]
    pub growth: GrowthConfig,

    #[serde(default)]
    #[validate(nested)]
    pub pool: PoolConfig,

    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl AnkareConfig {
    /// Loads the full hierarchy from the working directory and environment.
    ///
    /// Missing files are skipped; the environment is always consulted.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AnkareConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        let env = std::env::var("ANKARE_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads one YAML file over the defaults, then the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        Self::finish(
            Figment::from(Serialized::defaults(AnkareConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Parses YAML text over the defaults. The environment is not consulted.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::finish(
            Figment::from(Serialized::defaults(AnkareConfig::default())).merge(Yaml::string(yaml)),
        )
    }

    /// Runs field validation and the cross-field checks.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        validation::check_growth(&self.growth)?;
        validation::check_pool(&self.pool)?;
        validation::check_log_level(&self.telemetry)?;
        Ok(())
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.check()?;
        Ok(config)
    }
}
