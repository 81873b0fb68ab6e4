//! Checks that span more than one field.
//!
//! Field ranges are declared with `#[validate(...)]` on the structs; what
//! remains here are rules that relate fields to each other.

use ankare_core::alloc::StoreMode;

use crate::{ConfigError, GrowthConfig, PoolConfig, TelemetryConfig};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// `max_capacity`, when set, must not be below `initial_capacity`.
pub fn check_growth(growth: &GrowthConfig) -> Result<(), ConfigError> {
    match growth.max_capacity {
        Some(max) if max < growth.initial_capacity => Err(ConfigError::Inconsistent {
            field: "growth.max_capacity",
            reason: format!(
                "{} is below initial_capacity {}",
                max, growth.initial_capacity
            ),
        }),
        _ => Ok(()),
    }
}

/// A fixed arena cannot pre-reserve more slots than it has.
pub fn check_pool(pool: &PoolConfig) -> Result<(), ConfigError> {
    if pool.mode == StoreMode::Fixed && pool.reserve > pool.arena_slots {
        return Err(ConfigError::Inconsistent {
            field: "pool.reserve",
            reason: format!(
                "{} exceeds the fixed arena of {} slots",
                pool.reserve, pool.arena_slots
            ),
        });
    }
    Ok(())
}

/// The log level is either a bare level or a full filter directive list.
pub fn check_log_level(telemetry: &TelemetryConfig) -> Result<(), ConfigError> {
    let bare = telemetry.log_level.trim().to_lowercase();
    let directive = telemetry.log_level.contains('=') || telemetry.log_level.contains(',');
    if directive || LEVELS.contains(&bare.as_str()) {
        Ok(())
    } else {
        Err(ConfigError::Inconsistent {
            field: "telemetry.log_level",
            reason: format!("unknown level '{}'", telemetry.log_level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_ceiling_below_floor_is_rejected() {
        let growth = GrowthConfig {
            initial_capacity: 64,
            max_capacity: Some(32),
        };
        let err = check_growth(&growth).unwrap_err();
        assert!(err.to_string().contains("growth.max_capacity"));
        assert!(check_growth(&GrowthConfig::default()).is_ok());
    }

    #[test]
    fn fixed_reserve_must_fit_arena() {
        let pool = PoolConfig {
            mode: StoreMode::Fixed,
            arena_slots: 8,
            reserve: 9,
        };
        assert!(check_pool(&pool).is_err());
        let growable = PoolConfig {
            mode: StoreMode::Growable,
            ..pool
        };
        assert!(check_pool(&growable).is_ok());
    }

    #[test]
    fn log_levels() {
        for level in ["info", "WARN", "ankare_core=trace,info"] {
            let telemetry = TelemetryConfig {
                log_level: level.into(),
                ..TelemetryConfig::default()
            };
            assert!(check_log_level(&telemetry).is_ok(), "{level}");
        }
        let telemetry = TelemetryConfig {
            log_level: "loud".into(),
            ..TelemetryConfig::default()
        };
        assert!(check_log_level(&telemetry).is_err());
    }
}
