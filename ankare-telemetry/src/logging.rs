//! ## ankare-telemetry::logging
//! **`tracing` subscriber setup**
//!
//! `ankare-core` only emits events; installing a subscriber is left to the
//! embedding application, through [`EventLogger`].

use ankare_config::TelemetryConfig;
use ankare_core::alloc::StatsSnapshot;
use tracing::{info, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::TelemetryError;

#[derive(Clone, Copy, Debug)]
pub struct EventLogger;

impl EventLogger {
    /// Installs a fmt subscriber filtered by `RUST_LOG`, or `info` if unset.
    ///
    /// Leaves an already installed subscriber in place and reports the
    /// failure through it.
    pub fn init() {
        Self::report_init(Self::try_init("info"));
    }

    fn report_init(result: Result<(), TelemetryError>) {
        if let Err(err) = result {
            warn!(%err, "log subscriber not installed");
        }
    }

    /// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to
    /// `default_directive`.
    pub fn try_init(default_directive: &str) -> Result<(), TelemetryError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                EnvFilter::try_new(default_directive).map_err(|err| TelemetryError::Filter {
                    directive: default_directive.to_string(),
                    reason: err.to_string(),
                })?
            }
        };
        fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| TelemetryError::Subscriber(err.to_string()))
    }

    /// [`EventLogger::try_init`] with the configured level.
    pub fn init_from(config: &TelemetryConfig) -> Result<(), TelemetryError> {
        Self::try_init(&config.log_level)
    }

    /// Logs a statistics snapshot at INFO.
    pub fn log_stats(source: &str, stats: &StatsSnapshot) {
        info!(
            source,
            allocations = stats.allocations,
            deallocations = stats.deallocations,
            failures = stats.failures,
            bytes_in_use = stats.bytes_in_use,
            peak_bytes = stats.peak_bytes,
            "allocator statistics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ankare_core::alloc::Counting;
    use ankare_core::collections::{ContiguousBuffer, GrowableVec};
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn stats_are_logged() {
        let counting = Counting::new();
        let mut buf: GrowableVec<u8, _> = ContiguousBuffer::growable_in(counting.clone());
        buf.extend_from_slice(b"ankare").unwrap();

        EventLogger::log_stats("buffer", &counting.stats().snapshot());
        assert!(logs_contain("allocator statistics"));
        assert!(logs_contain("allocations=1"));
        assert!(logs_contain("bytes_in_use=6"));
    }

    #[traced_test]
    #[test]
    fn failed_install_is_reported() {
        EventLogger::report_init(Err(TelemetryError::Subscriber(
            "a global default trace dispatcher has already been set".to_string(),
        )));
        assert!(logs_contain("log subscriber not installed"));
        assert!(logs_contain("already been set"));
    }

    #[test]
    fn bad_default_directive_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(
            EventLogger::try_init("ankare=loudest"),
            Err(TelemetryError::Filter { .. })
        ));
    }
}
