//! ## ankare-telemetry::metrics
//! **Prometheus gauges for allocator statistics**
//!
//! Each [`StatsSnapshot`] is published under a `source` label, so several
//! counting allocators can share one registry.

use ankare_config::TelemetryConfig;
use ankare_core::alloc::StatsSnapshot;
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::error::TelemetryError;

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    allocations: IntGaugeVec,
    deallocations: IntGaugeVec,
    failures: IntGaugeVec,
    bytes_in_use: IntGaugeVec,
    peak_bytes: IntGaugeVec,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGaugeVec, TelemetryError> {
    let gauge = IntGaugeVec::new(Opts::new(name, help), &["source"])?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, TelemetryError> {
        Self::with_registry(Registry::new())
    }

    /// A recorder when `metrics_enabled` is set, `None` otherwise.
    pub fn from_config(config: &TelemetryConfig) -> Result<Option<Self>, TelemetryError> {
        if !config.metrics_enabled {
            return Ok(None);
        }
        Self::new().map(Some)
    }

    /// Registers the gauges in an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, TelemetryError> {
        Ok(Self {
            allocations: gauge(
                &registry,
                "ankare_allocations_total",
                "Blocks obtained from the allocator",
            )?,
            deallocations: gauge(
                &registry,
                "ankare_deallocations_total",
                "Blocks returned to the allocator",
            )?,
            failures: gauge(
                &registry,
                "ankare_allocation_failures_total",
                "Allocator requests that failed",
            )?,
            bytes_in_use: gauge(
                &registry,
                "ankare_bytes_in_use",
                "Bytes currently held from the allocator",
            )?,
            peak_bytes: gauge(
                &registry,
                "ankare_peak_bytes",
                "High-water mark of bytes in use",
            )?,
            registry,
        })
    }

    /// Publishes `stats` under `source`, replacing the previous values.
    pub fn record(&self, source: &str, stats: &StatsSnapshot) {
        let set = |gauge: &IntGaugeVec, value: usize| {
            gauge
                .with_label_values(&[source])
                .set(i64::try_from(value).unwrap_or(i64::MAX));
        };
        set(&self.allocations, stats.allocations);
        set(&self.deallocations, stats.deallocations);
        set(&self.failures, stats.failures);
        set(&self.bytes_in_use, stats.bytes_in_use);
        set(&self.peak_bytes, stats.peak_bytes);
    }

    /// Text exposition of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ankare_core::alloc::{Counting, Pool};

    #[test]
    fn snapshot_is_exported() {
        let counting = Counting::new();
        let mut pool = Pool::growable_in(counting.clone());
        pool.reserve(32).unwrap();
        pool.insert(1u64).unwrap();

        let recorder = MetricsRecorder::new().unwrap();
        recorder.record("pool", &counting.stats().snapshot());
        let text = recorder.gather_metrics().unwrap();
        assert!(text.contains("ankare_allocations_total{source=\"pool\"} 1"));
        assert!(text.contains("ankare_peak_bytes"));
    }

    #[test]
    fn recorder_follows_the_metrics_switch() {
        let mut config = TelemetryConfig::default();
        assert!(MetricsRecorder::from_config(&config).unwrap().is_none());

        config.metrics_enabled = true;
        let recorder = MetricsRecorder::from_config(&config).unwrap().unwrap();
        recorder.record("ring", &Default::default());
        let text = recorder.gather_metrics().unwrap();
        assert!(text.contains("ankare_bytes_in_use{source=\"ring\"} 0"));
    }

    #[test]
    fn registering_twice_fails() {
        let registry = Registry::new();
        MetricsRecorder::with_registry(registry.clone()).unwrap();
        assert!(matches!(
            MetricsRecorder::with_registry(registry),
            Err(TelemetryError::Prometheus(_))
        ));
    }
}
