//! # ankare-telemetry
//!
//! Logging initialisation and Prometheus export of allocator statistics.

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
