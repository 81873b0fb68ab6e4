use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("Invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    /// A global subscriber was already installed.
    #[error("Could not install subscriber: {0}")]
    Subscriber(String),
}
