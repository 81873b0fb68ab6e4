//! Errors raised while loading or checking an [`AnkareConfig`](crate::AnkareConfig).

use std::fmt::Write;
use std::path::PathBuf;

use ankare_core::AllocError;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A field is out of its allowed range.
    #[error("Invalid configuration:\n{}", describe(.0))]
    Validation(#[source] ValidationErrors),

    /// Fields that are valid on their own but contradict each other.
    #[error("Inconsistent configuration: {field}: {reason}")]
    Inconsistent { field: &'static str, reason: String },

    /// Building a pool from the configuration failed.
    #[error("Pool construction failed: {0}")]
    Alloc(#[from] AllocError),

    /// YAML or environment input that does not deserialize.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Parsing(Box::new(err))
    }
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

/// One line per failing field, with nested sections spelled as `a.b`.
fn describe(errors: &ValidationErrors) -> String {
    let mut out = String::new();
    walk(errors, "", &mut out);
    out
}

fn walk(errors: &ValidationErrors, prefix: &str, out: &mut String) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Struct(inner) => walk(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    walk(inner, &format!("{path}[{index}]"), out);
                }
            }
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), |m| m.to_string());
                    let _ = writeln!(out, "  - {path}: {message}");
                }
            }
        }
    }
}
