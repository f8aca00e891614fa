//! Error types for SemPlan.
//!
//! Library crates use [`SemPlanError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all SemPlan operations.
#[derive(Debug, thiserror::Error)]
pub enum SemPlanError {
    /// Configuration loading or validation error. Fatal before any stage runs.
    #[error("config error: {message}")]
    Config { message: String },

    /// A collector produced no data or errored. Non-fatal; the pipeline
    /// proceeds with the remaining sources.
    #[error("source failure ({source_id}): {message}")]
    Source { source_id: String, message: String },

    /// No source survived collection; the pipeline has nothing to work with.
    #[error("insufficient data: {message}")]
    InsufficientData { message: String },

    /// Network/HTTP error during collection.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or document parsing error inside a collector.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error (config, cache, deliverable output).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SemPlanError>;

impl SemPlanError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a source failure for the given collector.
    pub fn source(source_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Source {
            source_id: source_id.into(),
            message: msg.into(),
        }
    }

    /// Create an insufficient-data error from any displayable message.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
