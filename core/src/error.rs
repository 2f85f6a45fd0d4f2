//! Error types for loadgen-core
//!
//! Two families live here:
//!
//! - [`ErrorKind`] classifies a request that produced no usable response. It is
//!   data, carried inside a [`RequestOutcome`](crate::RequestOutcome), and never
//!   aborts a run.
//! - [`BenchError`] is a real failure of the engine itself: a builder missing a
//!   part, an invalid configuration, every worker crashing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a request that did not yield a complete response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The per-request timeout elapsed
    Timeout,
    /// Connection refused, reset, or name resolution failed
    Connection,
    /// TLS handshake or certificate validation failed
    Tls,
    /// Anything else (malformed response, body read failure, redirect loop)
    Other,
}

impl ErrorKind {
    /// Short tag used in logs and the per-request CSV
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::Tls => "tls",
            ErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchErrorKind {
    /// A required builder part was never supplied
    MissingConfig,
    /// Configuration failed validation
    Config,
    /// Scenario selection failed
    Sampler,
    /// The run was shut down while a worker was still acquiring resources
    Shutdown,
    /// Worker tasks could not be joined
    Orchestration,
}

/// Engine error
#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct BenchError {
    /// Failure category
    pub kind: BenchErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl BenchError {
    fn new(kind: BenchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A builder was finalized without `field`
    pub fn missing_config(field: &str) -> Self {
        Self::new(
            BenchErrorKind::MissingConfig,
            format!("missing required field: {field}"),
        )
    }

    /// Configuration rejected
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(BenchErrorKind::Config, message)
    }

    /// Scenario selection failed
    pub fn sampler(message: impl Into<String>) -> Self {
        Self::new(BenchErrorKind::Sampler, message)
    }

    /// Shared resource closed during shutdown
    pub fn shutdown() -> Self {
        Self::new(BenchErrorKind::Shutdown, "run is shutting down")
    }

    /// Worker lifecycle failure
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::new(BenchErrorKind::Orchestration, message)
    }
}

impl From<crate::config::ConfigError> for BenchError {
    fn from(err: crate::config::ConfigError) -> Self {
        BenchError::config(err.to_string())
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
