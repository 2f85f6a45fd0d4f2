//! Per-request outcomes and the success policy that classifies them

// Re-export ErrorKind from error module for convenience
pub use crate::error::ErrorKind;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which HTTP statuses count as success
///
/// Kept separate from redirect following: a 3xx that reaches the client
/// (redirects disabled) is only a success under [`SuccessPolicy::Accept3xx`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessPolicy {
    /// 200..=299
    #[default]
    Strict2xx,
    /// 200..=399
    Accept3xx,
}

impl SuccessPolicy {
    /// Classify a received status
    pub fn is_success(&self, status: u16) -> bool {
        match self {
            SuccessPolicy::Strict2xx => (200..300).contains(&status),
            SuccessPolicy::Accept3xx => (200..400).contains(&status),
        }
    }
}

/// Result of one issued request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Wall-clock time the request was issued
    pub timestamp: DateTime<Utc>,

    /// Issue to full response received
    pub latency: Duration,

    /// Final HTTP status, if one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Why the request failed to complete, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,

    /// Response body bytes
    pub bytes_received: u64,

    /// Outcome of the success policy
    pub success: bool,
}

impl RequestOutcome {
    /// Outcome for a fully received response
    pub fn from_status(
        timestamp: DateTime<Utc>,
        latency: Duration,
        status: u16,
        bytes_received: u64,
        policy: SuccessPolicy,
    ) -> Self {
        Self {
            timestamp,
            latency,
            status: Some(status),
            error: None,
            bytes_received,
            success: policy.is_success(status),
        }
    }

    /// Outcome for a request that never produced a status
    pub fn from_error(timestamp: DateTime<Utc>, latency: Duration, error: ErrorKind) -> Self {
        Self {
            timestamp,
            latency,
            status: None,
            error: Some(error),
            bytes_received: 0,
            success: false,
        }
    }

    /// Status arrived but the body could not be read
    pub fn from_partial(
        timestamp: DateTime<Utc>,
        latency: Duration,
        status: u16,
        error: ErrorKind,
    ) -> Self {
        Self {
            timestamp,
            latency,
            status: Some(status),
            error: Some(error),
            bytes_received: 0,
            success: false,
        }
    }

    /// Latency in fractional milliseconds
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }

    /// Status code as text, or the error tag when no status was received
    pub fn status_or_error(&self) -> String {
        match (self.status, self.error) {
            (Some(status), _) => status.to_string(),
            (None, Some(kind)) => kind.to_string(),
            (None, None) => ErrorKind::Other.to_string(),
        }
    }
}
