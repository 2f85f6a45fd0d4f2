//! Core traits for request executors and scenario samplers
//!
//! These traits are defined in core to avoid circular dependencies.
//! Implementations live in their respective crates (http/, samplers/).

use crate::request::RequestSpec;
use crate::response::RequestOutcome;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Request Executor Trait
// ============================================================================

/// Performs one request and times it
///
/// `execute` is infallible: timeouts, refused connections and TLS failures are
/// folded into the returned [`RequestOutcome`] so the worker loop stays uniform.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Executor identifier (e.g. "reqwest")
    fn name(&self) -> &str;

    /// Issue the request described by `spec`
    async fn execute(&self, spec: &RequestSpec) -> RequestOutcome;
}

// ============================================================================
// Sampler Trait
// ============================================================================

/// Chooses the next request shape for a worker
///
/// Called concurrently by every worker; each call is an independent draw.
pub trait Sampler: Send + Sync {
    /// Sampler name for identification
    fn name(&self) -> &str;

    /// Pick the next request
    fn sample(&self) -> Result<Arc<RequestSpec>, SamplerError>;
}

/// Sampler-specific errors
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// No request shapes to choose from
    #[error("Scenario is empty")]
    Empty,

    /// Weights could not form a distribution
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

// ============================================================================
// Stop Condition
// ============================================================================

/// When the scheduler stops admitting new dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Dispatch exactly N requests in total, across all workers
    RequestCount(usize),

    /// Dispatch until the duration has elapsed
    Duration(Duration),

    /// Whichever of the two limits triggers first
    FirstOf {
        /// Total request budget
        requests: usize,
        /// Wall-clock budget
        duration: Duration,
    },
}

impl StopCondition {
    /// Combine optional limits; `None` when neither is set
    pub fn from_limits(requests: Option<usize>, duration: Option<Duration>) -> Option<Self> {
        match (requests, duration) {
            (Some(requests), Some(duration)) => Some(StopCondition::FirstOf { requests, duration }),
            (Some(requests), None) => Some(StopCondition::RequestCount(requests)),
            (None, Some(duration)) => Some(StopCondition::Duration(duration)),
            (None, None) => None,
        }
    }

    /// Request budget, if any
    pub fn request_limit(&self) -> Option<usize> {
        match *self {
            StopCondition::RequestCount(n) | StopCondition::FirstOf { requests: n, .. } => Some(n),
            StopCondition::Duration(_) => None,
        }
    }

    /// Time budget, if any
    pub fn time_limit(&self) -> Option<Duration> {
        match *self {
            StopCondition::Duration(d) | StopCondition::FirstOf { duration: d, .. } => Some(d),
            StopCondition::RequestCount(_) => None,
        }
    }
}

impl Default for StopCondition {
    fn default() -> Self {
        StopCondition::RequestCount(100)
    }
}
