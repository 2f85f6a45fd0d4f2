//! Load test configuration
//!
//! One validated [`LoadTestConfig`] is built before the run starts and is never
//! mutated afterwards; the scheduler only reads it.

use crate::request::Scenario;
use crate::response::SuccessPolicy;
use crate::traits::StopCondition;
use std::time::Duration;

/// How workers pace their dispatches
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchMode {
    /// Fixed arrival rate through a shared token bucket
    OpenLoop {
        /// Tokens per second
        rate: f64,
        /// Bucket capacity
        burst: u32,
    },
    /// Each worker dispatches as soon as its previous request completes
    ClosedLoop,
}

/// Load test configuration
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    /// Weighted request mix
    pub scenario: Scenario,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// When to stop dispatching
    pub stop_condition: StopCondition,

    /// Target issue rate in requests per second; `None` means closed-loop
    pub rate_limit: Option<f64>,

    /// Token bucket capacity; defaults to `max(1, round(rate_limit))`
    pub burst: Option<u32>,

    /// Which statuses count as success
    pub success_policy: SuccessPolicy,
}

impl LoadTestConfig {
    /// Config with one worker and the default stop condition
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            concurrency: 1,
            stop_condition: StopCondition::default(),
            rate_limit: None,
            burst: None,
            success_policy: SuccessPolicy::default(),
        }
    }

    /// Set the worker count
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the stop condition
    pub fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop_condition = stop;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit(mut self, rps: f64) -> Self {
        self.rate_limit = Some(rps);
        self
    }

    /// Set the token bucket capacity
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = Some(burst);
        self
    }

    /// Set the success policy
    pub fn with_success_policy(mut self, policy: SuccessPolicy) -> Self {
        self.success_policy = policy;
        self
    }

    /// Dispatch mode implied by the rate limit
    pub fn dispatch_mode(&self) -> DispatchMode {
        match self.rate_limit {
            Some(rate) => DispatchMode::OpenLoop {
                rate,
                burst: self.burst.unwrap_or_else(|| default_burst(rate)),
            },
            None => DispatchMode::ClosedLoop,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if let Some(rps) = self.rate_limit {
            if !rps.is_finite() || rps <= 0.0 {
                return Err(ConfigError::InvalidRateLimit(format!(
                    "rate limit must be positive, got {rps}"
                )));
            }
        }

        if self.burst == Some(0) {
            return Err(ConfigError::InvalidBurst(
                "burst must be at least 1".into(),
            ));
        }

        if let Some(n) = self.stop_condition.request_limit() {
            if n == 0 {
                return Err(ConfigError::InvalidStopCondition(
                    "request count must be at least 1".into(),
                ));
            }
        }

        if let Some(duration) = self.stop_condition.time_limit() {
            if duration.is_zero() {
                return Err(ConfigError::InvalidStopCondition(
                    "duration must be greater than zero".into(),
                ));
            }
        }

        Ok(())
    }
}

/// `max(1, round(rate))`, saturating at `u32::MAX`
pub fn default_burst(rate: f64) -> u32 {
    let rounded = rate.round();
    if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        (rounded as u32).max(1)
    }
}

/// Convert fractional seconds from the command line into a duration
pub fn duration_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ConfigError::InvalidDuration(format!("{secs} is not a positive duration")))
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid rate limit
    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    /// Invalid token bucket capacity
    #[error("Invalid burst: {0}")]
    InvalidBurst(String),

    /// Invalid stop condition
    #[error("Invalid stop condition: {0}")]
    InvalidStopCondition(String),

    /// Neither a duration nor a request count was given
    #[error("Missing stop condition: specify a duration, a request count, or both")]
    MissingStopCondition,

    /// Invalid duration value
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// URL is not an absolute http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Method is not a valid HTTP token
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Invalid per-request timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Scenario is empty or has a bad weight
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}
