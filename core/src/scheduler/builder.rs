//! Builder pattern for Scheduler construction

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::channel::{outcome_channel, ChannelConfig};
use crate::config::LoadTestConfig;
use crate::error::{BenchError, BenchResult};
use crate::response::RequestOutcome;
use crate::traits::{RequestExecutor, Sampler};

use super::executor::Scheduler;

/// Builder for creating a Scheduler with proper configuration
///
/// # Example
///
/// ```ignore
/// let (scheduler, log_rx) = SchedulerBuilder::new()
///     .config(config)
///     .executor(executor)
///     .sampler(sampler)
///     .request_log(ChannelConfig::default())
///     .build()?;
/// ```
pub struct SchedulerBuilder {
    config: Option<LoadTestConfig>,
    executor: Option<Arc<dyn RequestExecutor>>,
    sampler: Option<Arc<dyn Sampler>>,
    request_log: Option<ChannelConfig>,
}

impl SchedulerBuilder {
    /// Create an empty scheduler builder
    pub fn new() -> Self {
        Self {
            config: None,
            executor: None,
            sampler: None,
            request_log: None,
        }
    }

    /// Set the load test configuration
    pub fn config(mut self, config: LoadTestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the request executor
    pub fn executor(mut self, executor: Arc<dyn RequestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set the sampler
    pub fn sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Stream every outcome to a receiver returned from [`build`](Self::build)
    pub fn request_log(mut self, channel: ChannelConfig) -> Self {
        self.request_log = Some(channel);
        self
    }

    /// Build the scheduler and, if a request log was requested, its receiver
    ///
    /// # Errors
    ///
    /// Returns an error if the config, executor or sampler are not set, or if
    /// configuration validation fails.
    pub fn build(self) -> BenchResult<(Scheduler, Option<mpsc::Receiver<RequestOutcome>>)> {
        let config = self
            .config
            .ok_or_else(|| BenchError::missing_config("config"))?;

        let executor = self
            .executor
            .ok_or_else(|| BenchError::missing_config("executor"))?;

        let sampler = self
            .sampler
            .ok_or_else(|| BenchError::missing_config("sampler"))?;

        config.validate()?;

        let (log_tx, log_rx) = match &self.request_log {
            Some(channel) => {
                let (tx, rx) = outcome_channel(channel);
                (Some(tx), Some(rx))
            }
            None => (None, None),
        };

        let scheduler = Scheduler::new(config, executor, sampler, log_tx);

        Ok((scheduler, log_rx))
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
