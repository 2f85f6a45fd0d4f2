//! Builder pattern for Worker construction

use crate::error::{BenchError, BenchResult};
use crate::metrics::MetricsCollector;
use crate::response::RequestOutcome;
use crate::traits::{RequestExecutor, Sampler};

use super::executor::Worker;
use super::rate_limiter::RequestRateLimiter;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .executor(executor)
///     .sampler(sampler)
///     .metrics(metrics.clone())
///     .semaphore(semaphore)
///     .rate_limiter(limiter)
///     .request_counter(counter, 100)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    executor: Option<Arc<dyn RequestExecutor>>,
    sampler: Option<Arc<dyn Sampler>>,
    metrics: Option<MetricsCollector>,
    outcome_tx: Option<mpsc::Sender<RequestOutcome>>,
    semaphore: Option<Arc<Semaphore>>,
    rate_limiter: Option<Arc<RequestRateLimiter>>,
    request_counter: Option<(Arc<AtomicUsize>, usize)>,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            executor: None,
            sampler: None,
            metrics: None,
            outcome_tx: None,
            semaphore: None,
            rate_limiter: None,
            request_counter: None,
        }
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

    /// Set the shared metrics collector
    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attach a per-request log channel
    pub fn outcome_tx(mut self, tx: Option<mpsc::Sender<RequestOutcome>>) -> Self {
        self.outcome_tx = tx;
        self
    }

    /// Set the in-flight semaphore
    pub fn semaphore(mut self, semaphore: Arc<Semaphore>) -> Self {
        self.semaphore = Some(semaphore);
        self
    }

    /// Share a rate limiter; unlimited if never set
    pub fn rate_limiter(mut self, limiter: Arc<RequestRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Set a shared request counter enforcing a total budget
    pub fn request_counter(mut self, counter: Arc<AtomicUsize>, total: usize) -> Self {
        self.request_counter = Some((counter, total));
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> BenchResult<Worker> {
        let executor = self
            .executor
            .ok_or_else(|| BenchError::missing_config("executor"))?;
        let sampler = self
            .sampler
            .ok_or_else(|| BenchError::missing_config("sampler"))?;
        let metrics = self
            .metrics
            .ok_or_else(|| BenchError::missing_config("metrics"))?;
        let semaphore = self
            .semaphore
            .ok_or_else(|| BenchError::missing_config("semaphore"))?;
        let rate_limiter = self.rate_limiter.unwrap_or_default();

        let mut worker = Worker::new(self.id, executor, sampler, metrics, semaphore, rate_limiter);

        if let Some(tx) = self.outcome_tx {
            worker = worker.with_outcome_log(tx);
        }
        if let Some((counter, total)) = self.request_counter {
            worker = worker.with_request_counter(counter, total);
        }

        Ok(worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_missing_executor() {
        let result = WorkerBuilder::new(0)
            .metrics(MetricsCollector::new())
            .semaphore(Arc::new(Semaphore::new(1)))
            .build();

        let err = result.unwrap_err();
        assert!(err.message.contains("executor"));
    }

    #[test]
    fn test_builder_missing_everything() {
        let err = WorkerBuilder::new(3).build().unwrap_err();
        assert_eq!(err.kind, crate::error::BenchErrorKind::MissingConfig);
    }
}
