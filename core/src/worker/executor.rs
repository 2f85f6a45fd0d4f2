//! Worker execution loop

use crate::error::{BenchError, BenchResult};
use crate::metrics::MetricsCollector;
use crate::response::RequestOutcome;
use crate::traits::{RequestExecutor, Sampler};

use super::rate_limiter::RequestRateLimiter;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::time::Instant;

/// Worker executes requests in a loop: pace -> sample -> execute -> record -> repeat
///
/// Workers are tokio tasks managed by the Scheduler. They share the sampler,
/// executor, rate limiter and metrics collector via `Arc`.
pub struct Worker {
    /// Unique worker identifier
    id: usize,

    /// Request executor (shared across workers via Arc)
    executor: Arc<dyn RequestExecutor>,

    /// Sampler (shared across workers via Arc)
    sampler: Arc<dyn Sampler>,

    /// Run-wide metrics
    metrics: MetricsCollector,

    /// Per-request log channel, if one is attached
    outcome_tx: Option<mpsc::Sender<RequestOutcome>>,

    /// In-flight limiter (shared semaphore)
    semaphore: Arc<Semaphore>,

    /// Rate limiter shared by all workers; disabled in closed-loop mode
    rate_limiter: Arc<RequestRateLimiter>,

    /// Shared dispatch counter and the request budget it enforces
    request_counter: Option<(Arc<AtomicUsize>, usize)>,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        executor: Arc<dyn RequestExecutor>,
        sampler: Arc<dyn Sampler>,
        metrics: MetricsCollector,
        semaphore: Arc<Semaphore>,
        rate_limiter: Arc<RequestRateLimiter>,
    ) -> Self {
        Self {
            id,
            executor,
            sampler,
            metrics,
            outcome_tx: None,
            semaphore,
            rate_limiter,
            request_counter: None,
        }
    }

    /// Forward every outcome to a per-request log
    pub fn with_outcome_log(mut self, tx: mpsc::Sender<RequestOutcome>) -> Self {
        self.outcome_tx = Some(tx);
        self
    }

    /// Set a shared request counter
    ///
    /// Workers claim dispatch slots by atomic increment, so exactly `total`
    /// requests are dispatched across the pool regardless of how the work
    /// falls between workers.
    pub fn with_request_counter(mut self, counter: Arc<AtomicUsize>, total: usize) -> Self {
        self.request_counter = Some((counter, total));
        self
    }

    /// Run the worker loop
    ///
    /// Returns when the request budget is exhausted or shutdown is signalled.
    /// A request that has already been issued is always awaited and recorded;
    /// only the rate limiter wait is abandoned on shutdown.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> BenchResult<()> {
        let started = Instant::now();
        let mut dispatched = 0u64;

        tracing::debug!(worker_id = self.id, "Worker started");

        loop {
            if shutdown_requested(&mut shutdown) {
                tracing::debug!(worker_id = self.id, "Worker received shutdown signal");
                break;
            }

            if !self.try_claim_request() {
                tracing::debug!(
                    worker_id = self.id,
                    "No more requests to claim, worker stopping"
                );
                break;
            }

            if self.rate_limiter.is_enabled() {
                tokio::select! {
                    biased;

                    _ = shutdown.recv() => {
                        tracing::debug!(worker_id = self.id, "Shutdown while waiting for rate limiter");
                        break;
                    }

                    _ = self.rate_limiter.acquire() => {}
                }
            }

            let outcome = match self.execute_one().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(worker_id = self.id, error = %e, "Worker cannot continue");
                    return Err(e);
                }
            };

            dispatched += 1;
            self.metrics.record(&outcome);

            if let Some(tx) = &self.outcome_tx {
                if tx.send(outcome).await.is_err() {
                    tracing::warn!(worker_id = self.id, "Request log closed, no longer logging");
                    self.outcome_tx = None;
                }
            }
        }

        tracing::debug!(
            worker_id = self.id,
            dispatched,
            elapsed_ms = started.elapsed().as_millis(),
            "Worker finished"
        );

        Ok(())
    }

    /// Issue a single request and wait for its outcome
    async fn execute_one(&self) -> BenchResult<RequestOutcome> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| BenchError::shutdown())?;

        let spec = self
            .sampler
            .sample()
            .map_err(|e| BenchError::sampler(e.to_string()))?;

        let outcome = self.executor.execute(&spec).await;
        if let Some(kind) = outcome.error {
            tracing::debug!(
                worker_id = self.id,
                url = %spec.url,
                error = %kind,
                status = ?outcome.status,
                "Request failed"
            );
        }

        Ok(outcome)
    }

    /// Try to claim a request slot from the shared counter
    ///
    /// Always returns `true` if no request budget is set.
    fn try_claim_request(&self) -> bool {
        match &self.request_counter {
            Some((counter, total)) => {
                let claimed = counter.fetch_add(1, Ordering::SeqCst);
                if claimed >= *total {
                    // Over-claimed near the limit; keep the counter exact
                    counter.fetch_sub(1, Ordering::SeqCst);
                    return false;
                }
                true
            }
            None => true,
        }
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Non-blocking check for the shutdown broadcast
///
/// A dropped sender counts as shutdown.
fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("executor", &self.executor.name())
            .field("sampler", &self.sampler.name())
            .field("rate_limiter", &self.rate_limiter)
            .field("request_budget", &self.request_counter.as_ref().map(|(_, n)| *n))
            .finish()
    }
}
