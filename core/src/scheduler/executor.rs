//! Scheduler execution logic

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::config::{DispatchMode, LoadTestConfig};
use crate::error::{BenchError, BenchResult};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::response::RequestOutcome;
use crate::traits::{RequestExecutor, Sampler};
use crate::worker::{RequestRateLimiter, WorkerBuilder};

/// Scheduler manages one load test run
///
/// Spawns one worker per unit of concurrency, fans a single shutdown signal
/// out to all of them (duration expiry, external stop, programmatic stop),
/// waits for every worker to drain and returns the final metrics.
pub struct Scheduler {
    /// Validated run configuration
    pub(crate) config: LoadTestConfig,

    /// Request executor (shared across workers)
    pub(crate) executor: Arc<dyn RequestExecutor>,

    /// Sampler (shared across workers)
    pub(crate) sampler: Arc<dyn Sampler>,

    /// Run-wide metrics
    pub(crate) metrics: MetricsCollector,

    /// Request log sender (cloned for each worker)
    pub(crate) outcome_tx: Option<mpsc::Sender<RequestOutcome>>,

    /// In-flight limiter
    pub(crate) semaphore: Arc<Semaphore>,

    /// Shared token bucket; disabled in closed-loop mode
    pub(crate) rate_limiter: Arc<RequestRateLimiter>,

    /// Shutdown signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,

    /// Shared dispatch counter for the request budget
    pub(crate) request_counter: Arc<AtomicUsize>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// Use `SchedulerBuilder` for validated construction.
    pub fn new(
        config: LoadTestConfig,
        executor: Arc<dyn RequestExecutor>,
        sampler: Arc<dyn Sampler>,
        outcome_tx: Option<mpsc::Sender<RequestOutcome>>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        let rate_limiter = Arc::new(match config.dispatch_mode() {
            DispatchMode::OpenLoop { rate, burst } => RequestRateLimiter::new(Some(rate), Some(burst)),
            DispatchMode::ClosedLoop => RequestRateLimiter::unlimited(),
        });
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            executor,
            sampler,
            metrics: MetricsCollector::new(),
            outcome_tx,
            semaphore,
            rate_limiter,
            shutdown_tx,
            request_counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle that stops dispatching when a `()` is sent on it
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Trigger shutdown of all workers
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Live view of the run's metrics (for progress reporting)
    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    /// Get the load test configuration
    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Run the load test to completion
    ///
    /// Returns once every worker has stopped and every in-flight request has
    /// been recorded. Dropping the scheduler's log sender here lets a request
    /// log writer observe end-of-stream.
    pub async fn run(self) -> BenchResult<MetricsSnapshot> {
        let concurrency = self.config.concurrency;
        let stop = self.config.stop_condition;

        tracing::info!(
            url = self.config.scenario.primary_target(),
            concurrency,
            stop_condition = ?stop,
            mode = ?self.config.dispatch_mode(),
            "Starting load test"
        );

        let receivers: Vec<_> = (0..concurrency)
            .map(|_| self.shutdown_tx.subscribe())
            .collect();

        self.metrics.start();
        let timer = stop.time_limit().map(|limit| self.spawn_timer(limit));

        let mut handles = Vec::with_capacity(concurrency);
        for (worker_id, shutdown_rx) in receivers.into_iter().enumerate() {
            let mut builder = WorkerBuilder::new(worker_id)
                .executor(Arc::clone(&self.executor))
                .sampler(Arc::clone(&self.sampler))
                .metrics(self.metrics.clone())
                .outcome_tx(self.outcome_tx.clone())
                .semaphore(Arc::clone(&self.semaphore))
                .rate_limiter(Arc::clone(&self.rate_limiter));

            if let Some(total) = stop.request_limit() {
                builder = builder.request_counter(Arc::clone(&self.request_counter), total);
            }

            let worker = builder.build()?;
            handles.push(tokio::spawn(async move { worker.run(shutdown_rx).await }));
        }

        // Workers hold their own clones
        drop(self.outcome_tx);

        let mut completed_workers = 0;
        let mut worker_failures = 0;
        for (idx, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(())) => {
                    tracing::debug!(worker_id = idx, "Worker completed");
                    completed_workers += 1;
                }
                Ok(Err(e)) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Worker returned error");
                }
                Err(e) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Worker task panicked");
                }
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }
        self.metrics.finish();

        if completed_workers == 0 && worker_failures > 0 {
            return Err(BenchError::orchestration(format!(
                "All {} workers failed to complete",
                worker_failures
            )));
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            elapsed_secs = snapshot.duration_secs(),
            total_requests = snapshot.total_requests,
            successful = snapshot.successful,
            failed = snapshot.failed,
            workers = completed_workers,
            rps = snapshot.throughput_rps(),
            "Load test completed"
        );

        Ok(snapshot)
    }

    /// Run with Ctrl+C and SIGTERM handling
    ///
    /// Either signal stops dispatching; in-flight requests still complete.
    pub async fn run_with_signal_handling(self) -> BenchResult<MetricsSnapshot> {
        let shutdown_tx = self.shutdown_tx.clone();

        let signal_handle = tokio::spawn(async move {
            wait_for_stop_signal().await;
            let _ = shutdown_tx.send(());
        });

        let result = self.run().await;

        signal_handle.abort();

        result
    }

    /// Send shutdown once the run's time budget is spent
    fn spawn_timer(&self, limit: std::time::Duration) -> JoinHandle<()> {
        let shutdown_tx = self.shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            tracing::info!(
                duration_secs = limit.as_secs_f64(),
                "Duration reached, stopping dispatch"
            );
            let _ = shutdown_tx.send(());
        })
    }
}

#[cfg(unix)]
async fn wait_for_stop_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGTERM");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_stop_signal() {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown..."),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("executor", &self.executor.name())
            .field("sampler", &self.sampler.name())
            .field("rate_limiter", &self.rate_limiter)
            .finish()
    }
}
