//! Worker module for executing load test requests
//!
//! A Worker runs the loop **pace -> sample -> execute -> record -> repeat**.
//! Each Worker is a tokio task that:
//!
//! 1. Checks for shutdown and claims a dispatch slot from the shared counter
//! 2. Waits on the shared rate limiter (open-loop only)
//! 3. Samples the next request from a Sampler
//! 4. Executes it via a RequestExecutor
//! 5. Records the outcome with the MetricsCollector and the optional request log
//! 6. Repeats until the budget is spent or shutdown is signalled
//!
//! # Example
//!
//! ```ignore
//! use loadgen_core::worker::WorkerBuilder;
//!
//! let worker = WorkerBuilder::new(0)
//!     .executor(executor)
//!     .sampler(sampler)
//!     .metrics(metrics.clone())
//!     .semaphore(semaphore)
//!     .request_counter(counter, 100)
//!     .build()?;
//!
//! worker.run(shutdown_rx).await?;
//! println!("Recorded: {}", metrics.total_requests());
//! ```

mod builder;
mod executor;
mod rate_limiter;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use rate_limiter::{RequestRateLimiter, TokenBucket};
