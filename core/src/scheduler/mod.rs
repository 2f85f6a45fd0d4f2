//! Scheduler for load test lifecycle management
//!
//! The Scheduler coordinates one run:
//! - Spawning one worker task per unit of concurrency
//! - Choosing open-loop (shared token bucket) or closed-loop dispatch
//! - Stopping on duration, request budget, or an external signal
//! - Draining in-flight requests and returning the final metrics
//!
//! # Example
//!
//! ```ignore
//! use loadgen_core::{LoadTestConfig, SchedulerBuilder, StopCondition};
//!
//! let (scheduler, _log_rx) = SchedulerBuilder::new()
//!     .config(config.with_stop_condition(StopCondition::RequestCount(1000)))
//!     .executor(executor)
//!     .sampler(sampler)
//!     .build()?;
//!
//! let snapshot = scheduler.run_with_signal_handling().await?;
//! ```

mod builder;
mod executor;

pub use builder::SchedulerBuilder;
pub use executor::Scheduler;

#[cfg(test)]
mod tests;
