//! loadgen-core: scheduling, pacing and metrics for HTTP load tests
//!
//! This crate provides the engine shared by every loadgen component:
//!
//! - Request shapes and weighted scenarios
//! - Core traits (RequestExecutor, Sampler)
//! - Token-bucket rate limiting and the worker loop
//! - The scheduler (open-loop and closed-loop dispatch)
//! - Metrics collection and percentiles
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod request;
pub mod response;
pub mod scheduler;
pub mod traits;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use channel::{outcome_channel, ChannelConfig};
pub use config::{ConfigError, DispatchMode, LoadTestConfig};
pub use error::*;
pub use metrics::*;
pub use request::*;
pub use response::*;
pub use scheduler::{Scheduler, SchedulerBuilder};
pub use traits::*;
pub use worker::{RequestRateLimiter, TokenBucket, Worker, WorkerBuilder};
