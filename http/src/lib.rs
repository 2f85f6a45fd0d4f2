//! HTTP request execution for loadgen
//!
//! [`HttpExecutor`] implements the core `RequestExecutor` trait on top of
//! reqwest with rustls. Transport failures never escape as errors; they are
//! classified into the outcome.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod classify;
mod executor;
mod pool;

pub use classify::classify_error;
pub use executor::HttpExecutor;
pub use pool::{HttpClientPool, HttpConfig, MAX_REDIRECTS};

/// Errors raised while setting up the HTTP layer
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The TLS backend or client configuration was rejected
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
