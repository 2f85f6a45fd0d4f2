//! Mock executor and sampler shared by the worker and scheduler tests

use crate::error::ErrorKind;
use crate::request::RequestSpec;
use crate::response::{RequestOutcome, SuccessPolicy};
use crate::traits::{RequestExecutor, Sampler, SamplerError};

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub(crate) struct MockSampler {
    spec: Arc<RequestSpec>,
    pub(crate) calls: AtomicUsize,
}

impl MockSampler {
    pub(crate) fn new() -> Self {
        Self {
            spec: Arc::new(RequestSpec::get("http://127.0.0.1:9/health")),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Sampler for MockSampler {
    fn name(&self) -> &str {
        "mock"
    }

    fn sample(&self) -> Result<Arc<RequestSpec>, SamplerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.spec))
    }
}

/// Sampler that always fails
pub(crate) struct EmptySampler;

impl Sampler for EmptySampler {
    fn name(&self) -> &str {
        "empty"
    }

    fn sample(&self) -> Result<Arc<RequestSpec>, SamplerError> {
        Err(SamplerError::Empty)
    }
}

enum Reply {
    Status(u16),
    Error(ErrorKind),
}

pub(crate) struct MockExecutor {
    reply: Reply,
    delay: Duration,
    bytes: u64,
    pub(crate) started: AtomicUsize,
    pub(crate) completed: AtomicUsize,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl MockExecutor {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: Duration::from_millis(1),
            bytes: 0,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Replies with the given status after a short delay
    pub(crate) fn status(status: u16) -> Self {
        Self::with_reply(Reply::Status(status))
    }

    /// Fails every request with the given error kind
    pub(crate) fn error(kind: ErrorKind) -> Self {
        Self::with_reply(Reply::Error(kind))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn with_bytes(mut self, bytes: u64) -> Self {
        self.bytes = bytes;
        self
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, _spec: &RequestSpec) -> RequestOutcome {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let timestamp = Utc::now();
        let start = Instant::now();
        tokio::time::sleep(self.delay).await;
        let latency = start.elapsed();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        match self.reply {
            Reply::Status(status) => RequestOutcome::from_status(
                timestamp,
                latency,
                status,
                self.bytes,
                SuccessPolicy::Strict2xx,
            ),
            Reply::Error(kind) => RequestOutcome::from_error(timestamp, latency, kind),
        }
    }
}
