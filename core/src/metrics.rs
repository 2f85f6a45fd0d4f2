//! Metrics aggregation and percentile calculation
//!
//! [`MetricsCollector`] is the single point of truth for a run. Every worker
//! holds a clone of the same collector; all counters sit behind one mutex so
//! `total_requests == successful + failed` holds at every observable instant.

use crate::error::ErrorKind;
use crate::response::RequestOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Shared, concurrency-safe accumulator of request outcomes
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

#[derive(Debug)]
struct MetricsState {
    started_at: Instant,
    start_time: DateTime<Utc>,
    finished_at: Option<(Instant, DateTime<Utc>)>,
    total_requests: u64,
    successful: u64,
    failed: u64,
    status_counts: BTreeMap<u16, u64>,
    error_counts: BTreeMap<ErrorKind, u64>,
    latencies_ms: Vec<f64>,
    bytes_received: u64,
}

impl MetricsCollector {
    /// Create an empty collector; the run clock starts now
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                started_at: Instant::now(),
                start_time: Utc::now(),
                finished_at: None,
                total_requests: 0,
                successful: 0,
                failed: 0,
                status_counts: BTreeMap::new(),
                error_counts: BTreeMap::new(),
                latencies_ms: Vec::new(),
                bytes_received: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restart the run clock (called by the scheduler right before dispatch)
    pub fn start(&self) {
        let mut state = self.lock();
        state.started_at = Instant::now();
        state.start_time = Utc::now();
        state.finished_at = None;
    }

    /// Stamp the end of the run
    pub fn finish(&self) {
        let mut state = self.lock();
        if state.finished_at.is_none() {
            state.finished_at = Some((Instant::now(), Utc::now()));
        }
    }

    /// Record one completed request
    pub fn record(&self, outcome: &RequestOutcome) {
        let mut state = self.lock();
        state.total_requests += 1;
        if outcome.success {
            state.successful += 1;
        } else {
            state.failed += 1;
        }
        if let Some(status) = outcome.status {
            *state.status_counts.entry(status).or_insert(0) += 1;
        }
        if let Some(kind) = outcome.error {
            *state.error_counts.entry(kind).or_insert(0) += 1;
        }
        state.latencies_ms.push(outcome.latency_ms());
        state.bytes_received += outcome.bytes_received;
    }

    /// Number of outcomes recorded so far
    pub fn total_requests(&self) -> u64 {
        self.lock().total_requests
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        let (end_instant, end_time) = state
            .finished_at
            .unwrap_or_else(|| (Instant::now(), Utc::now()));

        MetricsSnapshot {
            start_time: state.start_time,
            end_time,
            elapsed: end_instant.saturating_duration_since(state.started_at),
            total_requests: state.total_requests,
            successful: state.successful,
            failed: state.failed,
            status_counts: state.status_counts.clone(),
            error_counts: state.error_counts.clone(),
            latencies_ms: state.latencies_ms.clone(),
            bytes_received: state.bytes_received,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a run's metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When the run started
    pub start_time: DateTime<Utc>,
    /// When the run finished (or when the snapshot was taken, mid-run)
    pub end_time: DateTime<Utc>,
    /// Monotonic time between start and end
    pub elapsed: Duration,
    /// Recorded outcomes
    pub total_requests: u64,
    /// Outcomes accepted by the success policy
    pub successful: u64,
    /// Everything else, including errors without a status
    pub failed: u64,
    /// Status code to count, for outcomes that carried a status
    pub status_counts: BTreeMap<u16, u64>,
    /// Error classification to count
    pub error_counts: BTreeMap<ErrorKind, u64>,
    /// Every observed latency in milliseconds, in record order
    pub latencies_ms: Vec<f64>,
    /// Total response body bytes
    pub bytes_received: u64,
}

impl MetricsSnapshot {
    /// Elapsed seconds, floored to avoid dividing by zero
    pub fn duration_secs(&self) -> f64 {
        self.elapsed.as_secs_f64().max(1e-9)
    }

    /// Requests completed per second
    pub fn throughput_rps(&self) -> f64 {
        self.total_requests as f64 / self.duration_secs()
    }

    /// Mean body size per recorded request
    pub fn avg_bytes_per_response(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.bytes_received as f64 / self.total_requests as f64
        }
    }

    /// Fraction of requests that succeeded (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful as f64 / self.total_requests as f64
        }
    }

    /// Latency statistics; all zero when nothing was recorded
    pub fn latency(&self) -> LatencyPercentiles {
        LatencyPercentiles::from_values(&self.latencies_ms)
    }
}

/// Latency percentiles (all values in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LatencyPercentiles {
    /// Mean value
    pub mean: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 90th percentile
    pub p90: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// Maximum value
    pub max: f64,
}

impl LatencyPercentiles {
    /// Calculate percentiles from an unsorted slice of values
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let at = |p: f64| percentile(&sorted, p).unwrap_or_default();
        Self {
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p50: at(50.0),
            p75: at(75.0),
            p90: at(90.0),
            p95: at(95.0),
            p99: at(99.0),
            max: at(100.0),
        }
    }
}

/// Nearest-rank percentile over ascending `sorted` values
///
/// Selects index `ceil(p/100 * n) - 1`, clamped to `[0, n-1]`.
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let rank = (p / 100.0 * n as f64).ceil() as i64 - 1;
    let idx = rank.clamp(0, n as i64 - 1) as usize;
    Some(sorted[idx])
}
