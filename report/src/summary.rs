//! JSON run summary

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use loadgen_core::{ErrorKind, LatencyPercentiles, MetricsSnapshot};
use serde::{Deserialize, Serialize};

use crate::{ReportError, ReportResult};

/// Aggregate results of one run, as written to `--json-out`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Target URL (the first scenario entry for multi-endpoint runs)
    pub target: String,
    /// Run start, RFC 3339
    pub start_time: DateTime<Utc>,
    /// Run end, RFC 3339
    pub end_time: DateTime<Utc>,
    /// Recorded requests
    pub total_requests: u64,
    /// Requests accepted by the success policy
    pub successful: u64,
    /// All other requests
    pub failed: u64,
    /// Requests per second over the whole run
    pub throughput_rps: f64,
    /// Latency statistics in milliseconds; zeros when nothing was recorded
    pub latency_ms: LatencyPercentiles,
    /// Status code to count
    pub status_counts: BTreeMap<u16, u64>,
    /// Error classification to count
    pub error_counts: BTreeMap<ErrorKind, u64>,
    /// Total response body bytes
    pub bytes_received: u64,
    /// Mean body size per request
    pub avg_bytes_per_response: f64,
    /// Elapsed seconds
    pub duration_sec: f64,
}

impl Summary {
    /// Summarize a final snapshot
    pub fn from_snapshot(target: impl Into<String>, snapshot: &MetricsSnapshot) -> Self {
        Self {
            target: target.into(),
            start_time: snapshot.start_time,
            end_time: snapshot.end_time,
            total_requests: snapshot.total_requests,
            successful: snapshot.successful,
            failed: snapshot.failed,
            throughput_rps: snapshot.throughput_rps(),
            latency_ms: snapshot.latency(),
            status_counts: snapshot.status_counts.clone(),
            error_counts: snapshot.error_counts.clone(),
            bytes_received: snapshot.bytes_received,
            avg_bytes_per_response: snapshot.avg_bytes_per_response(),
            duration_sec: snapshot.duration_secs(),
        }
    }
}

/// Write the summary as pretty-printed JSON
pub fn write_json(summary: &Summary, path: &Path) -> ReportResult<()> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    tracing::info!(path = %path.display(), "Saved JSON summary");
    Ok(())
}
