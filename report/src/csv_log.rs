//! Per-request CSV log
//!
//! One row per recorded outcome: `timestamp,status_or_error,latency_ms,bytes`.
//! Rows arrive over the scheduler's request log channel and are written on a
//! blocking thread so file I/O stays off the async workers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::SecondsFormat;
use csv::Writer;
use loadgen_core::RequestOutcome;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ReportError, ReportResult};

const HEADER: [&str; 4] = ["timestamp", "status_or_error", "latency_ms", "bytes"];

/// Buffered CSV writer for request outcomes
pub struct RequestLogWriter<W: Write> {
    writer: Writer<W>,
    rows: u64,
}

impl RequestLogWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the header
    pub fn create(path: &Path) -> ReportResult<Self> {
        let file = File::create(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> RequestLogWriter<W> {
    /// Wrap any writer and write the header
    pub fn new(inner: W) -> ReportResult<Self> {
        let mut writer = Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Append one outcome
    pub fn write(&mut self, outcome: &RequestOutcome) -> ReportResult<()> {
        self.writer.write_record([
            outcome
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            outcome.status_or_error(),
            format!("{:.3}", outcome.latency_ms()),
            outcome.bytes_received.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush buffered rows and return the underlying writer
    pub fn finish(mut self) -> ReportResult<W> {
        self.writer.flush().map_err(|e| ReportError::Csv(e.into()))?;
        self.writer
            .into_inner()
            .map_err(|e| ReportError::Writer(e.to_string()))
    }
}

/// Drain `rx` into an already opened log until every sender is dropped
///
/// Resolves to the number of rows written. Opening the file first with
/// [`RequestLogWriter::create`] surfaces a bad path before the run starts.
pub fn spawn_request_log<W>(
    mut log: RequestLogWriter<W>,
    mut rx: mpsc::Receiver<RequestOutcome>,
) -> JoinHandle<ReportResult<u64>>
where
    W: Write + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        while let Some(outcome) = rx.blocking_recv() {
            log.write(&outcome)?;
        }
        let rows = log.rows();
        log.finish()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use loadgen_core::{ErrorKind, SuccessPolicy};
    use std::time::Duration;

    fn rows(text: &str) -> Vec<Vec<String>> {
        csv::Reader::from_reader(text.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_writer_header_and_rows() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut log = RequestLogWriter::new(Vec::new()).unwrap();
        log.write(&RequestOutcome::from_status(
            ts,
            Duration::from_micros(12_345),
            200,
            512,
            SuccessPolicy::Strict2xx,
        ))
        .unwrap();
        log.write(&RequestOutcome::from_error(
            ts,
            Duration::from_secs(30),
            ErrorKind::Timeout,
        ))
        .unwrap();
        assert_eq!(log.rows(), 2);

        let text = String::from_utf8(log.finish().unwrap()).unwrap();
        assert!(text.starts_with("timestamp,status_or_error,latency_ms,bytes\n"));

        let rows = rows(&text);
        assert_eq!(
            rows[0],
            vec!["2024-05-01T12:00:00.000000Z", "200", "12.345", "512"]
        );
        assert_eq!(rows[1][1], "timeout");
        assert_eq!(rows[1][3], "0");
    }

    #[tokio::test]
    async fn test_spawned_log_drains_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.csv");
        let (tx, rx) = mpsc::channel(4);

        let handle = spawn_request_log(RequestLogWriter::create(&path).unwrap(), rx);
        for status in [200u16, 404, 500] {
            tx.send(RequestOutcome::from_status(
                Utc::now(),
                Duration::from_millis(1),
                status,
                1,
                SuccessPolicy::Strict2xx,
            ))
            .await
            .unwrap();
        }
        drop(tx);

        assert_eq!(handle.await.unwrap().unwrap(), 3);

        let text = std::fs::read_to_string(&path).unwrap();
        let statuses: Vec<_> = rows(&text).into_iter().map(|r| r[1].clone()).collect();
        assert_eq!(statuses, vec!["200", "404", "500"]);
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("requests.csv");

        let result = RequestLogWriter::create(&path);
        assert!(matches!(result, Err(ReportError::Io { .. })));
        assert!(!path.exists());
    }
}
