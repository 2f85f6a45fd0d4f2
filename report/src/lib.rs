//! Output for load test results
//!
//! This crate provides:
//!
//! - The JSON run summary
//! - The per-request CSV log writer
//! - A human-readable console summary
//! - Live progress reporting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod console;
pub mod csv_log;
pub mod progress;
pub mod summary;

pub use console::{print_summary, render_summary};
pub use csv_log::{spawn_request_log, RequestLogWriter};
pub use progress::ProgressReporter;
pub use summary::{write_json, Summary};

use std::path::PathBuf;

/// Errors raised while writing reports
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A report file could not be created or written
    #[error("failed to write {path}")]
    Io {
        /// Destination file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A CSV row could not be written
    #[error("failed to write CSV record")]
    Csv(#[from] csv::Error),

    /// The summary could not be serialized
    #[error("failed to serialize summary")]
    Json(#[from] serde_json::Error),

    /// The log writer task did not complete
    #[error("request log writer failed: {0}")]
    Writer(String),
}

/// Result type alias
pub type ReportResult<T> = Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_io_error_message_leaves_cause_to_source() {
        let err = ReportError::Io {
            path: PathBuf::from("/tmp/out.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        };

        assert_eq!(err.to_string(), "failed to write /tmp/out.csv");
        assert_eq!(err.source().unwrap().to_string(), "no such directory");
    }
}
