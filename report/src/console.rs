//! Human-readable run summary

use std::fmt::Write;

use crate::summary::Summary;

/// Render the summary block printed at the end of a run
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_summary(&mut out, summary);
    out
}

/// Print [`render_summary`] to stdout
pub fn print_summary(summary: &Summary) {
    print!("{}", render_summary(summary));
}

fn write_summary(out: &mut String, s: &Summary) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "=== Load test summary ===")?;
    writeln!(out, "target: {}", s.target)?;
    writeln!(out, "start_time: {}", s.start_time.to_rfc3339())?;
    writeln!(out, "end_time: {}", s.end_time.to_rfc3339())?;
    writeln!(out, "duration_sec: {:.3}", s.duration_sec)?;
    writeln!(out, "total_requests: {}", s.total_requests)?;
    writeln!(out, "successful: {}", s.successful)?;
    writeln!(out, "failed: {}", s.failed)?;
    writeln!(out, "throughput_rps: {:.2}", s.throughput_rps)?;
    writeln!(out, "bytes_received: {}", s.bytes_received)?;
    writeln!(out, "avg_bytes_per_response: {:.1}", s.avg_bytes_per_response)?;

    writeln!(out, "latency_ms:")?;
    let l = &s.latency_ms;
    for (name, value) in [
        ("mean", l.mean),
        ("p50", l.p50),
        ("p75", l.p75),
        ("p90", l.p90),
        ("p95", l.p95),
        ("p99", l.p99),
        ("max", l.max),
    ] {
        writeln!(out, "  {name}: {value:.3}")?;
    }

    if !s.status_counts.is_empty() {
        writeln!(out, "status_counts:")?;
        for (status, count) in &s.status_counts {
            writeln!(out, "  {status}: {count}")?;
        }
    }
    if !s.error_counts.is_empty() {
        writeln!(out, "error_counts:")?;
        for (kind, count) in &s.error_counts {
            writeln!(out, "  {kind}: {count}")?;
        }
    }
    Ok(())
}
