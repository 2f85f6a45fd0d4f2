//! Once-per-second progress output while a run is active

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use loadgen_core::MetricsCollector;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

/// Progress message: running total and requests completed since the last tick
pub fn progress_line(current: u64, last: u64) -> String {
    format!("total={current} +{}", current.saturating_sub(last))
}

/// Polls a [`MetricsCollector`] and redraws a progress bar every second
///
/// Count-limited runs get a bar with an ETA; duration-only runs a spinner.
pub struct ProgressReporter {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl ProgressReporter {
    /// Start ticking on the current runtime
    pub fn start(metrics: MetricsCollector, request_limit: Option<usize>) -> Self {
        let bar = match request_limit {
            Some(limit) => {
                let bar = ProgressBar::new(limit as u64);
                bar.set_style(
                    style(BAR_TEMPLATE, ProgressStyle::default_bar()).progress_chars("#>-"),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(style(SPINNER_TEMPLATE, ProgressStyle::default_spinner()));
                bar
            }
        };

        let task = tokio::spawn({
            let bar = bar.clone();
            async move {
                let mut ticker = interval(TICK);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut last = 0;
                loop {
                    ticker.tick().await;
                    let current = metrics.total_requests();
                    bar.set_position(current);
                    bar.set_message(progress_line(current, last));
                    last = current;
                }
            }
        });

        Self { bar, task }
    }

    /// Stop ticking and leave the final line on screen
    pub fn finish(self, total: u64) {
        self.task.abort();
        self.bar.set_position(total);
        self.bar.finish_with_message(format!("total={total} done"));
    }
}

fn style(template: &str, fallback: ProgressStyle) -> ProgressStyle {
    match ProgressStyle::with_template(template) {
        Ok(style) => style,
        Err(err) => {
            tracing::debug!(error = %err, "Invalid progress template");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loadgen_core::{RequestOutcome, SuccessPolicy};

    #[test]
    fn test_progress_line() {
        assert_eq!(progress_line(0, 0), "total=0 +0");
        assert_eq!(progress_line(150, 100), "total=150 +50");
        assert_eq!(progress_line(5, 10), "total=5 +0");
    }

    #[test]
    fn test_templates_parse() {
        assert!(ProgressStyle::with_template(BAR_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(SPINNER_TEMPLATE).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_tracks_collector() {
        let metrics = MetricsCollector::new();
        let reporter = ProgressReporter::start(metrics.clone(), Some(10));
        reporter.bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());

        for _ in 0..3 {
            metrics.record(&RequestOutcome::from_status(
                Utc::now(),
                Duration::from_millis(1),
                200,
                0,
                SuccessPolicy::Strict2xx,
            ));
        }
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(reporter.bar.position(), 3);
        assert_eq!(reporter.bar.length(), Some(10));

        reporter.finish(10);
    }
}
