//! Tests for the Scheduler module

use super::builder::SchedulerBuilder;
use crate::channel::ChannelConfig;
use crate::config::LoadTestConfig;
use crate::error::{BenchErrorKind, ErrorKind};
use crate::request::{RequestSpec, Scenario};
use crate::test_support::{EmptySampler, MockExecutor, MockSampler};
use crate::traits::StopCondition;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Helper functions
// ============================================================================

fn config() -> LoadTestConfig {
    let scenario = Scenario::single(RequestSpec::get("http://127.0.0.1:9/health")).unwrap();
    LoadTestConfig::new(scenario)
}

// ============================================================================
// Builder Tests
// ============================================================================

#[test]
fn test_builder_missing_config() {
    let err = SchedulerBuilder::new()
        .executor(Arc::new(MockExecutor::status(200)))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap_err();
    assert_eq!(err.kind, BenchErrorKind::MissingConfig);
    assert!(err.message.contains("config"));
}

#[test]
fn test_builder_missing_executor() {
    let err = SchedulerBuilder::new()
        .config(config())
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap_err();
    assert!(err.message.contains("executor"));
}

#[test]
fn test_builder_missing_sampler() {
    let err = SchedulerBuilder::new()
        .config(config())
        .executor(Arc::new(MockExecutor::status(200)))
        .build()
        .unwrap_err();
    assert!(err.message.contains("sampler"));
}

#[test]
fn test_builder_invalid_config() {
    let err = SchedulerBuilder::new()
        .config(config().with_concurrency(0))
        .executor(Arc::new(MockExecutor::status(200)))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap_err();
    assert_eq!(err.kind, BenchErrorKind::Config);
}

#[test]
fn test_builder_request_log_receiver() {
    let (_, rx) = SchedulerBuilder::new()
        .config(config())
        .executor(Arc::new(MockExecutor::status(200)))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();
    assert!(rx.is_none());

    let (_, rx) = SchedulerBuilder::new()
        .config(config())
        .executor(Arc::new(MockExecutor::status(200)))
        .sampler(Arc::new(MockSampler::new()))
        .request_log(ChannelConfig::default())
        .build()
        .unwrap();
    assert!(rx.is_some());
}

// ============================================================================
// Run Tests
// ============================================================================

#[tokio::test]
async fn test_closed_loop_exact_request_count() {
    let executor = Arc::new(MockExecutor::status(200).with_bytes(4));
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(4)
                .with_stop_condition(StopCondition::RequestCount(100)),
        )
        .executor(executor.clone())
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let snapshot = scheduler.run().await.unwrap();

    assert_eq!(snapshot.total_requests, 100);
    assert_eq!(snapshot.successful, 100);
    assert_eq!(snapshot.failed, 0);
    assert_eq!(snapshot.latencies_ms.len(), 100);
    assert_eq!(snapshot.bytes_received, 400);
    assert_eq!(executor.started.load(Ordering::SeqCst), 100);
}

#[tokio::test(start_paused = true)]
async fn test_open_loop_rate_over_duration() {
    let executor = Arc::new(MockExecutor::status(200).with_delay(Duration::from_millis(5)));
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(4)
                .with_rate_limit(10.0)
                .with_stop_condition(StopCondition::Duration(Duration::from_secs(5))),
        )
        .executor(executor)
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let snapshot = scheduler.run().await.unwrap();

    // Default burst is 10: at most 10 up front plus 10/s for five seconds
    let total = snapshot.total_requests;
    assert!((40..=60).contains(&total), "total = {total}");
}

#[tokio::test(start_paused = true)]
async fn test_open_loop_unit_burst_is_tight() {
    let executor = Arc::new(MockExecutor::status(200));
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(8)
                .with_rate_limit(20.0)
                .with_burst(1)
                .with_stop_condition(StopCondition::Duration(Duration::from_secs(2))),
        )
        .executor(executor)
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let snapshot = scheduler.run().await.unwrap();

    let total = snapshot.total_requests;
    assert!((38..=41).contains(&total), "total = {total}");
}

#[tokio::test]
async fn test_all_failures_counted_by_status() {
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(3)
                .with_stop_condition(StopCondition::RequestCount(20)),
        )
        .executor(Arc::new(MockExecutor::status(500)))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let snapshot = scheduler.run().await.unwrap();

    assert_eq!(snapshot.successful, 0);
    assert_eq!(snapshot.failed, 20);
    assert_eq!(snapshot.status_counts.len(), 1);
    assert_eq!(snapshot.status_counts.get(&500), Some(&20));
    assert!(snapshot.error_counts.is_empty());
}

#[tokio::test]
async fn test_timeouts_carry_no_status() {
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(2)
                .with_stop_condition(StopCondition::RequestCount(10)),
        )
        .executor(Arc::new(MockExecutor::error(ErrorKind::Timeout)))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let snapshot = scheduler.run().await.unwrap();

    assert_eq!(snapshot.total_requests, 10);
    assert_eq!(snapshot.failed, snapshot.total_requests);
    assert!(snapshot.status_counts.is_empty());
    assert_eq!(snapshot.error_counts.get(&ErrorKind::Timeout), Some(&10));
}

#[tokio::test]
async fn test_in_flight_bounded_by_concurrency() {
    let executor = Arc::new(MockExecutor::status(200).with_delay(Duration::from_millis(10)));
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(3)
                .with_stop_condition(StopCondition::RequestCount(30)),
        )
        .executor(executor.clone())
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    scheduler.run().await.unwrap();

    let max = executor.max_in_flight.load(Ordering::SeqCst);
    assert!(max >= 1 && max <= 3, "max in flight = {max}");
}

#[tokio::test(start_paused = true)]
async fn test_closed_loop_duration() {
    let executor = Arc::new(MockExecutor::status(200).with_delay(Duration::from_millis(10)));
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(2)
                .with_stop_condition(StopCondition::Duration(Duration::from_secs(2))),
        )
        .executor(executor)
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let snapshot = scheduler.run().await.unwrap();

    // Two workers, 10ms per request, two seconds
    let total = snapshot.total_requests;
    assert!((360..=404).contains(&total), "total = {total}");
    assert!(snapshot.elapsed >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_in_flight() {
    let executor = Arc::new(MockExecutor::status(200).with_delay(Duration::from_secs(1)));
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(2)
                .with_stop_condition(StopCondition::RequestCount(1000)),
        )
        .executor(executor.clone())
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let shutdown = scheduler.shutdown_handle();
    let run = tokio::spawn(scheduler.run());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    shutdown.send(()).unwrap();

    let snapshot = run.await.unwrap().unwrap();

    // Both second-round requests were in flight at the signal and still count
    assert_eq!(snapshot.total_requests, 4);
    assert_eq!(
        executor.started.load(Ordering::SeqCst),
        executor.completed.load(Ordering::SeqCst)
    );
    assert_eq!(
        snapshot.total_requests as usize,
        executor.completed.load(Ordering::SeqCst)
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_of_stops_on_count() {
    let (scheduler, _) = SchedulerBuilder::new()
        .config(config().with_stop_condition(StopCondition::FirstOf {
            requests: 5,
            duration: Duration::from_secs(60),
        }))
        .executor(Arc::new(MockExecutor::status(200)))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let start = Instant::now();
    let snapshot = scheduler.run().await.unwrap();

    assert_eq!(snapshot.total_requests, 5);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_first_of_stops_on_duration() {
    let (scheduler, _) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(2)
                .with_stop_condition(StopCondition::FirstOf {
                    requests: 1_000_000,
                    duration: Duration::from_secs(1),
                }),
        )
        .executor(Arc::new(
            MockExecutor::status(200).with_delay(Duration::from_millis(10)),
        ))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let start = Instant::now();
    let snapshot = scheduler.run().await.unwrap();

    assert!(snapshot.total_requests < 1_000_000);
    assert!(snapshot.total_requests >= 190);
    assert!(start.elapsed() < Duration::from_millis(1100));
}

#[tokio::test]
async fn test_request_log_receives_every_outcome() {
    let (scheduler, rx) = SchedulerBuilder::new()
        .config(
            config()
                .with_concurrency(2)
                .with_stop_condition(StopCondition::RequestCount(10)),
        )
        .executor(Arc::new(MockExecutor::status(204)))
        .sampler(Arc::new(MockSampler::new()))
        .request_log(ChannelConfig::default().with_outcome_buffer(4))
        .build()
        .unwrap();
    let mut rx = rx.unwrap();

    let reader = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(outcome) = rx.recv().await {
            seen.push(outcome);
        }
        seen
    });

    let snapshot = scheduler.run().await.unwrap();
    let seen = reader.await.unwrap();

    assert_eq!(seen.len(), 10);
    assert_eq!(snapshot.total_requests, 10);
    assert!(seen.iter().all(|o| o.status == Some(204)));
}

#[tokio::test]
async fn test_all_workers_failing_is_an_error() {
    let (scheduler, _) = SchedulerBuilder::new()
        .config(config().with_concurrency(2))
        .executor(Arc::new(MockExecutor::status(200)))
        .sampler(Arc::new(EmptySampler))
        .build()
        .unwrap();

    let err = scheduler.run().await.unwrap_err();
    assert_eq!(err.kind, BenchErrorKind::Orchestration);
}

#[test]
fn test_scheduler_debug_format() {
    let (scheduler, _) = SchedulerBuilder::new()
        .config(config().with_rate_limit(5.0))
        .executor(Arc::new(MockExecutor::status(200)))
        .sampler(Arc::new(MockSampler::new()))
        .build()
        .unwrap();

    let debug = format!("{:?}", scheduler);
    assert!(debug.contains("Scheduler"));
    assert!(debug.contains("mock"));
    assert_eq!(scheduler.config().concurrency, 1);
}
