//! CLI argument parsing and run orchestration

mod input;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use loadgen_core::{
    config::duration_from_secs, ChannelConfig, ConfigError, LoadTestConfig, Scenario,
    SchedulerBuilder, StopCondition, SuccessPolicy,
};
use loadgen_http::HttpExecutor;
use loadgen_report::{
    print_summary, spawn_request_log, write_json, ProgressReporter, RequestLogWriter, Summary,
};
use loadgen_samplers::WeightedSampler;

use input::{load_payload, load_scenario, parse_headers, RequestDefaults};

/// loadgen - configurable HTTP load generator
#[derive(Parser, Debug)]
#[command(name = "loadgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target URL
    #[arg(value_name = "URL", conflicts_with = "url_flag")]
    pub url: Option<String>,

    /// Target URL (alternative to the positional argument)
    #[arg(long = "url", id = "url_flag", value_name = "URL")]
    pub url_flag: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long, default_value = "1")]
    pub concurrency: usize,

    /// Target requests per second across all workers; omit for closed-loop
    #[arg(long)]
    pub qps: Option<f64>,

    /// Token bucket capacity [default: max(1, round(qps))]
    #[arg(long, requires = "qps")]
    pub burst: Option<u32>,

    /// Run for this many seconds
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Stop after this many requests
    #[arg(short = 'r', long)]
    pub requests: Option<usize>,

    /// HTTP method
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Request header as Key:Value (repeatable)
    #[arg(long = "headers", value_name = "KEY:VALUE")]
    pub headers: Vec<String>,

    /// Request body, or @path to read it from a file
    #[arg(long = "data", visible_alias = "payload")]
    pub data: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: f64,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub no_verify: bool,

    /// Follow redirects
    #[arg(long)]
    pub allow_redirects: bool,

    /// Count 3xx responses as successful
    #[arg(long = "accept-3xx")]
    pub accept_3xx: bool,

    /// JSON file describing a weighted mix of requests (replaces URL)
    #[arg(long, value_name = "FILE", conflicts_with_all = ["url", "url_flag", "data"])]
    pub scenario: Option<PathBuf>,

    /// Seed for reproducible scenario selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write one CSV row per request to this file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Write the JSON summary to this file
    #[arg(long, value_name = "FILE")]
    pub json_out: Option<PathBuf>,

    /// Print progress once per second
    #[arg(long = "print_progress", visible_alias = "print-progress")]
    pub print_progress: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn request_defaults(&self) -> Result<RequestDefaults> {
        let timeout = duration_from_secs(self.timeout)
            .map_err(|_| ConfigError::InvalidTimeout(format!("{} is not positive", self.timeout)))?;
        Ok(RequestDefaults {
            headers: parse_headers(&self.headers),
            timeout,
            verify_tls: !self.no_verify,
            follow_redirects: self.allow_redirects,
        })
    }

    fn scenario(&self) -> Result<Scenario> {
        let defaults = self.request_defaults()?;

        if let Some(path) = &self.scenario {
            return load_scenario(path, &defaults);
        }

        let Some(url) = self.url.as_ref().or(self.url_flag.as_ref()) else {
            bail!("a target URL is required (positional, --url, or --scenario)");
        };

        let mut spec = defaults.spec(&self.method, url);
        if let Some(data) = &self.data {
            spec = spec.with_body(load_payload(data)?);
        }
        Ok(Scenario::single(spec)?)
    }

    fn stop_condition(&self) -> Result<StopCondition> {
        let duration = self.duration.map(duration_from_secs).transpose()?;
        StopCondition::from_limits(self.requests, duration)
            .ok_or_else(|| ConfigError::MissingStopCondition.into())
    }

    /// Build the validated run configuration
    pub fn to_config(&self) -> Result<LoadTestConfig> {
        let policy = if self.accept_3xx {
            SuccessPolicy::Accept3xx
        } else {
            SuccessPolicy::Strict2xx
        };

        let mut config = LoadTestConfig::new(self.scenario()?)
            .with_concurrency(self.concurrency)
            .with_stop_condition(self.stop_condition()?)
            .with_success_policy(policy);
        if let Some(qps) = self.qps {
            config = config.with_rate_limit(qps);
        }
        if let Some(burst) = self.burst {
            config = config.with_burst(burst);
        }

        config.validate()?;
        Ok(config)
    }

    /// Run the load test described by the arguments
    ///
    /// Output files are opened before the first request. Once the run has
    /// started its summary is always printed and saved; a request log failure
    /// is reported only after that.
    pub async fn run(&self) -> Result<()> {
        let config = self.to_config().context("invalid configuration")?;
        let target = config.scenario.primary_target().to_string();
        let request_limit = config.stop_condition.request_limit();

        let request_log = self
            .csv
            .as_deref()
            .map(|path| {
                RequestLogWriter::create(path)
                    .with_context(|| format!("cannot open request log {}", path.display()))
            })
            .transpose()?;

        let sampler = match self.seed {
            Some(seed) => WeightedSampler::seeded(&config.scenario, seed),
            None => WeightedSampler::new(&config.scenario),
        }
        .context("failed to build scenario selector")?;
        let executor = HttpExecutor::with_policy(config.success_policy)
            .context("failed to build HTTP client")?;

        let mut builder = SchedulerBuilder::new()
            .config(config)
            .executor(Arc::new(executor))
            .sampler(Arc::new(sampler));
        if request_log.is_some() {
            builder = builder.request_log(ChannelConfig::default());
        }
        let (scheduler, log_rx) = builder.build()?;

        let log_task = request_log
            .zip(log_rx)
            .map(|(log, rx)| spawn_request_log(log, rx));
        let progress = self
            .print_progress
            .then(|| ProgressReporter::start(scheduler.metrics(), request_limit));

        let snapshot = scheduler.run_with_signal_handling().await?;

        if let Some(progress) = progress {
            progress.finish(snapshot.total_requests);
        }
        // Every sender is gone once the run returns, so the writer drains and stops
        let log_result = match log_task {
            Some(task) => Some(task.await),
            None => None,
        };

        let summary = Summary::from_snapshot(target, &snapshot);
        print_summary(&summary);

        if let Some(path) = &self.json_out {
            write_json(&summary, path).context("failed to write JSON summary")?;
            println!("Saved JSON summary to {}", path.display());
        }

        if let (Some(result), Some(path)) = (log_result, &self.csv) {
            let rows = result
                .context("request log writer stopped unexpectedly")?
                .context("failed to write request log")?;
            tracing::info!(path = %path.display(), rows, "Saved request log");
        }

        Ok(())
    }
}
