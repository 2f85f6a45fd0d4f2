//! Turning command-line inputs into request shapes

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use loadgen_core::{RequestSpec, Scenario, ScenarioEntry};
use serde::Deserialize;

/// Settings every request in a run shares unless a scenario entry overrides them
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub verify_tls: bool,
    pub follow_redirects: bool,
}

impl RequestDefaults {
    /// Build a spec for `method url`, shared headers first
    pub fn spec(&self, method: &str, url: &str) -> RequestSpec {
        self.headers.iter().fold(
            RequestSpec::new(method, url)
                .with_timeout(self.timeout)
                .with_tls_verification(self.verify_tls)
                .with_follow_redirects(self.follow_redirects),
            |spec, (name, value)| spec.with_header(name.as_str(), value.as_str()),
        )
    }
}

/// Parse `Key:Value` header arguments
///
/// Entries without a colon are skipped with a warning.
pub fn parse_headers(raw: &[String]) -> Vec<(String, String)> {
    raw.iter()
        .filter_map(|header| match header.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Some((name.trim().to_string(), value.trim().to_string()))
            }
            _ => {
                tracing::warn!(header = %header, "Ignoring malformed header, expected Key:Value");
                None
            }
        })
        .collect()
}

/// Inline body, or the contents of a file when prefixed with `@`
pub fn load_payload(arg: &str) -> Result<Vec<u8>> {
    match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read payload file {path}"))
        }
        None => Ok(arg.as_bytes().to_vec()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFileEntry {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    body: Option<String>,
    #[serde(default = "default_weight")]
    weight: f64,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_weight() -> f64 {
    1.0
}

/// Parse a scenario document: a JSON array of weighted request entries
///
/// ```json
/// [
///   {"url": "http://localhost:8080/", "weight": 3},
///   {"url": "http://localhost:8080/items", "method": "POST",
///    "headers": {"Content-Type": "application/json"}, "body": "{}"}
/// ]
/// ```
///
/// `method` defaults to GET and `weight` to 1. A body starting with `@` is
/// read from a file. Entry headers are applied after the shared ones.
pub fn parse_scenario(json: &str, defaults: &RequestDefaults) -> Result<Scenario> {
    let raw: Vec<ScenarioFileEntry> =
        serde_json::from_str(json).context("scenario must be a JSON array of request entries")?;

    let mut entries = Vec::with_capacity(raw.len());
    for entry in raw {
        let mut spec = defaults.spec(&entry.method, &entry.url);
        for (name, value) in entry.headers {
            spec = spec.with_header(name, value);
        }
        if let Some(body) = &entry.body {
            spec = spec.with_body(load_payload(body)?);
        }
        entries.push(ScenarioEntry::new(spec, entry.weight));
    }

    Ok(Scenario::new(entries)?)
}

/// Read and parse a scenario file
pub fn load_scenario(path: &Path, defaults: &RequestDefaults) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file {}", path.display()))?;
    parse_scenario(&json, defaults)
        .with_context(|| format!("invalid scenario file {}", path.display()))
}
