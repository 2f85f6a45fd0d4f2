//! Request shapes and weighted scenarios

use crate::config::ConfigError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One possible request shape in a scenario
///
/// Immutable once built; workers share it through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method, upper-case (e.g. "GET")
    pub method: String,

    /// Absolute target URL
    pub url: String,

    /// Header pairs; names are unique ignoring ASCII case
    headers: Vec<(String, String)>,

    /// Optional request body
    pub body: Option<Vec<u8>>,

    /// Whole-request timeout, including reading the body
    pub timeout: Duration,

    /// Verify the server's TLS certificate
    pub verify_tls: bool,

    /// Follow redirects transparently
    pub follow_redirects: bool,
}

impl RequestSpec {
    /// Create a spec with default timeout, TLS verification on and redirects off
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            verify_tls: true,
            follow_redirects: false,
        }
    }

    /// Shorthand for a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Add a header, replacing any existing header with the same name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Set the request body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable certificate verification
    pub fn with_tls_verification(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Enable or disable redirect following
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Header pairs in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header value ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {e}", self.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                self.url
            )));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidUrl(format!("{}: missing host", self.url)));
        }

        if self.method.is_empty()
            || !self
                .method
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ConfigError::InvalidMethod(self.method.clone()));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// A request shape paired with its relative selection weight
#[derive(Debug, Clone)]
pub struct ScenarioEntry {
    /// Shared request shape
    pub spec: Arc<RequestSpec>,

    /// Relative weight, finite and > 0
    pub weight: f64,
}

impl ScenarioEntry {
    /// Pair a spec with a weight
    pub fn new(spec: RequestSpec, weight: f64) -> Self {
        Self {
            spec: Arc::new(spec),
            weight,
        }
    }
}

/// Ordered, non-empty set of weighted request shapes
#[derive(Debug, Clone)]
pub struct Scenario {
    entries: Vec<ScenarioEntry>,
}

impl Scenario {
    /// Build a scenario, rejecting empty sets and invalid weights
    pub fn new(entries: Vec<ScenarioEntry>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::InvalidScenario(
                "scenario must contain at least one request".into(),
            ));
        }

        for (idx, entry) in entries.iter().enumerate() {
            if !entry.weight.is_finite() || entry.weight <= 0.0 {
                return Err(ConfigError::InvalidScenario(format!(
                    "entry {idx} has weight {}, weights must be positive",
                    entry.weight
                )));
            }
            entry.spec.validate()?;
        }

        Ok(Self { entries })
    }

    /// Single-endpoint scenario with weight 1
    pub fn single(spec: RequestSpec) -> Result<Self, ConfigError> {
        Self::new(vec![ScenarioEntry::new(spec, 1.0)])
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[ScenarioEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed scenario
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// URL of the first entry, used to label reports
    pub fn primary_target(&self) -> &str {
        &self.entries[0].spec.url
    }
}
