//! reqwest-backed [`RequestExecutor`]

use async_trait::async_trait;
use chrono::Utc;
use loadgen_core::{ErrorKind, RequestExecutor, RequestOutcome, RequestSpec, SuccessPolicy};
use reqwest::Method;
use tokio::time::Instant;

use crate::classify::classify_error;
use crate::pool::{HttpClientPool, HttpConfig};
use crate::HttpError;

/// Issues requests over pooled reqwest clients
///
/// Latency runs from just before the request is sent until the last body
/// byte is read. The request's own timeout bounds that whole span.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    pool: HttpClientPool,
    policy: SuccessPolicy,
}

impl HttpExecutor {
    /// Executor with the given pool settings and success policy
    pub fn new(config: &HttpConfig, policy: SuccessPolicy) -> Result<Self, HttpError> {
        let pool = HttpClientPool::new(config).map_err(HttpError::ClientBuild)?;
        Ok(Self { pool, policy })
    }

    /// Executor with default pool settings
    pub fn with_policy(policy: SuccessPolicy) -> Result<Self, HttpError> {
        Self::new(&HttpConfig::default(), policy)
    }

    /// Success policy applied to received statuses
    pub fn policy(&self) -> SuccessPolicy {
        self.policy
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn execute(&self, spec: &RequestSpec) -> RequestOutcome {
        let timestamp = Utc::now();
        let start = Instant::now();

        let method = match Method::from_bytes(spec.method.as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                tracing::warn!(method = %spec.method, "Unsupported HTTP method");
                return RequestOutcome::from_error(timestamp, start.elapsed(), ErrorKind::Other);
            }
        };

        let client = self.pool.client(spec.verify_tls, spec.follow_redirects);
        let mut request = client
            .request(method, spec.url.as_str())
            .timeout(spec.timeout);
        for (name, value) in spec.headers() {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &spec.body {
            request = request.body(body.clone());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let kind = classify_error(&err);
                tracing::trace!(url = %spec.url, error = %err, kind = %kind, "Request error");
                return RequestOutcome::from_error(timestamp, start.elapsed(), kind);
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => RequestOutcome::from_status(
                timestamp,
                start.elapsed(),
                status,
                body.len() as u64,
                self.policy,
            ),
            Err(err) => {
                let kind = classify_error(&err);
                tracing::trace!(url = %spec.url, status, error = %err, "Body read failed");
                RequestOutcome::from_partial(timestamp, start.elapsed(), status, kind)
            }
        }
    }
}
