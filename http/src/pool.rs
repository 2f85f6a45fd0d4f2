//! HTTP client configuration and pooling

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;

/// Maximum redirect hops when following is enabled
pub const MAX_REDIRECTS: usize = 10;

/// Configuration for the HTTP client pool.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Connection timeout; the per-request timeout still bounds the whole call
    pub connect_timeout: Option<Duration>,

    /// TCP keepalive interval
    pub tcp_keepalive: Option<Duration>,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 256,
            connect_timeout: None,
            tcp_keepalive: Some(Duration::from_secs(60)),
            user_agent: format!("loadgen/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Create config with custom connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Create config with custom pool size.
    pub fn with_pool_max_idle(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }
}

/// Connection-pooled clients, one per TLS/redirect combination
///
/// reqwest fixes certificate verification and redirect policy when a client
/// is built, so each combination a request spec can ask for gets its own
/// client. Connections are pooled within each.
#[derive(Debug, Clone)]
pub struct HttpClientPool {
    /// Indexed by `verify_tls as usize * 2 + follow_redirects as usize`
    clients: [Client; 4],

    /// Configuration used to create this pool
    config: HttpConfig,
}

impl HttpClientPool {
    /// Create a new HTTP client pool with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let clients = [
            build_client(config, false, false)?,
            build_client(config, false, true)?,
            build_client(config, true, false)?,
            build_client(config, true, true)?,
        ];

        Ok(Self {
            clients,
            config: config.clone(),
        })
    }

    /// Client matching a request's TLS and redirect settings
    pub fn client(&self, verify_tls: bool, follow_redirects: bool) -> &Client {
        &self.clients[usize::from(verify_tls) * 2 + usize::from(follow_redirects)]
    }

    /// Get the configuration for this pool.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

fn build_client(
    config: &HttpConfig,
    verify_tls: bool,
    follow_redirects: bool,
) -> Result<Client, reqwest::Error> {
    let redirect = if follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };

    let mut builder = Client::builder()
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .redirect(redirect)
        .danger_accept_invalid_certs(!verify_tls);

    if let Some(timeout) = config.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(keepalive) = config.tcp_keepalive {
        builder = builder.tcp_keepalive(keepalive);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(90));
        assert!(config.connect_timeout.is_none());
        assert!(config.user_agent.starts_with("loadgen/"));
    }

    #[test]
    fn test_http_config_builder() {
        let config = HttpConfig::default()
            .with_connect_timeout(Duration::from_secs(5))
            .with_pool_max_idle(8);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.pool_max_idle_per_host, 8);
    }

    #[test]
    fn test_pool_creation() {
        let pool = HttpClientPool::new(&HttpConfig::default()).unwrap();
        assert_eq!(pool.config().pool_max_idle_per_host, 256);
        let _ = pool.client(true, false);
        let _ = pool.client(false, true);
    }
}
