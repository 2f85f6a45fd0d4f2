//! Rate limiting for request execution

use crate::config::default_burst;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket arithmetic, independent of any clock
///
/// Starts full. `tokens` stays within `[0, capacity]`; a request is admitted
/// only when at least one whole token is available.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    tokens: f64,
    capacity: f64,
    rate: f64,
    updated: Instant,
}

impl TokenBucket {
    /// Full bucket refilling at `rate` tokens/sec up to `capacity`
    pub fn new(rate: f64, capacity: u32, now: Instant) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            tokens: capacity,
            capacity,
            rate,
            updated: now,
        }
    }

    /// Add `elapsed * rate` tokens, capped at capacity
    pub fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.updated).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.updated = now;
    }

    /// Take one token, or report how long until one is available
    pub fn try_take(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - self.tokens) / self.rate;
            Err(Duration::from_secs_f64(wait.max(0.0)))
        }
    }

    /// Tokens currently in the bucket (as of the last refill)
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Bucket capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}

/// Rate limiter shared by every worker in open-loop mode
///
/// All bucket access goes through one async mutex. A waiter holds the lock
/// while it sleeps, so later callers queue behind it in FIFO order instead of
/// racing for the next token.
pub struct RequestRateLimiter {
    bucket: Option<Mutex<TokenBucket>>,
    rate_limit: Option<f64>,
    burst: Option<u32>,
}

impl RequestRateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `rate_limit` - Requests per second. `None`, zero, negative or
    ///   non-finite values disable rate limiting.
    /// * `burst` - Bucket capacity. Defaults to `max(1, round(rate_limit))`.
    ///
    /// # Examples
    /// ```
    /// use loadgen_core::worker::RequestRateLimiter;
    ///
    /// // 100 requests per second, bursts of up to 10
    /// let limiter = RequestRateLimiter::new(Some(100.0), Some(10));
    /// assert_eq!(limiter.burst(), Some(10));
    ///
    /// // Create unlimited rate limiter
    /// let unlimited = RequestRateLimiter::unlimited();
    /// assert!(!unlimited.is_enabled());
    /// ```
    pub fn new(rate_limit: Option<f64>, burst: Option<u32>) -> Self {
        let rate_limit = rate_limit.filter(|rps| rps.is_finite() && *rps > 0.0);
        let burst = rate_limit.map(|rps| burst.unwrap_or_else(|| default_burst(rps)).max(1));
        let bucket = rate_limit
            .zip(burst)
            .map(|(rps, cap)| Mutex::new(TokenBucket::new(rps, cap, Instant::now())));

        Self {
            bucket,
            rate_limit,
            burst,
        }
    }

    /// Create an unlimited rate limiter (no rate limiting)
    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// Wait until a request is allowed, consuming one token
    ///
    /// Returns immediately if no rate limit is configured.
    pub async fn acquire(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };

        let mut bucket = bucket.lock().await;
        loop {
            match bucket.try_take(Instant::now()) {
                Ok(()) => return,
                Err(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Try to take a token without waiting
    ///
    /// Returns `false` if no token is available or another caller is
    /// currently waiting. Always `true` when rate limiting is disabled.
    pub fn try_acquire(&self) -> bool {
        match &self.bucket {
            Some(bucket) => match bucket.try_lock() {
                Ok(mut bucket) => bucket.try_take(Instant::now()).is_ok(),
                Err(_) => false,
            },
            None => true,
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.bucket.is_some()
    }

    /// Configured rate (requests per second)
    pub fn rate_limit(&self) -> Option<f64> {
        self.rate_limit
    }

    /// Effective bucket capacity
    pub fn burst(&self) -> Option<u32> {
        self.burst
    }
}

impl Default for RequestRateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter")
            .field("rate_limit", &self.rate_limit)
            .field("burst", &self.burst)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
