/// Configures timeout, retry and cache behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Lifetime of cached GET responses in milliseconds. `0` disables caching.
    pub cache_ttl_ms: u64,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_backoff_ms: u64,
    /// Wait after a 429 that carries no usable `Retry-After` header.
    pub rate_limit_wait_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            max_retries: 3,
            cache_ttl_ms: 60_000,
            retry_backoff_ms: 1_000,
            rate_limit_wait_ms: 1_000,
        }
    }
}
