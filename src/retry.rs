use std::time::Duration;

use reqwest::StatusCode;

/// How a single HTTP response steers the attempt loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusClass {
    Success,
    RateLimited,
    Server,
    Client,
    Other,
}

impl StatusClass {
    pub(crate) fn of(status: StatusCode) -> Self {
        if status.is_success() {
            Self::Success
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else if status.as_u16() >= 500 {
            Self::Server
        } else if status.is_client_error() {
            Self::Client
        } else {
            Self::Other
        }
    }
}

/// Exponential backoff: `2^attempt * base_ms`, attempt being 0-based.
pub(crate) fn backoff_delay(base_ms: u64, attempt: usize) -> Duration {
    let exp = attempt.min(16) as u32;
    Duration::from_millis(base_ms.saturating_mul(1u64 << exp))
}

/// Wait before retrying a 429: the leading integer digits of `Retry-After`
/// as seconds (`"2.5"` is 2 s), `fallback_ms` when there are none.
pub(crate) fn retry_after_delay(retry_after: Option<&str>, fallback_ms: u64) -> Duration {
    retry_after
        .and_then(|value| {
            let value = value.trim_start();
            let digits = value
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(value.len());
            value[..digits].parse::<u64>().ok()
        })
        .map(|seconds| Duration::from_millis(seconds.saturating_mul(1_000)))
        .unwrap_or_else(|| Duration::from_millis(fallback_ms))
}
