use serde_json::Value;

use crate::Method;

/// Error type returned by this crate.
///
/// Rate limits, server errors, timeouts and network failures are retried
/// inside the client; they only surface here once the retry budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum BsaleError {
    /// HTTP 429 on the last permitted attempt.
    #[error("rate limited: {url}")]
    RateLimited { body: Value, url: String },
    /// HTTP 500 or above on the last permitted attempt.
    #[error("server error {status}: {url}")]
    Server {
        status: u16,
        /// Parsed response body, `Null` if it was not JSON.
        body: Value,
        url: String,
    },
    /// HTTP 4xx other than 429. Never retried.
    #[error("client error {status}: {url}")]
    Client { status: u16, body: Value, url: String },
    /// Any other non-success status. Never retried.
    #[error("api error {status}: {url}")]
    Api { status: u16, body: Value, url: String },
    /// The attempt exceeded the configured timeout.
    #[error("request timed out after {timeout_ms}ms: {method} {url}")]
    Timeout {
        timeout_ms: u64,
        method: Method,
        url: String,
    },
    /// Connection-level failure from `reqwest`.
    #[error("network error: {method} {url}: {source}")]
    Network {
        method: Method,
        url: String,
        source: reqwest::Error,
    },
    /// Successful response whose body could not be decoded.
    ///
    /// Fatal on the first occurrence: a malformed 2xx body is not retried,
    /// unlike network failures.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

impl BsaleError {
    /// HTTP status, for errors that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Client { status, .. } | Self::Api { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Parsed response body, for errors that carry one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::RateLimited { body, .. }
            | Self::Server { body, .. }
            | Self::Client { body, .. }
            | Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Request URL, for errors raised while executing a request.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::RateLimited { url, .. }
            | Self::Server { url, .. }
            | Self::Client { url, .. }
            | Self::Api { url, .. }
            | Self::Timeout { url, .. }
            | Self::Network { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::BsaleError;
    use crate::Method;

    #[test]
    fn accessors_expose_status_body_and_url() {
        let err = BsaleError::Client {
            status: 404,
            body: json!({"error": "not found"}),
            url: "https://api.bsale.io/v1/products/1.json".to_owned(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(!err.is_server_error());
        assert_eq!(err.body(), Some(&json!({"error": "not found"})));
        assert_eq!(err.url(), Some("https://api.bsale.io/v1/products/1.json"));
    }

    #[test]
    fn timeout_message_names_duration_and_request() {
        let err = BsaleError::Timeout {
            timeout_ms: 5_000,
            method: Method::Get,
            url: "https://api.bsale.io/v1/stocks.json".to_owned(),
        };
        assert!(err.is_timeout());
        assert_eq!(err.status(), None);
        assert_eq!(
            err.to_string(),
            "request timed out after 5000ms: GET https://api.bsale.io/v1/stocks.json"
        );
    }

    #[test]
    fn rate_limited_reports_429() {
        let err = BsaleError::RateLimited {
            body: json!(null),
            url: "u".to_owned(),
        };
        assert!(err.is_rate_limit());
        assert_eq!(err.status(), Some(429));
    }
}
