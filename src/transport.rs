use std::fmt;
use std::time::Duration;

use reqwest::{header, StatusCode};

/// HTTP methods issued by the client.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Only POST and PUT carry a request body.
    pub(crate) fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of one completed attempt, body already read.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub body: String,
}

/// Why an attempt produced no response.
#[derive(Debug)]
pub(crate) enum TransportFailure {
    Timeout,
    Network(reqwest::Error),
}

/// One HTTP exchange bounded by `timeout`.
///
/// The deadline covers connecting, sending and reading the whole body; when
/// it expires reqwest drops the in-flight connection and its timer.
pub(crate) async fn send_once(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    access_token: &str,
    body: Option<&str>,
    timeout: Duration,
) -> Result<RawResponse, TransportFailure> {
    let mut request = http
        .request(method.to_reqwest(), url)
        .header("access_token", access_token)
        .header(header::CONTENT_TYPE, "application/json")
        .timeout(timeout);

    if let Some(body) = body.filter(|_| method.has_body()) {
        request = request.body(body.to_owned());
    }

    let response = request.send().await.map_err(classify)?;
    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.text().await.map_err(classify)?;

    Ok(RawResponse {
        status,
        retry_after,
        body,
    })
}

fn classify(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Network(err)
    }
}

#[cfg(test)]
mod tests {
    use super::Method;

    #[test]
    fn only_post_and_put_carry_a_body() {
        assert!(Method::Post.has_body());
        assert!(Method::Put.has_body());
        assert!(!Method::Get.has_body());
        assert!(!Method::Delete.has_body());
    }

    #[test]
    fn method_display_is_uppercase() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert_eq!(Method::Get.as_str(), "GET");
    }
}
