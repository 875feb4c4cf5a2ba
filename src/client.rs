use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::{
    cache::ResponseCache,
    query::{self, resource_segment},
    retry::{backoff_delay, retry_after_delay, StatusClass},
    transport::{send_once, RawResponse, TransportFailure},
    BsaleError, ClientOptions, Method, QueryParams, Result, WebhookPayload,
};

/// Production endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.bsale.io/v1";

/// Observational callback receiving a short message and auxiliary data at
/// every retry and cache decision.
pub type LogSink = Arc<dyn Fn(&str, &Value) + Send + Sync>;

#[derive(Clone)]
/// HTTP client for the Bsale REST API.
///
/// Every call goes through URL building, the GET cache, and an attempt loop
/// with timeout, retry and rate-limit handling. Clones share one cache;
/// separately constructed clients never do.
pub struct BsaleClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    options: ClientOptions,
    cache: Arc<ResponseCache>,
    logger: Option<LogSink>,
}

impl fmt::Debug for BsaleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BsaleClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("options", &self.options)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl BsaleClient {
    /// Creates a client for the production endpoint with default options.
    pub fn new(access_token: impl Into<String>) -> Self {
        let options = ClientOptions::default();
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            access_token: access_token.into(),
            cache: Arc::new(ResponseCache::new(Duration::from_millis(
                options.cache_ttl_ms,
            ))),
            options,
            logger: None,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `BSALE_ACCESS_TOKEN` — access token (required)
    /// - `BSALE_BASE_URL` — base URL override (optional)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bsale_http::BsaleClient;
    ///
    /// let bsale = BsaleClient::from_env().expect("missing BSALE_ACCESS_TOKEN");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let token = std::env::var("BSALE_ACCESS_TOKEN")
            .map_err(|_| "missing BSALE_ACCESS_TOKEN environment variable".to_owned())?;
        if token.trim().is_empty() {
            return Err("BSALE_ACCESS_TOKEN is set but empty".to_owned());
        }
        let client = Self::new(token.trim());
        match std::env::var("BSALE_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Ok(client.with_base_url(url.trim())),
            _ => Ok(client),
        }
    }

    /// Overrides the base URL. Trailing slashes are dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Applies timeout, retry and cache options.
    ///
    /// Starts a fresh cache sized to the new TTL.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.cache = Arc::new(ResponseCache::new(Duration::from_millis(opts.cache_ttl_ms)));
        self.options = opts;
        self
    }

    /// Installs a log sink. It never influences control flow.
    pub fn with_logger<F>(mut self, logger: F) -> Self
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Builds the full request URL for `path` and `params`.
    pub fn build_url(&self, path: &str, params: impl Into<QueryParams>) -> String {
        query::build_url(&self.base_url, path, &params.into())
    }

    /// Performs a cached GET and decodes the response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: impl Into<QueryParams>,
    ) -> Result<T> {
        let value = self.get_value(path, params.into()).await?;
        decode(value)
    }

    /// Performs a cached GET and returns the raw JSON value.
    pub async fn get_value(&self, path: &str, params: impl Into<QueryParams>) -> Result<Value> {
        let url = self.build_url(path, params);

        if let Some(cached) = self.cache.lookup(&url) {
            self.log("Cache hit", json!({ "url": url }));
            return Ok(cached);
        }

        let value = self.execute(Method::Get, &url, None).await?;
        self.cache.store(url, value.clone());
        Ok(value)
    }

    /// Performs a POST and invalidates cached reads of the path's resource.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body).map_err(BsaleError::Encode)?;
        decode(self.mutate(Method::Post, path, Some(body)).await?)
    }

    /// Performs a PUT and invalidates cached reads of the path's resource.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body).map_err(BsaleError::Encode)?;
        decode(self.mutate(Method::Put, path, Some(body)).await?)
    }

    /// Performs a DELETE and invalidates cached reads of the path's resource.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.mutate(Method::Delete, path, None).await?)
    }

    /// Removes cached entries whose URL contains `pattern`, or every entry
    /// when `pattern` is `None`.
    pub fn invalidate_cache(&self, pattern: Option<&str>) {
        self.cache.invalidate(pattern);
    }

    /// Clears the entire response cache.
    pub fn clear_cache(&self) {
        self.cache.invalidate(None);
    }

    /// Clears cached entries for one resource, e.g. `"products"`.
    pub fn clear_resource_cache(&self, resource: &str) {
        self.cache.invalidate(Some(resource));
    }

    /// Number of entries currently held by the cache, expired ones included.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Invalidates the cache for the resource a webhook notification is about.
    ///
    /// Topics without a known resource are ignored.
    pub fn handle_webhook(&self, payload: &WebhookPayload) {
        if let Some(resource) = payload.topic.resource() {
            self.log(
                "Webhook received, invalidating cache",
                json!({ "topic": payload.topic.as_str(), "resource": resource }),
            );
            self.cache.invalidate(Some(resource));
        }
    }

    async fn mutate(&self, method: Method, path: &str, body: Option<String>) -> Result<Value> {
        let url = self.build_url(path, ());
        let value = self.execute(method, &url, body.as_deref()).await?;
        if let Some(segment) = resource_segment(&self.base_url, path) {
            self.cache.invalidate(Some(segment));
        }
        Ok(value)
    }

    /// Runs up to `max_retries + 1` attempts. Every retry, 429 included,
    /// consumes one attempt.
    async fn execute(&self, method: Method, url: &str, body: Option<&str>) -> Result<Value> {
        let timeout = Duration::from_millis(self.options.timeout_ms);
        let mut attempt = 0usize;

        loop {
            self.log(&format!("{method} {url}"), json!({ "attempt": attempt }));
            let retries_left = attempt < self.options.max_retries;

            match send_once(&self.http, method, url, &self.access_token, body, timeout).await {
                Ok(response) => match StatusClass::of(response.status) {
                    StatusClass::Success => return decode_body(&response.body),
                    StatusClass::RateLimited if retries_left => {
                        let wait = retry_after_delay(
                            response.retry_after.as_deref(),
                            self.options.rate_limit_wait_ms,
                        );
                        self.log("Rate limited, waiting", json!({ "waitMs": millis(wait) }));
                        sleep(wait).await;
                    }
                    StatusClass::Server if retries_left => {
                        let backoff = backoff_delay(self.options.retry_backoff_ms, attempt);
                        self.log(
                            "Server error, retrying",
                            json!({
                                "status": response.status.as_u16(),
                                "backoff": millis(backoff),
                            }),
                        );
                        sleep(backoff).await;
                    }
                    class => return Err(status_error(class, response, url)),
                },
                Err(failure) => {
                    if !retries_left {
                        return Err(self.transport_error(failure, method, url));
                    }
                    let backoff = backoff_delay(self.options.retry_backoff_ms, attempt);
                    let error = match &failure {
                        TransportFailure::Timeout => {
                            format!("timed out after {}ms", self.options.timeout_ms)
                        }
                        TransportFailure::Network(err) => err.to_string(),
                    };
                    self.log(
                        "Network error, retrying",
                        json!({ "error": error, "backoff": millis(backoff) }),
                    );
                    sleep(backoff).await;
                }
            }

            attempt += 1;
        }
    }

    fn transport_error(&self, failure: TransportFailure, method: Method, url: &str) -> BsaleError {
        match failure {
            TransportFailure::Timeout => BsaleError::Timeout {
                timeout_ms: self.options.timeout_ms,
                method,
                url: url.to_owned(),
            },
            TransportFailure::Network(source) => BsaleError::Network {
                method,
                url: url.to_owned(),
                source,
            },
        }
    }

    fn log(&self, message: &str, data: Value) {
        #[cfg(feature = "tracing")]
        tracing::debug!(%data, "{}", message);

        if let Some(logger) = &self.logger {
            logger(message, &data);
        }
    }
}

fn status_error(class: StatusClass, response: RawResponse, url: &str) -> BsaleError {
    let status = response.status.as_u16();
    let body = serde_json::from_str(&response.body).unwrap_or(Value::Null);
    let url = url.to_owned();
    match class {
        StatusClass::RateLimited => BsaleError::RateLimited { body, url },
        StatusClass::Server => BsaleError::Server { status, body, url },
        StatusClass::Client => BsaleError::Client { status, body, url },
        StatusClass::Success | StatusClass::Other => BsaleError::Api { status, body, url },
    }
}

/// Empty bodies decode to `{}`; the API answers some 200s without content.
fn decode_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(body).map_err(|err| {
        BsaleError::Decode(format!("invalid response JSON: {err}; body: {body}"))
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| BsaleError::Decode(format!("unexpected response shape: {err}")))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
