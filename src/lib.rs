//! `bsale-http` is an async HTTP client for the Bsale REST API.
//!
//! [`BsaleClient`] turns a logical request into an authenticated HTTP
//! exchange with:
//! - a per-client TTL cache of GET responses, invalidated by mutations
//! - exponential backoff on server errors, timeouts and network failures
//! - `Retry-After` aware waits on HTTP 429
//! - a hard timeout on every attempt
//!
//! Collections are reached through [`BsaleClient::resource`], which adds
//! listing, pagination, lookup by id and counting on top of the raw
//! [`BsaleClient::get`] / [`BsaleClient::post`] / [`BsaleClient::put`] /
//! [`BsaleClient::delete`] calls.

mod cache;
mod client;
mod error;
mod options;
mod query;
mod resource;
mod retry;
mod transport;
mod webhook;

pub use client::{BsaleClient, LogSink, DEFAULT_BASE_URL};
pub use error::BsaleError;
pub use options::ClientOptions;
pub use query::{build_url, QueryParams, QueryValue};
pub use resource::{ListResponse, PaginateOptions, Resource, MAX_PAGE_SIZE};
pub use transport::Method;
pub use webhook::{WebhookAction, WebhookPayload, WebhookTopic};

pub type Result<T> = std::result::Result<T, BsaleError>;
