//! Webhook notifications pushed by Bsale.
//!
//! Feed a received payload to [`crate::BsaleClient::handle_webhook`] to drop
//! cached reads of the resource it reports as changed.

use serde::{Deserialize, Serialize};

/// Resource family a webhook notification is about.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookTopic {
    Product,
    Variant,
    Document,
    Price,
    Stock,
    #[serde(other)]
    Unknown,
}

impl WebhookTopic {
    /// Resource segment whose cached entries become stale.
    pub fn resource(self) -> Option<&'static str> {
        match self {
            Self::Product => Some("products"),
            Self::Variant => Some("variants"),
            Self::Document => Some("documents"),
            Self::Price => Some("price_lists"),
            Self::Stock => Some("stocks"),
            Self::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Variant => "variant",
            Self::Document => "document",
            Self::Price => "price",
            Self::Stock => "stock",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    Post,
    Put,
    Delete,
}

/// Body of a webhook POST.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub cpn_id: u64,
    /// Resource URL; Bsale sends `/v2/` paths here.
    pub resource: String,
    pub resource_id: String,
    pub topic: WebhookTopic,
    pub action: WebhookAction,
    /// Unix timestamp in seconds.
    pub send: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_list_id: Option<String>,
}
