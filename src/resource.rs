use serde::{de::DeserializeOwned, Deserialize};

use crate::{BsaleClient, QueryParams, Result};

/// Largest page the API serves.
pub const MAX_PAGE_SIZE: usize = 50;

/// One page of a collection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Absolute URL of the following page, when there is one.
    #[serde(default)]
    pub next: Option<String>,
}

/// Options for [`Resource::list_all`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PaginateOptions {
    /// Stop once this many items are collected. `None` or `Some(0)` fetches everything.
    pub max_items: Option<usize>,
    /// Items per page, clamped to `1..=50`. Defaults to 50.
    pub page_size: Option<usize>,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

/// Standard read endpoints of one API collection, e.g. `products`.
#[derive(Clone, Debug)]
pub struct Resource<'a> {
    client: &'a BsaleClient,
    path: String,
}

impl BsaleClient {
    /// Returns a handle on the collection at `path` (`"products"`, `"price_lists"`).
    pub fn resource(&self, path: impl Into<String>) -> Resource<'_> {
        let path = path.into();
        Resource {
            client: self,
            path: path.trim_matches('/').to_owned(),
        }
    }
}

impl<'a> Resource<'a> {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `GET /<path>.json`
    pub async fn list<T: DeserializeOwned>(
        &self,
        params: impl Into<QueryParams>,
    ) -> Result<ListResponse<T>> {
        self.client
            .get(&format!("/{}.json", self.path), params)
            .await
    }

    /// Fetches every page, `limit`/`offset` overriding those in `params`.
    ///
    /// Stops when a page has no `next` link or comes back short.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        params: impl Into<QueryParams>,
        options: PaginateOptions,
    ) -> Result<Vec<T>> {
        let page_size = options
            .page_size
            .unwrap_or(MAX_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let max_items = options.max_items.filter(|max| *max > 0);
        let mut params = params.into();
        let mut items = Vec::new();
        let mut offset = 0usize;

        loop {
            params.set("limit", page_size);
            params.set("offset", offset);
            let page: ListResponse<T> = self.list(&params).await?;
            let fetched = page.items.len();
            items.extend(page.items);

            if let Some(max) = max_items {
                if items.len() >= max {
                    items.truncate(max);
                    return Ok(items);
                }
            }

            if page.next.is_none() || fetched < page_size {
                return Ok(items);
            }

            offset += page_size;
        }
    }

    /// `GET /<path>/<id>.json`
    pub async fn get_by_id<T: DeserializeOwned>(
        &self,
        id: u64,
        params: impl Into<QueryParams>,
    ) -> Result<T> {
        self.client
            .get(&format!("/{}/{id}.json", self.path), params)
            .await
    }

    /// `GET /<path>/count.json`
    pub async fn count(&self, params: impl Into<QueryParams>) -> Result<u64> {
        let response: CountResponse = self
            .client
            .get(&format!("/{}/count.json", self.path), params)
            .await?;
        Ok(response.count)
    }
}
