use std::fmt;

use url::form_urlencoded;

/// Scalar query parameter value.
///
/// [`QueryValue::Null`] entries are skipped when the URL is built.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl QueryValue {
    pub fn null() -> Self {
        Self::Null
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<usize> for QueryValue {
    fn from(value: usize) -> Self {
        i64::try_from(value)
            .map(Self::Integer)
            .unwrap_or_else(|_| Self::Text(value.to_string()))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Ordered query parameter list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams(Vec<(String, QueryValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Sets a parameter, replacing an existing entry with the same key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Form-encodes the non-null entries. Returns `None` when nothing remains.
    fn encode(&self) -> Option<String> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut written = false;
        for (key, value) in self.iter().filter(|(_, value)| !value.is_null()) {
            serializer.append_pair(key, &value.to_string());
            written = true;
        }
        written.then(|| serializer.finish())
    }
}

impl From<()> for QueryParams {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<&QueryParams> for QueryParams {
    fn from(params: &QueryParams) -> Self {
        params.clone()
    }
}

impl<K: Into<String>> From<Vec<(K, QueryValue)>> for QueryParams {
    fn from(values: Vec<(K, QueryValue)>) -> Self {
        Self(
            values
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

impl<K: Into<String>, const N: usize> From<[(K, QueryValue); N]> for QueryParams {
    fn from(values: [(K, QueryValue); N]) -> Self {
        Self(
            values
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Builds a request URL from a base URL, a path and query parameters.
///
/// Absolute `http://` / `https://` paths (pagination `next` links) are used
/// as-is. Relative paths are joined to `base_url` with exactly one `/`.
/// Null parameters are omitted; `&` is used when the URL already carries a
/// query string.
pub fn build_url(base_url: &str, path: &str, params: &QueryParams) -> String {
    let mut url = if is_absolute(path) {
        path.to_owned()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };

    if let Some(query) = params.encode() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }

    url
}

/// Extracts the resource segment used to invalidate cached reads after a
/// mutation: the first run of lowercase ASCII letters and underscores.
///
/// `/products/12.json` gives `products`, `price_lists.json` gives
/// `price_lists`. Absolute URLs under `base_url` are inspected relative to it;
/// other absolute URLs by their path component.
pub(crate) fn resource_segment<'a>(base_url: &str, path: &'a str) -> Option<&'a str> {
    let path = if is_absolute(path) {
        match path.strip_prefix(base_url.trim_end_matches('/')) {
            Some(rest) => rest,
            None => {
                let after_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
                after_scheme.find('/').map_or("", |index| &after_scheme[index..])
            }
        }
    } else {
        path
    };

    let is_segment_char = |c: char| c.is_ascii_lowercase() || c == '_';
    let start = path.find(is_segment_char)?;
    let rest = &path[start..];
    let end = rest.find(|c: char| !is_segment_char(c)).unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::{build_url, resource_segment, QueryParams, QueryValue};

    const BASE: &str = "https://api.bsale.io/v1";

    #[test]
    fn relative_path_gets_exactly_one_slash() {
        let expected = "https://api.bsale.io/v1/products.json";
        let none = QueryParams::new();
        assert_eq!(build_url(BASE, "/products.json", &none), expected);
        assert_eq!(build_url(BASE, "products.json", &none), expected);
        assert_eq!(build_url("https://api.bsale.io/v1/", "products.json", &none), expected);
        assert_eq!(build_url("https://api.bsale.io/v1//", "//products.json", &none), expected);
    }

    #[test]
    fn absolute_path_is_kept_verbatim() {
        let next = "https://api.bsale.io/v1/products.json?limit=50&offset=50";
        assert_eq!(build_url(BASE, next, &QueryParams::new()), next);
        assert_eq!(
            build_url("http://other", "http://example.com/x", &QueryParams::new()),
            "http://example.com/x"
        );
    }

    #[test]
    fn absolute_path_with_query_appends_with_ampersand() {
        let next = "https://api.bsale.io/v1/products.json?limit=50&offset=50";
        let params = QueryParams::new().with("expand", "variants");
        assert_eq!(build_url(BASE, next, &params), format!("{next}&expand=variants"));
    }

    #[test]
    fn null_and_absent_params_are_omitted() {
        let params = QueryParams::new()
            .with("a", 1)
            .with("b", None::<i64>)
            .with("c", QueryValue::Null);
        assert_eq!(
            build_url(BASE, "/products.json", &params),
            "https://api.bsale.io/v1/products.json?a=1"
        );
    }

    #[test]
    fn all_null_params_add_no_query_string() {
        let params = QueryParams::new().with("b", QueryValue::Null);
        assert_eq!(
            build_url(BASE, "/products.json", &params),
            "https://api.bsale.io/v1/products.json"
        );
    }

    #[test]
    fn values_are_string_coerced_and_form_encoded() {
        let params = QueryParams::new()
            .with("limit", 10)
            .with("state", 0)
            .with("active", true)
            .with("price", 1.5)
            .with("name", "red shoe&co");
        assert_eq!(
            build_url(BASE, "/products.json", &params),
            "https://api.bsale.io/v1/products.json?limit=10&state=0&active=true&price=1.5&name=red+shoe%26co"
        );
    }

    #[test]
    fn build_is_deterministic() {
        let params: QueryParams = [("x", QueryValue::from(1)), ("y", QueryValue::text("z"))].into();
        assert_eq!(
            build_url(BASE, "/a.json", &params),
            build_url(BASE, "/a.json", &params)
        );
    }

    #[test]
    fn set_replaces_existing_key_in_place() {
        let mut params = QueryParams::new().with("limit", 5).with("state", 0);
        params.set("limit", 50);
        params.set("offset", 100);
        assert_eq!(params.get("limit"), Some(&QueryValue::Integer(50)));
        let keys: Vec<&str> = params.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["limit", "state", "offset"]);
    }

    #[test]
    fn resource_segment_from_paths() {
        assert_eq!(resource_segment(BASE, "/products/5.json"), Some("products"));
        assert_eq!(resource_segment(BASE, "clients.json"), Some("clients"));
        assert_eq!(
            resource_segment(BASE, "/price_lists/3/details.json"),
            Some("price_lists")
        );
        assert_eq!(
            resource_segment(BASE, "https://api.bsale.io/v1/documents.json?limit=2"),
            Some("documents")
        );
        assert_eq!(
            resource_segment(BASE, "https://example.com/stocks.json"),
            Some("stocks")
        );
        assert_eq!(resource_segment(BASE, "/123.json"), Some("json"));
        assert_eq!(resource_segment(BASE, "/123"), None);
    }
}
