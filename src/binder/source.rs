use std::io::Read;
use tracing::debug;

/// The request side the binder reads from.
///
/// Header lookups are case-insensitive. Values come back in the order they
/// were sent; an absent key gives an empty list.
pub trait RequestSource {
    /// Request path without the query string.
    fn path(&self) -> &str;

    fn header_values(&self, name: &str) -> Vec<String>;

    fn query_values(&self, key: &str) -> Vec<String>;

    /// Raw body stream, `None` when the request carries no body.
    fn body(&mut self) -> Option<Box<dyn Read + '_>>;
}

/// Split `path?query` into its two halves.
fn split_path(path_with_query: &str) -> (&str, &str) {
    match path_with_query.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path_with_query, ""),
    }
}

/// Query pairs in order, URL-decoded.
pub fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn values_for(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .collect()
}

impl<B: AsRef<[u8]>> RequestSource for http::Request<B> {
    fn path(&self) -> &str {
        self.uri().path()
    }

    /// Values that are not valid UTF-8 are decoded lossily, never dropped.
    fn header_values(&self, name: &str) -> Vec<String> {
        self.headers()
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect()
    }

    fn query_values(&self, key: &str) -> Vec<String> {
        let pairs = parse_query_pairs(self.uri().query().unwrap_or_default());
        values_for(&pairs, key)
    }

    fn body(&mut self) -> Option<Box<dyn Read + '_>> {
        let bytes = http::Request::body(self).as_ref();
        if bytes.is_empty() {
            return None;
        }
        Some(Box::new(bytes))
    }
}

/// An owned, already parsed request.
///
/// Useful where the transport hands over raw parts rather than an
/// [`http::Request`], and in tests.
///
/// ```rust
/// use tagbind::{RequestParts, RequestSource};
///
/// let req = RequestParts::new("/users/7?fields=name&fields=email")
///     .header("X-Request-Id", "abc")
///     .body(r#"{"name":"rex"}"#);
/// assert_eq!(req.path(), "/users/7");
/// assert_eq!(req.query_values("fields"), ["name", "email"]);
/// assert_eq!(req.header_values("x-request-id"), ["abc"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParts {
    path: String,
    /// Header pairs, names lowercased
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestParts {
    /// Parse `path_with_query`; the query string is URL-decoded.
    pub fn new(path_with_query: &str) -> Self {
        let (path, query) = split_path(path_with_query);
        let query = parse_query_pairs(query);
        debug!(path = %path, param_count = query.len(), "Query params parsed");
        Self {
            path: path.to_string(),
            headers: Vec::new(),
            query,
            body: None,
        }
    }

    /// Append a header; repeated names keep every value.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl RequestSource for RequestParts {
    fn path(&self) -> &str {
        &self.path
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        values_for(&self.headers, &name.to_ascii_lowercase())
    }

    fn query_values(&self, key: &str) -> Vec<String> {
        values_for(&self.query, key)
    }

    fn body(&mut self) -> Option<Box<dyn Read + '_>> {
        self.body
            .as_deref()
            .map(|bytes| Box::new(bytes) as Box<dyn Read + '_>)
    }
}
