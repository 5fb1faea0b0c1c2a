/*
 * Responsibility
 * - The read-only view of an inbound request that the extractors consume
 * - header / query / cookie accessors only (no body, no method routing)
 * - Implemented for `http::Request<B>`, `http::request::Parts` and `TestRequest`
 */
use axum::http::{HeaderMap, Request, Uri, header, request::Parts};

/// Accessors the token extractors need from an inbound request.
pub trait InboundRequest: Send + Sync {
    /// First value of the named header, if it is valid visible ASCII.
    fn header(&self, name: &str) -> Option<&str>;

    /// First percent-decoded value of the named query parameter.
    fn query_param(&self, name: &str) -> Option<String>;

    /// Value of the named cookie.
    fn cookie(&self, name: &str) -> Option<String>;

    /// Request path, used for log correlation only.
    fn path(&self) -> &str;
}

fn header_from<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn query_from(uri: &Uri, name: &str) -> Option<String> {
    find_query_param(uri.query()?, name)
}

fn cookie_from(headers: &HeaderMap, name: &str) -> Option<String> {
    // Several `Cookie` headers are legal on HTTP/2; search all of them.
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| find_cookie(raw, name))
}

pub(crate) fn find_query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub(crate) fn find_cookie(raw: &str, name: &str) -> Option<String> {
    raw.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k.trim() != name {
            return None;
        }
        // RFC 6265 allows the value to be wrapped in double quotes.
        let v = v.trim();
        let v = v
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(v);
        Some(v.to_string())
    })
}

impl<B: Send + Sync> InboundRequest for Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        header_from(self.headers(), name)
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_from(self.uri(), name)
    }

    fn cookie(&self, name: &str) -> Option<String> {
        cookie_from(self.headers(), name)
    }

    fn path(&self) -> &str {
        self.uri().path()
    }
}

impl InboundRequest for Parts {
    fn header(&self, name: &str) -> Option<&str> {
        header_from(&self.headers, name)
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_from(&self.uri, name)
    }

    fn cookie(&self, name: &str) -> Option<String> {
        cookie_from(&self.headers, name)
    }

    fn path(&self) -> &str {
        self.uri.path()
    }
}

/// In-memory request for callers outside an HTTP stack (and for tests).
///
/// ```
/// use bearer_guard::services::auth::{InboundRequest, TestRequest};
///
/// let req = TestRequest::new("/api/v1/secured")
///     .with_header("Authorization", "Bearer abc")
///     .with_query("bearer", "def");
/// assert_eq!(req.header("authorization"), Some("Bearer abc"));
/// assert_eq!(req.query_param("bearer").as_deref(), Some("def"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestRequest {
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
}

impl TestRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }
}

impl InboundRequest for TestRequest {
    fn header(&self, name: &str) -> Option<&str> {
        // Header names are case-insensitive, as on the wire.
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn path(&self) -> &str {
        &self.path
    }
}
