//! Immutable per-request snapshot of the raw HTTP request.

use std::collections::HashMap;

use axum::http::request::Parts;
use axum::http::Method;

/// Read-only view of an inbound request, built once before any other
/// processing.
///
/// Header keys are lower-cased; the query string is kept as an ordered
/// multimap so repeated parameters survive extraction.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub url: String,
    pub method: Method,
    headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    /// Present only when the request carried an `Origin` header; absence
    /// means the request is not treated as cross-origin.
    pub origin: Option<String>,
}

impl RequestContext {
    /// Extract a context from request parts. Pure; never fails on a
    /// syntactically valid request (non-UTF-8 header values are skipped,
    /// an unparsable query string yields an empty multimap).
    pub fn from_parts(parts: &Parts) -> Self {
        let mut headers = HashMap::new();
        for (name, value) in parts.headers.iter() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }

        let query: Vec<(String, String)> = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();

        let origin = headers.get("origin").cloned();

        Self {
            url: parts.uri.path().to_string(),
            method: parts.method.clone(),
            headers,
            query,
            origin,
        }
    }

    /// Look up a header by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up the first query parameter with the given name.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All request headers, keyed by lower-cased name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}
