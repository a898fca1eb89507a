//! Cross-origin policy.
//!
//! Applied identically to the preflight (`OPTIONS`) path, the health
//! endpoint and the RPC path, as a middleware wrapping the whole router.
//! When the request has no `Origin` header, no CORS headers are emitted.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::server::TransportState;

/// Which origins receive cross-origin headers.
#[derive(Clone, Debug)]
pub enum AllowedOrigins {
    /// Reflect any request origin back. The legacy policy.
    Reflect,
    /// Reflect only origins on this list.
    List(Vec<String>),
}

/// Cross-origin configuration.
///
/// The default reproduces the legacy fixed policy: reflect the request
/// origin, allow `Content-Type`, allow `GET, POST`, allow credentials.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: AllowedOrigins,
    pub allowed_headers: String,
    pub allowed_methods: String,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Reflect,
            allowed_headers: "Content-Type".to_string(),
            allowed_methods: "GET, POST".to_string(),
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    /// Write this policy into `headers` for a request from `origin`.
    /// Does nothing when the request carried no `Origin` header or the
    /// origin is not allowed.
    pub fn apply(&self, origin: Option<&str>, headers: &mut HeaderMap) {
        let Some(origin) = origin else { return };

        let allowed = match &self.allowed_origins {
            AllowedOrigins::Reflect => true,
            AllowedOrigins::List(list) => list.iter().any(|o| o == origin),
        };
        if !allowed {
            return;
        }
        let Ok(origin) = HeaderValue::from_str(origin) else {
            return;
        };

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        if let Ok(value) = HeaderValue::from_str(&self.allowed_headers) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.allowed_methods) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
        }
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }
}

/// Router-wide middleware: answers preflight requests directly and stamps
/// the policy onto every other response.
pub(crate) async fn middleware(
    State(state): State<Arc<TransportState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        state
            .options
            .cors
            .apply(origin.as_deref(), response.headers_mut());
        return response;
    }

    let mut response = next.run(req).await;
    state
        .options
        .cors
        .apply(origin.as_deref(), response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_origin_no_headers() {
        let mut headers = HeaderMap::new();
        CorsConfig::default().apply(None, &mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_reflects_origin() {
        let mut headers = HeaderMap::new();
        CorsConfig::default().apply(Some("https://x.test"), &mut headers);

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://x.test"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "Content-Type"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET, POST"
        );
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[test]
    fn test_allow_list() {
        let config = CorsConfig {
            allowed_origins: AllowedOrigins::List(vec!["https://ok.test".to_string()]),
            ..Default::default()
        };

        let mut headers = HeaderMap::new();
        config.apply(Some("https://ok.test"), &mut headers);
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let mut headers = HeaderMap::new();
        config.apply(Some("https://evil.test"), &mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_credentials_can_be_disabled() {
        let config = CorsConfig {
            allow_credentials: false,
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        config.apply(Some("https://x.test"), &mut headers);
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }
}
