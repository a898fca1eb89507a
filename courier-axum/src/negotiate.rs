//! Wire-format negotiation.
//!
//! The request body decoder is selected by the `content-type` header,
//! falling back to the `content-type` query parameter; the response encoder
//! by `accept`, falling back to the `accept` query parameter. The two
//! lookups are independent and there is no default: a missing or
//! unsupported token fails the request.

use std::sync::Arc;

use courier_core::{Format, FormatRegistry};

use crate::context::RequestContext;

/// The encoder/decoder pair selected for one request.
pub struct Negotiated {
    /// Encodes the response envelope.
    pub encoder: Arc<dyn Format>,
    /// Decodes the request body.
    pub decoder: Arc<dyn Format>,
}

impl std::fmt::Debug for Negotiated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiated")
            .field("encoder", &self.encoder.content_type())
            .field("decoder", &self.decoder.content_type())
            .finish()
    }
}

/// Negotiation failure. Surfaced as a bare transport failure (HTTP 500):
/// without an agreed encoder there is no format to write an envelope in.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("missing content-type")]
    MissingContentType,

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("missing accept")]
    MissingAccept,

    #[error("unsupported accept: {0}")]
    UnsupportedAccept(String),
}

/// Select the format pair for a request.
pub fn negotiate(
    ctx: &RequestContext,
    formats: &FormatRegistry,
) -> Result<Negotiated, NegotiationError> {
    let content_type = ctx
        .header("content-type")
        .or_else(|| ctx.query_value("content-type"))
        .ok_or(NegotiationError::MissingContentType)?;
    let decoder = formats
        .supports_decoder(content_type)
        .ok_or_else(|| NegotiationError::UnsupportedContentType(content_type.to_string()))?;

    let accept = ctx
        .header("accept")
        .or_else(|| ctx.query_value("accept"))
        .ok_or(NegotiationError::MissingAccept)?;
    let encoder = formats
        .supports_encoder(accept)
        .ok_or_else(|| NegotiationError::UnsupportedAccept(accept.to_string()))?;

    Ok(Negotiated { encoder, decoder })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use courier_core::JsonFormat;

    fn registry() -> FormatRegistry {
        FormatRegistry::new().register(JsonFormat)
    }

    fn ctx(uri: &str, headers: &[(&str, &str)]) -> RequestContext {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(Body::empty()).unwrap();
        RequestContext::from_parts(&req.into_parts().0)
    }

    #[test]
    fn test_headers_select_both_formats() {
        let ctx = ctx(
            "/api/a/b",
            &[
                ("content-type", "application/json"),
                ("accept", "application/json"),
            ],
        );
        let negotiated = negotiate(&ctx, &registry()).unwrap();
        assert_eq!(negotiated.encoder.content_type(), "application/json");
        assert_eq!(negotiated.decoder.content_type(), "application/json");
    }

    #[test]
    fn test_query_fallback() {
        let ctx = ctx(
            "/api/a/b?content-type=application/json&accept=application/json",
            &[],
        );
        assert!(negotiate(&ctx, &registry()).is_ok());
    }

    #[test]
    fn test_header_wins_over_query() {
        let ctx = ctx(
            "/api/a/b?content-type=application/json&accept=application/json",
            &[("content-type", "text/html")],
        );
        assert_eq!(
            negotiate(&ctx, &registry()).unwrap_err(),
            NegotiationError::UnsupportedContentType("text/html".to_string())
        );
    }

    #[test]
    fn test_missing_content_type() {
        let ctx = ctx("/api/a/b", &[("accept", "application/json")]);
        assert_eq!(
            negotiate(&ctx, &registry()).unwrap_err(),
            NegotiationError::MissingContentType
        );
    }

    #[test]
    fn test_missing_accept() {
        let ctx = ctx("/api/a/b", &[("content-type", "application/json")]);
        assert_eq!(
            negotiate(&ctx, &registry()).unwrap_err(),
            NegotiationError::MissingAccept
        );
    }

    #[test]
    fn test_lookups_are_independent() {
        let ctx = ctx(
            "/api/a/b",
            &[
                ("content-type", "application/json"),
                ("accept", "application/octet-stream"),
            ],
        );
        assert_eq!(
            negotiate(&ctx, &registry()).unwrap_err(),
            NegotiationError::UnsupportedAccept("application/octet-stream".to_string())
        );
    }
}
