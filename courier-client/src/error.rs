//! Client-side error type.

use courier_core::{ApiError, FormatError};

/// Errors surfaced by [`HttpClient`](crate::HttpClient) operations.
///
/// `Api` carries classified errors decoded from the envelope as well as
/// non-2xx HTTP responses (which are always classified as
/// `InternalServerError` with the status attached as data).
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// A classified error from the server.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Transport-level error (connection failed, malformed request, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// Payload encoding error.
    #[error("encode error: {0}")]
    Encode(String),

    /// Envelope decoding error.
    #[error("decode error: {0}")]
    Decode(String),

    /// The caller's cancellation signal fired before completion.
    #[error("request canceled")]
    Canceled,

    /// The per-call timeout elapsed.
    #[error("request timed out")]
    TimedOut,
}

impl ClientError {
    /// The classified error, when this is an `Api` failure.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FormatError> for ClientError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::Encode(msg) => ClientError::Encode(msg),
            FormatError::Decode(msg) => ClientError::Decode(msg),
        }
    }
}
