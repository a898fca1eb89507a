//! Payload format contract and the format registry.
//!
//! A [`Format`] knows how to encode and decode opaque payload values and the
//! response [`Envelope`] for one content type. The [`FormatRegistry`] holds
//! the supported formats keyed by their content-type token; the server
//! resolves an encoder and a decoder from it on every request.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::Envelope;

/// Encoding or decoding failure inside a format implementation.
#[derive(Clone, Debug, thiserror::Error)]
pub enum FormatError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// A wire format for one content type.
///
/// Payload values are opaque to the transport; the format is the only party
/// that understands their byte representation. Implementations must be cheap
/// to call repeatedly: the registry hands out shared references and formats
/// are resolved anew on every request.
pub trait Format: Send + Sync + 'static {
    /// The content-type token this format is registered under, also used for
    /// the `Content-Type` header of encoded responses.
    fn content_type(&self) -> &'static str;

    /// Encode an opaque payload value.
    fn encode(&self, value: &Value) -> Result<Bytes, FormatError>;

    /// Decode an opaque payload value.
    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError>;

    /// Encode a response envelope.
    fn encode_envelope(&self, envelope: &Envelope) -> Result<Bytes, FormatError>;

    /// Decode a response envelope.
    fn decode_envelope(&self, bytes: &[u8]) -> Result<Envelope, FormatError>;
}

/// JSON wire format backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, value: &Value) -> Result<Bytes, FormatError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| FormatError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError> {
        serde_json::from_slice(bytes).map_err(|e| FormatError::Decode(e.to_string()))
    }

    fn encode_envelope(&self, envelope: &Envelope) -> Result<Bytes, FormatError> {
        serde_json::to_vec(envelope)
            .map(Bytes::from)
            .map_err(|e| FormatError::Encode(e.to_string()))
    }

    fn decode_envelope(&self, bytes: &[u8]) -> Result<Envelope, FormatError> {
        serde_json::from_slice(bytes).map_err(|e| FormatError::Decode(e.to_string()))
    }
}

/// Registry of supported formats, keyed by content-type token.
///
/// # Example
///
/// ```
/// use courier_core::{FormatRegistry, JsonFormat};
///
/// let registry = FormatRegistry::new().register(JsonFormat);
/// assert!(registry.supports_encoder("application/json").is_some());
/// assert!(registry.supports_decoder("application/protobuf").is_none());
/// ```
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<&'static str, Arc<dyn Format>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a format under its own content type.
    pub fn register<F: Format>(mut self, format: F) -> Self {
        self.formats.insert(format.content_type(), Arc::new(format));
        self
    }

    /// Resolve a format able to encode responses for `content_type`.
    pub fn supports_encoder(&self, content_type: &str) -> Option<Arc<dyn Format>> {
        self.lookup(content_type)
    }

    /// Resolve a format able to decode request bodies of `content_type`.
    pub fn supports_decoder(&self, content_type: &str) -> Option<Arc<dyn Format>> {
        self.lookup(content_type)
    }

    fn lookup(&self, content_type: &str) -> Option<Arc<dyn Format>> {
        // Tolerate content-type parameters like `; charset=utf-8`.
        let token = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim();
        self.formats.get(token).cloned()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .finish()
    }
}
