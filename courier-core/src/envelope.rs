//! The response envelope: the sole wire contract between server and client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ApiError;

/// A response envelope carrying either a result or a classified error.
///
/// Exactly one of the two slots is populated on the wire. The transport
/// writes it on every dispatched request with HTTP status 200; the HTTP
/// status line is reserved for transport-level failures.
///
/// # Example
///
/// ```
/// use courier_core::{ApiError, Envelope};
///
/// let ok = Envelope::success(serde_json::json!({"greeting": "hi"}));
/// assert!(ok.error.is_none());
///
/// let failed = Envelope::failure(ApiError::not_found("unknown user"));
/// assert!(failed.result.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub error: Option<ApiError>,
    pub result: Option<Value>,
}

impl Envelope {
    /// Create a success envelope with a result value.
    pub fn success(result: Value) -> Self {
        Self {
            error: None,
            result: Some(result),
        }
    }

    /// Create a failure envelope with a classified error.
    pub fn failure(error: ApiError) -> Self {
        Self {
            error: Some(error),
            result: None,
        }
    }

    /// Collapse the envelope into a `Result`, the client-side view.
    ///
    /// A populated `error` wins; otherwise the result value is returned
    /// (`Value::Null` when the result slot is empty).
    pub fn into_result(self) -> Result<Value, ApiError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
