//! Error codes and the classified application error type.
//!
//! This module provides the two error types that travel on the wire:
//! - [`ErrorCode`]: the closed enumeration shared by server and client
//! - [`ApiError`]: a classified error with code, message and optional data

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transport-agnostic error codes shared by server and client.
///
/// The set is closed: dispatchers classify failures into one of these codes,
/// and everything unrecognized collapses to [`InternalServerError`]
/// (`ErrorCode::InternalServerError`) at the transport boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RequestTimeout,
    PayloadTooLarge,
    ValidationError,
    ServiceUnavailable,
    GatewayTimeout,
    InternalServerError,
}

impl ErrorCode {
    /// Get the string representation of this code, as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BadRequest",
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::Forbidden => "Forbidden",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::RequestTimeout => "RequestTimeout",
            ErrorCode::PayloadTooLarge => "PayloadTooLarge",
            ErrorCode::ValidationError => "ValidationError",
            ErrorCode::ServiceUnavailable => "ServiceUnavailable",
            ErrorCode::GatewayTimeout => "GatewayTimeout",
            ErrorCode::InternalServerError => "InternalServerError",
        }
    }
}

/// Error returned when parsing an [`ErrorCode`] from a string fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseCodeError(());

impl std::fmt::Display for ParseCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown error code")
    }
}

impl std::error::Error for ParseCodeError {}

impl FromStr for ErrorCode {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BadRequest" => Ok(ErrorCode::BadRequest),
            "Unauthorized" => Ok(ErrorCode::Unauthorized),
            "Forbidden" => Ok(ErrorCode::Forbidden),
            "NotFound" => Ok(ErrorCode::NotFound),
            "RequestTimeout" => Ok(ErrorCode::RequestTimeout),
            "PayloadTooLarge" => Ok(ErrorCode::PayloadTooLarge),
            "ValidationError" => Ok(ErrorCode::ValidationError),
            "ServiceUnavailable" => Ok(ErrorCode::ServiceUnavailable),
            "GatewayTimeout" => Ok(ErrorCode::GatewayTimeout),
            "InternalServerError" => Ok(ErrorCode::InternalServerError),
            _ => Err(ParseCodeError(())),
        }
    }
}

/// A classified application-level error.
///
/// This is what travels in the envelope's `error` slot. Dispatch logic raises
/// it directly; the transport propagates it verbatim to the client.
///
/// # Example
///
/// ```
/// use courier_core::{ApiError, ErrorCode};
///
/// let err = ApiError::not_found("user not found");
/// assert_eq!(err.code, ErrorCode::NotFound);
///
/// let err = err.with_data(serde_json::json!({"id": 42}));
/// assert!(err.data.is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new error with a code and message.
    pub fn new<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to this error.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    // Convenience constructors, default messages matching the code.

    /// Create a bad request error.
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a forbidden error.
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a request timeout error.
    pub fn request_timeout<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorCode::RequestTimeout, message)
    }

    /// Create an internal server error with a fixed generic message.
    ///
    /// Used by the transport when an unclassified error escapes dispatch;
    /// the original message never reaches the wire.
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalServerError, "Internal Server Error")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}
