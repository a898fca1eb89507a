//! Core protocol types for courier.
//!
//! This crate provides the types shared by the server transport
//! (`courier-axum`) and the client (`courier-client`):
//!
//! - [`error`]: the closed error-code enumeration and [`ApiError`]
//! - [`envelope`]: the `{error, result}` wire envelope
//! - [`format`]: the payload format contract and format registry

mod envelope;
mod error;
mod format;

pub use envelope::*;
pub use error::*;
pub use format::*;
