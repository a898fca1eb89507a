//! # courier-client
//!
//! HTTP client for the courier RPC framework.
//!
//! Mirrors the server's transport contract: payloads are encoded with a
//! [`Format`](courier_core::Format), posted to `api/{service}/{procedure}`,
//! and 2xx responses are decoded as the shared `{error, result}` envelope.
//! Non-2xx responses are classified as transport-level internal errors and
//! never parsed as envelopes. [`HttpClient::health_check`] provides a
//! retrying readiness probe for connection establishment; `rpc` itself is
//! never retried by the client.

mod client;
mod error;
mod transport;

pub use client::{HttpClient, HttpClientOptions, RpcOptions};
pub use error::ClientError;
pub use transport::HttpTransport;

// Re-export the shared protocol types.
pub use courier_core as core;
