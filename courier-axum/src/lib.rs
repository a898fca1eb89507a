//! # courier-axum
//!
//! HTTP transport binding for the courier RPC framework, built on
//! [axum](https://github.com/tokio-rs/axum).
//!
//! The transport accepts `POST /api/{service}/{procedure}` requests,
//! negotiates a wire format from the request headers, dispatches into an
//! externally-owned [`Dispatcher`](dispatch::Dispatcher), and writes back a
//! single `{error, result}` envelope. Service resolution, per-call resource
//! scopes and connection tracking are collaborator traits the embedding
//! framework implements.
//!
//! ```ignore
//! use courier_axum::{Application, HttpTransportOptions, TransportServer};
//!
//! let server = TransportServer::new(app, HttpTransportOptions::new(4000));
//! server.start().await?;
//! ```

pub mod connection;
pub mod context;
pub mod cors;
pub mod dispatch;
mod handler;
pub mod negotiate;
pub mod scope;
pub mod server;

pub use connection::{
    Connection, ConnectionDescriptor, ConnectionRegistry, InMemoryConnectionRegistry,
    TransportKind,
};
pub use context::RequestContext;
pub use cors::{AllowedOrigins, CorsConfig};
pub use dispatch::{
    DispatchError, Dispatcher, ResolveError, RpcCall, ServiceRegistry, StaticServiceRegistry,
};
pub use negotiate::{negotiate, Negotiated, NegotiationError};
pub use scope::{ConnectionData, ResponseHeaders, Scope, ScopeKind, ScopeProvider};
pub use server::{Application, HttpTransportOptions, TransportServer};

// Re-export the shared protocol types.
pub use courier_core as core;
