//! Per-call resource scopes and the values the transport injects into them.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Lifetime of a resource scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Connection,
    Call,
}

/// An isolated resource container created per call.
///
/// `provide` registers a value under its concrete type, the way the owning
/// dependency-injection container keys injectables. The transport provides
/// [`ConnectionData`] and the `Arc<Connection>` before dispatch; `dispose`
/// is called exactly once on every exit path.
pub trait Scope: Send + Sync {
    fn provide(&self, value: Box<dyn Any + Send + Sync>);
    fn dispose(&self);
}

/// Creates fresh scopes. Owned by the external DI container.
pub trait ScopeProvider: Send + Sync {
    fn create_scope(&self, kind: ScopeKind) -> Arc<dyn Scope>;
}

/// Response headers a dispatcher may accumulate during execution.
///
/// Shared mutable: the transport hands a clone to the scope and merges the
/// collected headers into the response before writing.
#[derive(Clone, Debug, Default)]
pub struct ResponseHeaders(Arc<Mutex<HeaderMap>>);

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: HeaderName, value: HeaderValue) {
        self.0
            .lock()
            .expect("response headers lock poisoned")
            .insert(name, value);
    }

    /// Copy of the accumulated headers.
    pub fn snapshot(&self) -> HeaderMap {
        self.0
            .lock()
            .expect("response headers lock poisoned")
            .clone()
    }
}

/// Request-derived snapshot injected into the call scope.
#[derive(Clone, Debug)]
pub struct ConnectionData {
    /// Request headers, keyed by lower-cased name.
    pub headers: HashMap<String, String>,
    /// Query string as an ordered multimap.
    pub query: Vec<(String, String)>,
    /// Peer address of the underlying socket, empty when unknown.
    pub remote_address: String,
    /// First hop of `x-forwarded-for`, when present.
    pub proxied_remote_address: Option<String>,
    /// Mutable outgoing-header collection.
    pub response_headers: ResponseHeaders,
}
