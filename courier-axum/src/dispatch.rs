//! Collaborator contracts for RPC resolution and execution.
//!
//! The transport owns neither the service registry nor the dispatcher; it
//! resolves `(service, procedure)` pairs through [`ServiceRegistry`] and
//! hands execution to [`Dispatcher`]. Both are object-safe seams so the
//! framework wires its own implementations in.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use courier_core::ApiError;

use crate::connection::{Connection, TransportKind};
use crate::scope::Scope;

/// Everything a dispatcher needs to run one procedure call.
pub struct RpcCall {
    pub connection: Arc<Connection>,
    pub service: String,
    pub procedure: String,
    /// The per-call resource scope; already seeded with
    /// [`ConnectionData`](crate::scope::ConnectionData) and the connection.
    pub scope: Arc<dyn Scope>,
    /// Cancelled when the underlying connection goes away or the request is
    /// torn down; in-flight work should observe it.
    pub signal: CancellationToken,
    /// Decoded request payload; `None` when the request body was empty.
    pub payload: Option<Value>,
    pub transport: TransportKind,
}

/// Dispatch failure, split by whether the error is part of the protocol.
///
/// `Api` errors travel verbatim in the envelope. Anything else is logged at
/// the transport boundary and collapsed to a generic internal error; the
/// original message never reaches the client.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Executes resolved procedure calls. Externally owned and synchronized.
pub trait Dispatcher: Send + Sync {
    fn call(&self, call: RpcCall) -> BoxFuture<'static, Result<Value, DispatchError>>;
}

/// Resolution failure, checked before any resource acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("service not found")]
    ServiceNotFound,

    #[error("transport not supported")]
    TransportNotSupported,

    #[error("procedure not found")]
    ProcedureNotFound,
}

/// Resolves `(service, procedure, transport)` triples. Externally owned.
pub trait ServiceRegistry: Send + Sync {
    fn resolve(
        &self,
        service: &str,
        procedure: &str,
        transport: TransportKind,
    ) -> Result<(), ResolveError>;
}

/// A fixed service table, convenient for embedding and tests.
#[derive(Debug, Default)]
pub struct StaticServiceRegistry {
    services: HashMap<String, ServiceEntry>,
}

#[derive(Debug)]
struct ServiceEntry {
    transports: HashSet<TransportKind>,
    procedures: HashSet<String>,
}

impl StaticServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service with the transports it supports and its
    /// procedure names.
    pub fn service<S: Into<String>>(
        mut self,
        name: S,
        transports: impl IntoIterator<Item = TransportKind>,
        procedures: impl IntoIterator<Item = S>,
    ) -> Self {
        self.services.insert(
            name.into(),
            ServiceEntry {
                transports: transports.into_iter().collect(),
                procedures: procedures.into_iter().map(Into::into).collect(),
            },
        );
        self
    }
}

impl ServiceRegistry for StaticServiceRegistry {
    fn resolve(
        &self,
        service: &str,
        procedure: &str,
        transport: TransportKind,
    ) -> Result<(), ResolveError> {
        let entry = self
            .services
            .get(service)
            .ok_or(ResolveError::ServiceNotFound)?;
        if !entry.transports.contains(&transport) {
            return Err(ResolveError::TransportNotSupported);
        }
        if !entry.procedures.contains(procedure) {
            return Err(ResolveError::ProcedureNotFound);
        }
        Ok(())
    }
}
