//! Logical connections and the connection registry collaborator.
//!
//! The transport adds one connection per request and removes it on
//! completion. Invariant: no connection entry outlives its originating
//! request.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Transport kinds a service may declare support for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Http,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Http => "http",
        }
    }
}

/// What the transport knows about a connection when registering it.
#[derive(Clone, Debug)]
pub struct ConnectionDescriptor {
    pub services: HashSet<String>,
    pub transport: TransportKind,
}

/// A registered logical connection.
#[derive(Debug)]
pub struct Connection {
    pub id: u64,
    pub services: HashSet<String>,
    pub transport: TransportKind,
    /// Subscription state keyed by topic. Always empty for HTTP connections;
    /// present so the connection shape matches long-lived transports.
    pub subscriptions: Mutex<HashMap<String, serde_json::Value>>,
}

/// Tracks active logical connections. Externally synchronized; the
/// transport calls `add` before dispatch and `remove` on every exit path.
pub trait ConnectionRegistry: Send + Sync {
    fn add(&self, descriptor: ConnectionDescriptor) -> Arc<Connection>;
    fn remove(&self, connection: &Connection);
}

/// Registry keeping connections in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryConnectionRegistry {
    next_id: AtomicU64,
    connections: Mutex<HashMap<u64, Arc<Connection>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently registered connections.
    pub fn len(&self) -> usize {
        self.connections.lock().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConnectionRegistry for InMemoryConnectionRegistry {
    fn add(&self, descriptor: ConnectionDescriptor) -> Arc<Connection> {
        let connection = Arc::new(Connection {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            services: descriptor.services,
            transport: descriptor.transport,
            subscriptions: Mutex::new(HashMap::new()),
        });
        self.connections
            .lock()
            .expect("registry lock poisoned")
            .insert(connection.id, connection.clone());
        connection
    }

    fn remove(&self, connection: &Connection) {
        self.connections
            .lock()
            .expect("registry lock poisoned")
            .remove(&connection.id);
    }
}
