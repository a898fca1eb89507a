//! Minimal transport wiring: an echo service with in-memory collaborators.
//!
//! ```sh
//! cargo run --example echo
//! curl -s -X POST 'http://127.0.0.1:4000/api/echo/say' \
//!   -H 'Content-Type: application/json' -H 'Accept: application/json' \
//!   -d '{"text": "hi"}'
//! ```

use std::any::Any;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use courier_axum::core::{FormatRegistry, JsonFormat};
use courier_axum::{
    Application, DispatchError, Dispatcher, HttpTransportOptions, InMemoryConnectionRegistry,
    RpcCall, Scope, ScopeKind, ScopeProvider, StaticServiceRegistry, TransportKind,
    TransportServer,
};

struct NoopScope;

impl Scope for NoopScope {
    fn provide(&self, _value: Box<dyn Any + Send + Sync>) {}
    fn dispose(&self) {}
}

struct NoopScopeProvider;

impl ScopeProvider for NoopScopeProvider {
    fn create_scope(&self, _kind: ScopeKind) -> Arc<dyn Scope> {
        Arc::new(NoopScope)
    }
}

struct EchoDispatcher;

impl Dispatcher for EchoDispatcher {
    fn call(&self, call: RpcCall) -> BoxFuture<'static, Result<Value, DispatchError>> {
        Box::pin(async move { Ok(json!({"echo": call.payload})) })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let app = Application {
        registry: Arc::new(StaticServiceRegistry::new().service(
            "echo",
            [TransportKind::Http],
            ["say"],
        )),
        dispatcher: Arc::new(EchoDispatcher),
        connections: Arc::new(InMemoryConnectionRegistry::new()),
        scopes: Arc::new(NoopScopeProvider),
        formats: FormatRegistry::new().register(JsonFormat),
    };

    let server = TransportServer::new(app, HttpTransportOptions::new(4000));
    server.start().await
}
