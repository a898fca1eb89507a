//! Transport server assembly: collaborator bundle, options and the
//! axum router/listener wrapper.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;

use courier_core::FormatRegistry;

use crate::connection::ConnectionRegistry;
use crate::cors::{self, CorsConfig};
use crate::dispatch::{Dispatcher, ServiceRegistry};
use crate::handler;
use crate::scope::ScopeProvider;

/// The externally-owned collaborators the transport dispatches into.
#[derive(Clone)]
pub struct Application {
    pub registry: Arc<dyn ServiceRegistry>,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub connections: Arc<dyn ConnectionRegistry>,
    pub scopes: Arc<dyn ScopeProvider>,
    pub formats: FormatRegistry,
}

/// Server options.
///
/// # Example
///
/// ```
/// use courier_axum::HttpTransportOptions;
///
/// let options = HttpTransportOptions::new(4000)
///     .hostname("0.0.0.0")
///     .max_payload_length(1024 * 1024);
/// ```
#[derive(Clone, Debug)]
pub struct HttpTransportOptions {
    pub hostname: String,
    pub port: u16,
    /// Upper bound on the buffered request body, enforced during
    /// accumulation.
    pub max_payload_length: usize,
    pub cors: CorsConfig,
}

impl HttpTransportOptions {
    pub fn new(port: u16) -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port,
            max_payload_length: 4 * 1024 * 1024,
            cors: CorsConfig::default(),
        }
    }

    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn max_payload_length(mut self, bytes: usize) -> Self {
        self.max_payload_length = bytes;
        self
    }

    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }
}

/// Shared state behind the router.
pub(crate) struct TransportState {
    pub(crate) app: Application,
    pub(crate) options: HttpTransportOptions,
}

/// The HTTP transport server.
///
/// [`router`](Self::router) exposes the axum router for embedding into an
/// existing application; [`start`](Self::start) binds a listener and serves
/// until [`stop`](Self::stop) is called.
pub struct TransportServer {
    state: Arc<TransportState>,
    shutdown: CancellationToken,
}

impl TransportServer {
    pub fn new(app: Application, options: HttpTransportOptions) -> Self {
        Self {
            state: Arc::new(TransportState { app, options }),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build the transport router: preflight everywhere, the health
    /// endpoint and the RPC path, all behind the CORS middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/healthy", get(handler::healthy))
            .route("/api/{service}/{procedure}", post(handler::rpc))
            .layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                cors::middleware,
            ))
            .with_state(self.state.clone())
    }

    /// Bind and serve. Resolves when [`stop`](Self::stop) is called or the
    /// listener fails.
    pub async fn start(&self) -> anyhow::Result<()> {
        let addr = format!(
            "{}:{}",
            self.state.options.hostname, self.state.options.port
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server started");

        let shutdown = self.shutdown.clone();
        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

        tracing::info!("server stopped");
        Ok(())
    }

    /// Trigger graceful shutdown.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}
