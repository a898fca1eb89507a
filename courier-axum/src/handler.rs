//! Per-request lifecycle for the RPC path.
//!
//! parsing → resolution → format negotiation → body buffering → scoped
//! execution → response writing → teardown. Resource acquisition happens
//! only after negotiation and resolution succeed, and release is tied to a
//! drop guard so it runs on every exit path, including the handler future
//! being dropped when the client disconnects.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;

use courier_core::{ApiError, Envelope, Format};

use crate::connection::{Connection, ConnectionDescriptor, ConnectionRegistry, TransportKind};
use crate::context::RequestContext;
use crate::dispatch::{DispatchError, ResolveError, RpcCall};
use crate::negotiate::negotiate;
use crate::scope::{ConnectionData, ResponseHeaders, Scope, ScopeKind};
use crate::server::TransportState;

/// `GET /healthy` readiness probe.
pub(crate) async fn healthy() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "OK")
}

/// `POST /api/{service}/{procedure}`.
pub(crate) async fn rpc(
    State(state): State<Arc<TransportState>>,
    Path((service, procedure)): Path<(String, String)>,
    req: Request<Body>,
) -> Response {
    let (parts, body) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);

    // No agreed encoder means no format to write an envelope in, so a
    // negotiation failure stays a bare transport failure.
    let negotiated = match negotiate(&ctx, &state.app.formats) {
        Ok(negotiated) => negotiated,
        Err(err) => {
            tracing::error!(error = %err, %service, %procedure, "format negotiation failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Resolution runs before any resource acquisition; failures are
    // classified so clients can tell an unknown service from a transport
    // fault.
    if let Err(err) = state
        .app
        .registry
        .resolve(&service, &procedure, TransportKind::Http)
    {
        return write_envelope(
            negotiated.encoder.as_ref(),
            &Envelope::failure(resolution_error(err, &service, &procedure)),
            HeaderMap::new(),
        );
    }

    // Buffer the body eagerly, rejecting as soon as the accumulated length
    // exceeds the configured bound.
    let body = match axum::body::to_bytes(body, state.options.max_payload_length).await {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, %service, %procedure, "failed to read request body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let payload = if body.is_empty() {
        None
    } else {
        match negotiated.decoder.decode(&body) {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::error!(error = %err, %service, %procedure, "failed to decode payload");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    };

    // An embedder may install a token wired to the connection's close
    // notification; otherwise the request gets a fresh one.
    let abort = parts
        .extensions
        .get::<CancellationToken>()
        .cloned()
        .unwrap_or_default();

    let connection = state.app.connections.add(ConnectionDescriptor {
        services: [service.clone()].into_iter().collect(),
        transport: TransportKind::Http,
    });
    let scope = state.app.scopes.create_scope(ScopeKind::Call);
    let guard = CleanupGuard::new(
        connection.clone(),
        scope.clone(),
        state.app.connections.clone(),
        abort.clone(),
    );

    let response_headers = ResponseHeaders::new();
    scope.provide(Box::new(connection_data(&ctx, &parts, response_headers.clone())));
    scope.provide(Box::new(connection.clone()));

    let outcome = state
        .app
        .dispatcher
        .call(RpcCall {
            connection,
            service: service.clone(),
            procedure: procedure.clone(),
            scope,
            signal: abort.clone(),
            payload,
            transport: TransportKind::Http,
        })
        .await;

    // Writing after the underlying connection is gone is the transport's
    // problem to avoid, not the dispatcher's.
    if abort.is_cancelled() {
        tracing::debug!(%service, %procedure, "connection aborted, skipping response write");
        drop(guard);
        return StatusCode::OK.into_response();
    }

    let envelope = match outcome {
        Ok(result) => Envelope::success(result),
        Err(DispatchError::Api(err)) => Envelope::failure(err),
        Err(DispatchError::Other(err)) => {
            tracing::error!(
                error = ?err,
                %service,
                %procedure,
                "unknown error while processing request"
            );
            Envelope::failure(ApiError::internal())
        }
    };

    let response = write_envelope(
        negotiated.encoder.as_ref(),
        &envelope,
        response_headers.snapshot(),
    );
    drop(guard);
    response
}

/// Maps a resolution failure onto the classified envelope path.
fn resolution_error(err: ResolveError, service: &str, procedure: &str) -> ApiError {
    match err {
        ResolveError::ServiceNotFound => {
            ApiError::not_found(format!("Service {service} not found"))
        }
        ResolveError::TransportNotSupported => {
            ApiError::not_found(format!("Service {service} does not support HTTP"))
        }
        ResolveError::ProcedureNotFound => {
            ApiError::not_found(format!("Procedure {service}/{procedure} not found"))
        }
    }
}

/// Encode one envelope into an HTTP 200 response, merging headers the
/// dispatcher accumulated in the scope.
fn write_envelope(encoder: &dyn Format, envelope: &Envelope, extra: HeaderMap) -> Response {
    let body = match encoder.encode_envelope(envelope) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode response envelope");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoder.content_type())
        .body(Body::from(body))
        // infallible: status and header are statically valid
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());

    for (name, value) in extra.iter() {
        response.headers_mut().insert(name, value.clone());
    }
    response
}

fn connection_data(
    ctx: &RequestContext,
    parts: &Parts,
    response_headers: ResponseHeaders,
) -> ConnectionData {
    let remote_address = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_default();
    let proxied_remote_address = ctx
        .header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    ConnectionData {
        headers: ctx.headers().clone(),
        query: ctx.query.clone(),
        remote_address,
        proxied_remote_address,
        response_headers,
    }
}

/// Guaranteed teardown: removes the connection entry, disposes the scope
/// and cancels the abort token, exactly once. Running inside `Drop` covers
/// every exit path, including the handler future being dropped when the
/// client disconnects mid-dispatch.
struct CleanupGuard {
    connection: Option<Arc<Connection>>,
    scope: Option<Arc<dyn Scope>>,
    registry: Arc<dyn ConnectionRegistry>,
    abort: CancellationToken,
}

impl CleanupGuard {
    fn new(
        connection: Arc<Connection>,
        scope: Arc<dyn Scope>,
        registry: Arc<dyn ConnectionRegistry>,
        abort: CancellationToken,
    ) -> Self {
        Self {
            connection: Some(connection),
            scope: Some(scope),
            registry,
            abort,
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.registry.remove(&connection);
        }
        if let Some(scope) = self.scope.take() {
            scope.dispose();
        }
        self.abort.cancel();
    }
}
