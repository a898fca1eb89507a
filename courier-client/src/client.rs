//! The RPC client: request building, envelope decoding and the readiness
//! probe loop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use courier_core::{ApiError, ErrorCode, Format, JsonFormat};

use crate::transport::HttpTransport;
use crate::ClientError;

/// Fixed per-attempt timeout for the health probe.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Cap on the health probe backoff, in seconds.
const MAX_BACKOFF_SECS: u32 = 15;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct HttpClientOptions {
    /// The origin of the server, e.g. `http://localhost:3000`.
    pub origin: String,
    /// Optional `Authorization` header value attached to every RPC.
    pub auth: Option<String>,
}

impl HttpClientOptions {
    pub fn new<S: Into<String>>(origin: S) -> Self {
        Self {
            origin: origin.into(),
            auth: None,
        }
    }

    pub fn auth<S: Into<String>>(mut self, auth: S) -> Self {
        self.auth = Some(auth.into());
        self
    }
}

/// Per-call options.
#[derive(Clone, Debug, Default)]
pub struct RpcOptions {
    /// Overall deadline for the call.
    pub timeout: Option<Duration>,
    /// Extra request headers.
    pub headers: http::HeaderMap,
    /// Caller-supplied cancellation signal.
    pub signal: Option<CancellationToken>,
}

/// HTTP client for a courier server.
///
/// `rpc` mirrors the server contract: it encodes the payload with the
/// configured format, posts to `api/{service}/{procedure}`, classifies
/// non-2xx responses as transport-level internal errors, and decodes 2xx
/// bodies as the `{error, result}` envelope.
///
/// # Example
///
/// ```ignore
/// use courier_client::{HttpClient, HttpClientOptions};
///
/// let client = HttpClient::new(HttpClientOptions::new("http://localhost:4000"));
/// client.health_check().await;
/// let result = client.rpc("users", "get", serde_json::json!({"id": 1})).await?;
/// ```
pub struct HttpClient {
    transport: HttpTransport,
    options: HttpClientOptions,
    format: Arc<dyn Format>,
    /// Health probe attempt counter. Monotone for the client's lifetime,
    /// never reset.
    attempts: AtomicU32,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("transport", &self.transport)
            .field("options", &self.options)
            .field("format", &self.format.content_type())
            .field("attempts", &self.attempts)
            .finish()
    }
}

impl HttpClient {
    /// Create a client using the JSON wire format.
    pub fn new(options: HttpClientOptions) -> Self {
        Self::with_format(options, Arc::new(JsonFormat))
    }

    /// Create a client with an explicit wire format.
    pub fn with_format(options: HttpClientOptions, format: Arc<dyn Format>) -> Self {
        Self {
            transport: HttpTransport::new(),
            options,
            format,
            attempts: AtomicU32::new(0),
        }
    }

    /// Call `service/procedure` with default per-call options.
    pub async fn rpc(
        &self,
        service: &str,
        procedure: &str,
        payload: Value,
    ) -> Result<Value, ClientError> {
        self.rpc_with(service, procedure, payload, RpcOptions::default())
            .await
    }

    /// Call `service/procedure` with explicit per-call options.
    pub async fn rpc_with(
        &self,
        service: &str,
        procedure: &str,
        payload: Value,
        options: RpcOptions,
    ) -> Result<Value, ClientError> {
        let RpcOptions {
            timeout: deadline,
            headers,
            signal,
        } = options;

        let url = self.url(&format!("api/{service}/{procedure}"));
        let body = self.format.encode(&payload)?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(url)
            .header(header::CONTENT_TYPE, self.format.content_type())
            .header(header::ACCEPT, self.format.content_type());
        if let Some(auth) = &self.options.auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        for (name, value) in headers.iter() {
            builder = builder.header(name, value.clone());
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| ClientError::Transport(format!("invalid request: {e}")))?;

        let call = self.send(request);
        let call = async {
            match deadline {
                Some(deadline) => timeout(deadline, call)
                    .await
                    .map_err(|_| ClientError::TimedOut)?,
                None => call.await,
            }
        };

        match signal {
            Some(signal) => {
                tokio::select! {
                    _ = signal.cancelled() => Err(ClientError::Canceled),
                    outcome = call => outcome,
                }
            }
            None => call.await,
        }
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<Value, ClientError> {
        let response = self.transport.request(request).await?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response: {e}")))?
            .to_bytes();

        // Non-2xx bodies are never parsed as envelopes.
        if !status.is_success() {
            return Err(ClientError::Api(classify_http_failure(status, &body)));
        }

        self.format
            .decode_envelope(&body)?
            .into_result()
            .map_err(ClientError::Api)
    }

    /// Block until the server answers its readiness probe.
    ///
    /// Each attempt is a `GET {origin}healthy` with a fixed 10 second
    /// timeout; any failure (network error, timeout, non-2xx) backs off
    /// `min(attempts, 15)` seconds before the next attempt. The attempt
    /// counter is never reset, so repeated establishment rounds keep
    /// backing off at the cap.
    pub async fn health_check(&self) {
        loop {
            if self.probe().await {
                return;
            }
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            let delay = backoff_delay(attempt);
            tracing::debug!(attempt, delay_secs = delay.as_secs(), "health check failed");
            sleep(delay).await;
        }
    }

    async fn probe(&self) -> bool {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.url("healthy"))
            .body(Full::default());
        let Ok(request) = request else { return false };

        match timeout(HEALTH_CHECK_TIMEOUT, self.transport.request(request)).await {
            Ok(Ok(response)) => response.status().is_success(),
            _ => false,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.options.origin.trim_end_matches('/'), path)
    }
}

/// Backoff after the nth failed probe: n seconds, capped at 15.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt.min(MAX_BACKOFF_SECS)))
}

/// A non-2xx HTTP response, classified as a transport-level internal error
/// carrying the status and raw body text.
fn classify_http_failure(status: StatusCode, body: &[u8]) -> ApiError {
    ApiError::new(
        ErrorCode::InternalServerError,
        String::from_utf8_lossy(body).into_owned(),
    )
    .with_data(json!({
        "status": status.as_u16(),
        "statusText": status.canonical_reason().unwrap_or(""),
    }))
}
