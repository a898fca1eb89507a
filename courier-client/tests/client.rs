//! Client tests against a live server pinning the wire contract.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use courier_client::core::ErrorCode;
use courier_client::{ClientError, HttpClient, HttpClientOptions, RpcOptions};

#[derive(Default)]
struct ServerState {
    health_failures_left: AtomicUsize,
}

async fn get_user() -> Json<Value> {
    Json(json!({"error": null, "result": {"id": 1, "name": "ada"}}))
}

async fn forbidden() -> Json<Value> {
    Json(json!({
        "error": {"code": "Forbidden", "message": "no access", "data": {"role": "guest"}},
        "result": null,
    }))
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let pick = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    Json(json!({
        "error": null,
        "result": {
            "authorization": pick("authorization"),
            "content-type": pick("content-type"),
            "accept": pick("accept"),
        },
    }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({"error": null, "result": null}))
}

async fn healthy(State(state): State<Arc<ServerState>>) -> StatusCode {
    let left = state.health_failures_left.load(Ordering::SeqCst);
    if left > 0 {
        state.health_failures_left.fetch_sub(1, Ordering::SeqCst);
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Bind a canned server on an ephemeral port, returning its origin.
async fn spawn_server(health_failures: usize) -> String {
    let state = Arc::new(ServerState {
        health_failures_left: AtomicUsize::new(health_failures),
    });
    let router = Router::new()
        .route("/api/users/get", post(get_user))
        .route("/api/users/forbidden", post(forbidden))
        .route("/api/users/echo_headers", post(echo_headers))
        .route("/api/users/slow", post(slow))
        .route("/healthy", get(healthy))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn rpc_success_returns_decoded_result() {
    let origin = spawn_server(0).await;
    let client = HttpClient::new(HttpClientOptions::new(origin));

    let result = client.rpc("users", "get", json!({"id": 1})).await.unwrap();
    assert_eq!(result, json!({"id": 1, "name": "ada"}));
}

#[tokio::test]
async fn envelope_error_is_surfaced_verbatim() {
    let origin = spawn_server(0).await;
    let client = HttpClient::new(HttpClientOptions::new(origin));

    let err = client
        .rpc("users", "forbidden", json!({}))
        .await
        .unwrap_err();
    let api = err.api().expect("classified error");
    assert_eq!(api.code, ErrorCode::Forbidden);
    assert_eq!(api.message, "no access");
    assert_eq!(api.data, Some(json!({"role": "guest"})));
}

#[tokio::test]
async fn non_2xx_is_classified_as_internal_with_status_data() {
    let origin = spawn_server(0).await;
    let client = HttpClient::new(HttpClientOptions::new(origin));

    // no such route: a plain 404 from the server, not an envelope
    let err = client.rpc("users", "missing", json!({})).await.unwrap_err();
    let api = err.api().expect("classified error");
    assert_eq!(api.code, ErrorCode::InternalServerError);
    let data = api.data.clone().unwrap();
    assert_eq!(data["status"], 404);
}

#[tokio::test]
async fn request_carries_negotiation_and_auth_headers() {
    let origin = spawn_server(0).await;
    let client = HttpClient::new(HttpClientOptions::new(origin).auth("Bearer token-1"));

    let result = client
        .rpc("users", "echo_headers", json!({}))
        .await
        .unwrap();
    assert_eq!(result["authorization"], "Bearer token-1");
    assert_eq!(result["content-type"], "application/json");
    assert_eq!(result["accept"], "application/json");
}

#[tokio::test]
async fn timeout_option_cuts_off_slow_calls() {
    let origin = spawn_server(0).await;
    let client = HttpClient::new(HttpClientOptions::new(origin));

    let options = RpcOptions {
        timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let err = client
        .rpc_with("users", "slow", json!({}), options)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::TimedOut));
}

#[tokio::test]
async fn cancellation_signal_aborts_the_call() {
    let origin = spawn_server(0).await;
    let client = HttpClient::new(HttpClientOptions::new(origin));

    let signal = CancellationToken::new();
    signal.cancel();
    let options = RpcOptions {
        signal: Some(signal),
        ..Default::default()
    };
    let err = client
        .rpc_with("users", "slow", json!({}), options)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Canceled));
}

#[tokio::test]
async fn health_check_retries_until_ok() {
    let origin = spawn_server(1).await;
    let client = HttpClient::new(HttpClientOptions::new(origin));

    let started = std::time::Instant::now();
    client.health_check().await;
    // one failure, one 1s backoff, then success
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn health_check_returns_immediately_when_healthy() {
    let origin = spawn_server(0).await;
    let client = HttpClient::new(HttpClientOptions::new(origin));

    let started = std::time::Instant::now();
    client.health_check().await;
    assert!(started.elapsed() < Duration::from_secs(1));
}
