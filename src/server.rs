//! HTTP surface: SSE stream, message endpoint, health and debug routes.
//!
//! `POST /` mirrors `POST /messages` for clients that deliver requests at
//! the root path. CORS is fully permissive; the server is meant to sit
//! behind whatever boundary the deployment provides.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::Sse;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::hub::stream::event_stream;
use crate::rpc::dispatch::{dispatch, AppState};
use crate::rpc::message::{Inbound, RequestId, Response, RpcError};
use crate::{AppError, Result};

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sse", get(sse_endpoint))
        .route("/messages", post(messages_endpoint))
        .route("/", post(messages_endpoint))
        .route("/health", get(health))
        .route("/debug/tools", get(debug_tools))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until the token is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the listener fails to bind and
/// `AppError::Io` if the server loop fails.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind = format!("{}:{}", state.config.http_host, state.config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {bind}: {err}")))?;
    let addr = listener.local_addr()?;

    info!(%addr, "starting http transport");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(ct.cancelled_owned())
        .await
        .map_err(|err| AppError::Io(format!("server error: {err}")))?;

    info!("http transport shut down");
    Ok(())
}

/// Handler for `GET /sse`: registers a connection and streams events to it.
async fn sse_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stream = event_stream(
        Arc::clone(&state.registry),
        state.config.heartbeat_interval(),
    );

    (
        AppendHeaders([
            ("cache-control", "no-cache"),
            ("x-accel-buffering", "no"),
        ]),
        Sse::new(stream),
    )
}

/// Handler for `POST /messages` (and `POST /`): one request in, one
/// response out.
///
/// Undecodable bodies get a 500 with an internal-error envelope and a null
/// correlation id; the `initialized` notification gets an empty object.
async fn messages_endpoint(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let inbound = match Inbound::decode(&body) {
        Ok(inbound) => inbound,
        Err(err) => {
            warn!(%err, "undecodable message body");
            let envelope = Response::error(Some(RequestId::Null), RpcError::internal(err.to_string()));
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(to_json(&envelope)));
        }
    };

    debug!(method = inbound.method(), "processing message");

    match dispatch(&state, inbound) {
        Some(response) => (StatusCode::OK, Json(to_json(&response))),
        None => (StatusCode::OK, Json(json!({}))),
    }
}

fn to_json(response: &Response) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}

/// Handler for `GET /health`: liveness plus live-connection count.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "connections": state.registry.len()
    }))
}

/// Handler for `GET /debug/tools`: command descriptors plus per-connection
/// queue depths. Read-only introspection, not part of the core protocol.
async fn debug_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    let connections: Map<String, Value> = state
        .registry
        .queue_depths()
        .into_iter()
        .map(|(id, depth)| (id.to_string(), json!(depth)))
        .collect();

    Json(json!({
        "tools": state.commands.descriptors(),
        "connections": connections,
        "connection_count": state.registry.len()
    }))
}
