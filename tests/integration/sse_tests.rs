//! Integration tests for the SSE stream lifecycle.
//!
//! Drives a real server over HTTP: opens a stream, observes the greeting,
//! triggers a deferred broadcast through the `initialized` handshake, and
//! tears everything down with `close`.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};

use super::test_helpers::{spawn_server, test_config};

type ByteStream = futures_util::stream::BoxStream<'static, reqwest::Result<bytes::Bytes>>;

/// Read from the stream until `needle` appears in the accumulated text.
async fn read_until(stream: &mut ByteStream, buffer: &mut String, needle: &str) {
    let deadline = Duration::from_secs(5);
    while !buffer.contains(needle) {
        let chunk = tokio::time::timeout(deadline, stream.next())
            .await
            .expect("stream produced data before the deadline")
            .expect("stream still open")
            .expect("chunk read");
        buffer.push_str(&String::from_utf8_lossy(&chunk));
    }
}

async fn open_stream(base: &str) -> ByteStream {
    let response = reqwest::Client::new()
        .get(format!("{base}/sse"))
        .send()
        .await
        .expect("sse request");

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream")));

    response.bytes_stream().boxed()
}

#[tokio::test]
async fn stream_opens_with_greeting_and_registers_connection() {
    let (base, state) = spawn_server(test_config()).await;

    let mut stream = open_stream(&base).await;
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, "SSE connection established").await;

    // The greeting starts with a keep-alive comment line.
    assert!(buffer.starts_with(':'), "got {buffer:?}");
    assert_eq!(state.registry.len(), 1);

    let health: Value = reqwest::get(format!("{base}/health"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");
    assert_eq!(health["connections"], 1);
}

#[tokio::test]
async fn initialized_handshake_pushes_list_changed_to_stream() {
    let (base, _state) = spawn_server(test_config()).await;

    let mut stream = open_stream(&base).await;
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, "SSE connection established").await;

    let ack = reqwest::Client::new()
        .post(format!("{base}/messages"))
        .json(&json!({"jsonrpc": "2.0", "method": "initialized"}))
        .send()
        .await
        .expect("request");
    assert_eq!(ack.status(), 200);

    read_until(&mut stream, &mut buffer, "notifications/tools/list_changed").await;
}

#[tokio::test]
async fn close_terminates_streams_and_empties_registry() {
    let (base, state) = spawn_server(test_config()).await;

    let mut stream = open_stream(&base).await;
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, "SSE connection established").await;
    assert_eq!(state.registry.len(), 1);

    let response: Value = reqwest::Client::new()
        .post(format!("{base}/messages"))
        .json(&json!({"jsonrpc": "2.0", "method": "close", "id": 11}))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");
    assert_eq!(response["result"], json!({}));

    // The stream ends once the close sentinel is consumed.
    let end = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = stream.next().await {
            let _ = chunk.expect("chunk read");
        }
    })
    .await;
    assert!(end.is_ok(), "stream should terminate after close");

    // Unregistration happens as the stream winds down.
    tokio::time::timeout(Duration::from_secs(5), async {
        while !state.registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("registry should drain after close");
}

#[tokio::test]
async fn dropping_the_client_unregisters_the_connection() {
    let (base, state) = spawn_server(test_config()).await;

    let mut stream = open_stream(&base).await;
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, "SSE connection established").await;
    assert_eq!(state.registry.len(), 1);

    // Client disconnect: drop the response stream mid-pull.
    drop(stream);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !state.registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("registry should drain after disconnect");
}
