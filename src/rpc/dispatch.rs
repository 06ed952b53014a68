//! Request dispatcher and shared application state.
//!
//! Maps each recognized inbound method to its handler and converts every
//! command-handler failure into a normal error-flagged response payload.
//! Nothing here propagates an error past the dispatcher; only unrecognized
//! methods produce a JSON-RPC error object.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, info_span};

use crate::commands::CommandHandler;
use crate::config::GlobalConfig;
use crate::hub::notifier;
use crate::hub::registry::ConnectionRegistry;
use crate::rpc::message::{Inbound, Response, RpcError};

/// Shared application state accessible by every endpoint handler.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Live connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Command handler collaborator resolving tool calls.
    pub commands: Arc<dyn CommandHandler>,
}

/// Dispatch one inbound message, returning the response to send back.
///
/// `None` means the transport should answer with an empty acknowledgment
/// body (the `initialized` notification). Side effects: `initialize` and
/// `initialized` may schedule deferred broadcasts, and `close` signals
/// every registered connection.
pub fn dispatch(state: &AppState, inbound: Inbound) -> Option<Response> {
    let (method, params, id) = match inbound {
        Inbound::Request { id, method, params } => (method, params, Some(id)),
        Inbound::Notification { method, params } => (method, params, None),
    };
    let _span = info_span!("dispatch", method = %method).entered();

    match method.as_str() {
        "initialize" => {
            if state.config.aggressive_direct_list {
                let _task = notifier::spawn_direct_list(
                    Arc::clone(&state.registry),
                    state.commands.descriptors().to_vec(),
                    state.config.direct_list_delay(),
                    state.config.direct_list_followup_delay(),
                );
            }
            Some(Response::success(
                id,
                json!({
                    "serverInfo": {
                        "name": state.config.server_name,
                        "version": state.config.server_version
                    },
                    "capabilities": { "tools": {} }
                }),
            ))
        }
        "initialized" => {
            let _task = notifier::spawn_list_changed(
                Arc::clone(&state.registry),
                state.config.list_changed_delay(),
            );
            None
        }
        "tools/list" => Some(Response::success(
            id,
            json!({ "tools": state.commands.descriptors() }),
        )),
        "tools/call" => Some(Response::success(id, call_command(state, &params))),
        "close" => {
            let signalled = state.registry.close_all();
            info!(signalled, "close requested; signalled all connections");
            Some(Response::success(id, json!({})))
        }
        other => Some(Response::error(id, RpcError::method_not_found(other))),
    }
}

/// Run a `tools/call` and wrap the outcome as a content block.
///
/// Handler failures of any kind (missing command name, bad arguments,
/// unknown command, domain errors) become `isError: true` content, never a
/// transport-level error.
fn call_command(state: &AppState, params: &Map<String, Value>) -> Value {
    match try_call(state, params) {
        Ok(text) => content_block(&text, false),
        Err(message) => content_block(&format!("Error: {message}"), true),
    }
}

fn try_call(state: &AppState, params: &Map<String, Value>) -> Result<String, String> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing command name".to_owned())?;

    let empty = Map::new();
    let args = match params.get("arguments") {
        Some(Value::Object(map)) => map,
        _ => &empty,
    };

    let value = state
        .commands
        .invoke(name, args)
        .map_err(|err| err.to_string())?;
    Ok(render_text(&value))
}

fn content_block(text: &str, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    })
}

/// Render a result value as display text.
///
/// Integral floats print without a trailing `.0` so `2 + 3` reads `5`.
fn render_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.as_f64().map_or_else(|| number.to_string(), format_number),
        other => other.to_string(),
    }
}

#[allow(clippy::float_cmp)] // exact integrality check, not a tolerance test
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
