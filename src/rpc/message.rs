//! Typed JSON-RPC message model.
//!
//! Inbound bodies are decoded once at the transport boundary into
//! [`Inbound`]; every component past the boundary consumes the typed form
//! only. Outbound traffic (responses and broadcast notifications) is built
//! through [`Response`] and [`Outbound`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AppError, Result};

/// Constant protocol tag carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error code for an unrecognized method.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC error code for a transport-boundary decode failure.
pub const INTERNAL_ERROR: i64 = -32603;

/// Correlation identifier linking a request to its response.
///
/// JSON-RPC ids are numbers or strings; `Null` exists so protocol-error
/// envelopes can carry an explicit `"id": null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    String(String),
    /// Explicit null, used on error envelopes for undecodable input.
    Null,
}

/// An inbound message, classified by the presence of a correlation id.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Correlated request expecting exactly one response.
    Request {
        /// Correlation identifier to echo on the response.
        id: RequestId,
        /// Method name.
        method: String,
        /// Parameter object (empty when absent).
        params: Map<String, Value>,
    },
    /// Fire-and-forget notification; no reply is correlated to it.
    Notification {
        /// Method name.
        method: String,
        /// Parameter object (empty when absent).
        params: Map<String, Value>,
    },
}

#[derive(Deserialize)]
struct Envelope {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    method: Option<String>,
    params: Option<Value>,
    id: Option<RequestId>,
}

impl Inbound {
    /// Decode a raw request body into a typed message.
    ///
    /// A `params` field that is absent or not an object is treated as an
    /// empty parameter map.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol` if the body is not valid JSON or has no
    /// `method` field.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(raw)?;

        let Some(method) = envelope.method else {
            return Err(AppError::Protocol("message has no method".into()));
        };

        let params = match envelope.params {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Ok(match envelope.id {
            Some(id) => Self::Request { id, method, params },
            None => Self::Notification { method, params },
        })
    }

    /// Method name of the message.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Request { method, .. } | Self::Notification { method, .. } => method,
        }
    }
}

/// Structured JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable description.
    pub message: String,
}

impl RpcError {
    /// Error for a method name the dispatcher does not recognize.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {method}"),
        }
    }

    /// Error for input that could not be decoded at the transport boundary.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: format!("Internal error: {}", detail.into()),
        }
    }
}

/// A correlated response carrying either a result or an error.
///
/// Mutual exclusivity of `result` and `error` is enforced by the
/// constructors; the id is omitted from the wire form when the triggering
/// message carried none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl Response {
    /// Build a success response with the given result payload.
    #[must_use]
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn error(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }

    /// The correlation identifier, if any.
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// The error object, if this is an error response.
    #[must_use]
    pub fn rpc_error(&self) -> Option<&RpcError> {
        self.error.as_ref()
    }
}

/// Server-to-client notification (no correlation identifier).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    jsonrpc: &'static str,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl Notification {
    /// Build a notification for the given method.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }
}

/// Any server-to-client message that can be pushed onto a delivery channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    /// Broadcast notification.
    Notification(Notification),
    /// Response-shaped message (used by the direct-list compatibility
    /// sequence, which pushes unsolicited responses).
    Response(Response),
}
