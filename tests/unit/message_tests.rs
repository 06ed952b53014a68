//! Unit tests for the typed JSON-RPC message model.

use pushgate::rpc::message::{
    Inbound, Notification, Outbound, RequestId, Response, RpcError, INTERNAL_ERROR,
    METHOD_NOT_FOUND,
};
use serde_json::{json, Value};

#[test]
fn decode_request_with_numeric_id() {
    let raw = br#"{"jsonrpc":"2.0","method":"tools/list","id":7}"#;
    let inbound = Inbound::decode(raw).expect("valid request");

    match inbound {
        Inbound::Request { id, method, params } => {
            assert_eq!(id, RequestId::Number(7));
            assert_eq!(method, "tools/list");
            assert!(params.is_empty());
        }
        Inbound::Notification { .. } => panic!("expected request"),
    }
}

#[test]
fn decode_request_with_string_id() {
    let raw = br#"{"jsonrpc":"2.0","method":"initialize","id":"abc-1"}"#;
    let inbound = Inbound::decode(raw).expect("valid request");

    assert!(matches!(
        inbound,
        Inbound::Request { id: RequestId::String(ref s), .. } if s == "abc-1"
    ));
}

#[test]
fn decode_without_id_yields_notification() {
    let raw = br#"{"jsonrpc":"2.0","method":"initialized","params":{"x":1}}"#;
    let inbound = Inbound::decode(raw).expect("valid notification");

    match inbound {
        Inbound::Notification { method, params } => {
            assert_eq!(method, "initialized");
            assert_eq!(params.get("x"), Some(&json!(1)));
        }
        Inbound::Request { .. } => panic!("expected notification"),
    }
}

#[test]
fn decode_explicit_null_id_yields_notification() {
    // A null id carries no usable correlation, so the message is treated
    // as a notification.
    let raw = br#"{"jsonrpc":"2.0","method":"ping","id":null}"#;
    let inbound = Inbound::decode(raw).expect("valid message");
    assert!(matches!(inbound, Inbound::Notification { .. }));
}

#[test]
fn decode_non_object_params_defaults_to_empty() {
    let raw = br#"{"jsonrpc":"2.0","method":"x","params":[1,2],"id":1}"#;
    let inbound = Inbound::decode(raw).expect("valid message");

    match inbound {
        Inbound::Request { params, .. } => assert!(params.is_empty()),
        Inbound::Notification { .. } => panic!("expected request"),
    }
}

#[test]
fn decode_missing_method_is_rejected() {
    let err = Inbound::decode(br#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
    assert!(err.to_string().contains("method"), "got {err}");
}

#[test]
fn decode_invalid_json_is_rejected() {
    assert!(Inbound::decode(b"{not json").is_err());
}

#[test]
fn success_response_serializes_result_only() {
    let response = Response::success(Some(RequestId::Number(3)), json!({"ok": true}));
    let value = serde_json::to_value(&response).expect("serializable");

    assert_eq!(value["jsonrpc"], "2.0");
    assert_eq!(value["id"], 3);
    assert_eq!(value["result"]["ok"], true);
    assert!(value.get("error").is_none());
}

#[test]
fn error_response_serializes_error_only() {
    let response = Response::error(
        Some(RequestId::String("r1".into())),
        RpcError::method_not_found("frobnicate"),
    );
    let value = serde_json::to_value(&response).expect("serializable");

    assert_eq!(value["id"], "r1");
    assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
    assert!(value["error"]["message"]
        .as_str()
        .expect("message")
        .contains("frobnicate"));
    assert!(value.get("result").is_none());
}

#[test]
fn response_without_id_omits_the_field() {
    let response = Response::success(None, json!({}));
    let value = serde_json::to_value(&response).expect("serializable");

    assert!(value.as_object().expect("object").get("id").is_none());
}

#[test]
fn internal_error_envelope_carries_explicit_null_id() {
    let response = Response::error(Some(RequestId::Null), RpcError::internal("boom"));
    let value = serde_json::to_value(&response).expect("serializable");
    let object = value.as_object().expect("object");

    assert_eq!(object.get("id"), Some(&Value::Null));
    assert_eq!(value["error"]["code"], INTERNAL_ERROR);
}

#[test]
fn notification_without_params_omits_the_field() {
    let outbound = Outbound::Notification(Notification::new(
        "notifications/tools/list_changed",
        None,
    ));
    let value = serde_json::to_value(&outbound).expect("serializable");
    let object = value.as_object().expect("object");

    assert_eq!(value["method"], "notifications/tools/list_changed");
    assert!(object.get("params").is_none());
    assert!(object.get("id").is_none());
}

#[test]
fn response_accessors_expose_id_and_error() {
    let response = Response::error(Some(RequestId::Number(1)), RpcError::internal("x"));

    assert_eq!(response.id(), Some(&RequestId::Number(1)));
    assert_eq!(response.rpc_error().map(|e| e.code), Some(INTERNAL_ERROR));
}
