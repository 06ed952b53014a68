//! JSON-RPC message model and request dispatch.

pub mod dispatch;
pub mod message;
