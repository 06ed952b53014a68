#![forbid(unsafe_code)]

//! `pushgate` — a JSON-RPC push hub over Server-Sent Events.
//!
//! Accepts many concurrent long-lived SSE connections, fans broadcast
//! notifications out to all of them, and answers correlated JSON-RPC
//! requests over a synchronous POST transport. Certain handshake methods
//! schedule deferred follow-up broadcasts.

pub mod commands;
pub mod config;
pub mod errors;
pub mod hub;
pub mod rpc;
pub mod server;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
