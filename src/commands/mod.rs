//! Command handler collaborator interface.
//!
//! The hub dispatches `tools/list` and `tools/call` against this trait and
//! never depends on a concrete implementation; [`calculator::Calculator`]
//! is the one shipped with the binary.

use std::fmt::{Display, Formatter};

use serde::Serialize;
use serde_json::{Map, Value};

pub mod calculator;

/// Immutable description of one invocable command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDescriptor {
    /// Command name used as the `tools/call` target.
    pub name: String,
    /// One-line human-readable description.
    pub description: String,
    /// JSON schema for the argument object.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Domain failure produced by a command handler.
///
/// Never process-fatal: the dispatcher converts every variant into an
/// error-flagged response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The named command does not exist.
    UnknownCommand(String),
    /// A required argument is absent or has the wrong type.
    BadArgument(String),
    /// The command rejected otherwise well-formed arguments.
    Domain(String),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(name) => write!(f, "unknown command: {name}"),
            Self::BadArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Domain(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Resolves method names to domain logic on behalf of the dispatcher.
pub trait CommandHandler: Send + Sync {
    /// The full descriptor set, in stable order.
    fn descriptors(&self) -> &[CommandDescriptor];

    /// Invoke a command by name with an argument object.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for unknown commands, missing or malformed
    /// arguments, and domain violations.
    fn invoke(&self, name: &str, args: &Map<String, Value>) -> Result<Value, CommandError>;
}
