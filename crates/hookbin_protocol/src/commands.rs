//! Client-to-server commands.

use crate::ProtocolResult;
use serde::{Deserialize, Serialize};

/// A command sent by a connected client over the push channel.
///
/// Commands require an identity context (the connection's verified
/// principal) and map one-to-one onto sync engine operations. The channel
/// has no synchronous error-response convention: a failed command is logged
/// server-side and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Delete one entry from the caller's inbox.
    DeleteEntry {
        /// Id of the entry to delete.
        id: String,
    },
    /// Clear the caller's entire inbox.
    ClearAll,
    /// Replace the caller's inbox with a fresh copy of master.
    RestoreAll,
}

impl ClientCommand {
    /// Returns the wire discriminator for this command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::DeleteEntry { .. } => "delete_entry",
            ClientCommand::ClearAll => "clear_all",
            ClientCommand::RestoreAll => "restore_all",
        }
    }

    /// Encodes the command as JSON.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a command from JSON.
    pub fn decode(json: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
