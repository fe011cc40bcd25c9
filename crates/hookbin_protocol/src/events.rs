//! Server-to-client events.

use crate::ProtocolResult;
use hookbin_model::Entry;
use serde::{Deserialize, Serialize};

/// An event pushed from the server to connected clients.
///
/// Audience scoping (enforced by the sync engine, not encoded here):
///
/// | Event          | Audience                          |
/// |----------------|-----------------------------------|
/// | `InitialData`  | single connection, on connect     |
/// | `NewWebhook`   | every connection (broadcast)      |
/// | `EntryDeleted` | the acting identity's connections |
/// | `AllCleared`   | the acting identity's connections |
/// | `AllRestored`  | the acting identity's connections |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full inbox snapshot sent to one connection after reconciliation.
    InitialData {
        /// The caller's current inbox, newest first.
        entries: Vec<Entry>,
    },
    /// A newly captured entry.
    NewWebhook {
        /// The entry as stored in master.
        entry: Entry,
    },
    /// One entry was deleted from the acting identity's inbox.
    EntryDeleted {
        /// Id of the deleted entry.
        id: String,
    },
    /// The acting identity's inbox was cleared.
    AllCleared,
    /// The acting identity's inbox was restored from master.
    AllRestored {
        /// The full restored inbox, newest first.
        entries: Vec<Entry>,
    },
}

impl ServerEvent {
    /// Returns the wire discriminator for this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::InitialData { .. } => "initial_data",
            ServerEvent::NewWebhook { .. } => "new_webhook",
            ServerEvent::EntryDeleted { .. } => "entry_deleted",
            ServerEvent::AllCleared => "all_cleared",
            ServerEvent::AllRestored { .. } => "all_restored",
        }
    }

    /// Encodes the event as JSON.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes an event from JSON.
    pub fn decode(json: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Response payload returned to the webhook sender on capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureAck {
    /// Human-readable confirmation.
    pub message: String,
    /// Id assigned to the captured entry.
    pub id: String,
    /// When the entry was received, unix epoch milliseconds.
    pub received_at: u64,
}

impl CaptureAck {
    /// Builds the ack for a stored entry.
    #[must_use]
    pub fn for_entry(entry: &Entry) -> Self {
        Self {
            message: "webhook received".into(),
            id: entry.id.clone(),
            received_at: entry.received_at,
        }
    }
}
