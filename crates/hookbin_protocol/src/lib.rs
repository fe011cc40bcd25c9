//! # hookbin protocol
//!
//! Wire types for the real-time push channel and the capture endpoint:
//! server-to-client events, client-to-server commands, and the capture
//! acknowledgement payload. Everything is JSON, internally tagged, so a
//! browser client can switch on a single discriminator field.
//!
//! Audiences are part of the contract but not of the wire format: the sync
//! engine decides WHO receives an event, the transport decides HOW, and
//! these types only say WHAT.

mod commands;
mod events;

pub use commands::ClientCommand;
pub use events::{CaptureAck, ServerEvent};

use thiserror::Error;

/// Errors decoding a protocol payload.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload was not valid JSON for the expected type.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for protocol codecs.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
