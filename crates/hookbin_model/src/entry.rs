//! Captured-entry record.

use crate::time::ENTRY_TTL_MS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Length of a generated entry id, in hex characters.
const ENTRY_ID_LEN: usize = 12;

/// Generates a new opaque entry id.
///
/// Ids are short (12 hex characters from a v4 UUID), unique for the volumes
/// a capture endpoint sees, and carry no meaning.
#[must_use]
pub fn new_entry_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ENTRY_ID_LEN);
    id
}

/// One captured inbound request.
///
/// An entry is immutable after creation: `expires_at` is written once by the
/// store when the master copy is created, and every later state change is a
/// deletion, never an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque server-generated identifier.
    pub id: String,
    /// Creation timestamp, unix epoch milliseconds.
    pub received_at: u64,
    /// Expiry timestamp: `received_at + ENTRY_TTL_MS`, assigned at creation.
    pub expires_at: u64,
    /// HTTP method of the captured request.
    pub method: String,
    /// Request path as received.
    pub path: String,
    /// Optional channel label derived from the path suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Raw query string, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    /// Request headers. Ordering is irrelevant; duplicate keys collapse to
    /// whatever the transport delivered last.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Content-Type header value, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Raw request body as text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Remote address of the sender, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    /// Body length in bytes.
    pub content_length: u64,
}

impl Entry {
    /// Creates an entry received at `received_at` with a fresh id and the
    /// fixed TTL applied.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>, received_at: u64) -> Self {
        Self {
            id: new_entry_id(),
            received_at,
            expires_at: received_at + ENTRY_TTL_MS,
            method: method.into(),
            path: path.into(),
            channel: None,
            query_string: None,
            headers: BTreeMap::new(),
            content_type: None,
            body: None,
            source_ip: None,
            content_length: 0,
        }
    }

    /// Sets the body and its content length.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.content_length = body.len() as u64;
        self.body = Some(body);
        self
    }

    /// Sets the channel label.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns true if the entry's retention window has elapsed at `now_ms`.
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at <= now_ms
    }
}
