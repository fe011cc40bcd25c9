//! # hookbin model
//!
//! Data model shared by every hookbin crate:
//! - [`Entry`]: one captured inbound request, immutable after creation.
//! - [`Identity`]: a normalized email acting as inbox partition key and
//!   push-group name.
//! - Clock helpers for the epoch-millisecond timestamps entries carry.
//!
//! ## Key invariants
//!
//! - `expires_at = received_at + ENTRY_TTL` (24 hours), fixed at creation.
//! - Entries are never mutated after creation; all state change is deletion.
//! - Identities are trimmed and lower-cased before use anywhere.

mod entry;
mod identity;
mod time;

pub use entry::{new_entry_id, Entry};
pub use identity::{Identity, IdentityError};
pub use time::{now_ms, ENTRY_TTL, ENTRY_TTL_MS};
