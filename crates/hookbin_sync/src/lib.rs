//! # hookbin sync
//!
//! The synchronization core: keeps every active identity's inbox eventually
//! consistent with the master store and maps each mutation to an
//! audience-scoped push event.
//!
//! ## Architecture
//!
//! - [`PresenceRegistry`]: in-memory reference-counted set of identities
//!   with at least one live connection. Drives fan-out.
//! - [`SyncEngine`]: capture fan-out, login-time reconciliation, restore,
//!   and inbox mutations, over a [`hookbin_store::StoreBackend`] and an
//!   [`EventSink`].
//! - [`EventSink`]: delivery seam. The engine decides WHAT changed and for
//!   WHOM; the sink only decides HOW to deliver.
//!
//! ## Key invariants
//!
//! - The master write happens before any fan-out write.
//! - A failed fan-out write to one identity is logged and skipped; it never
//!   fails the capture and is healed by that identity's next reconnect.
//! - Reconciliation is additive only and idempotent. It reasons purely from
//!   current inbox contents, so an entry the user deleted reappears on
//!   reconnect while it remains live in master. That inherited behavior is
//!   deliberate; see `reconcile` docs.
//! - There is no message-log replay: reconnect reconciliation plus the
//!   `InitialData` snapshot is the sole resync mechanism.

mod connection;
mod engine;
mod error;
mod presence;
mod sink;

pub use connection::{Connection, ConnectionId, ConnectionState};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use presence::PresenceRegistry;
pub use sink::{Audience, EventSink, MockSink};
