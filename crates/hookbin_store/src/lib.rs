//! # hookbin store
//!
//! The durable store behind hookbin: one master collection holding every
//! captured entry (the source of truth) plus one isolated inbox collection
//! per identity.
//!
//! The store is layered over a [`StoreBackend`] seam so the same contract
//! runs against the bundled in-memory backend or an external document store.
//! The backend guarantees single-batch atomicity for write batches of up to
//! [`MAX_BATCH_OPS`] operations; multi-batch operations (bulk clears, the
//! expiry sweep) commit chunk by chunk and may partially complete across
//! chunk boundaries.
//!
//! ## Key invariants
//!
//! - The master write is the source of truth; inbox rows are copies.
//! - Reads filter out expired entries; only the master sweep deletes them.
//! - Inbox mutations never touch master or any other identity's inbox.

mod backend;
mod error;
mod memory;
mod store;

pub use backend::{BatchOp, Partition, StoreBackend, WriteBatch, MAX_BATCH_OPS};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use store::{WebhookStore, CLEAR_CHUNK_OPS};
