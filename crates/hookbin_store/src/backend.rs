//! Storage backend abstraction.

use crate::error::StoreResult;
use hookbin_model::{Entry, Identity};

/// Maximum operations a backend accepts in one atomic write batch.
///
/// Matches the transactional batch ceiling of the document stores this
/// contract targets. Callers that need more operations split into chunks
/// (see [`crate::CLEAR_CHUNK_OPS`]).
pub const MAX_BATCH_OPS: usize = 500;

/// A logical collection within the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Partition {
    /// The master collection: every captured entry, identity-independent.
    Master,
    /// One identity's inbox: a mutable, potentially divergent copy.
    Inbox(Identity),
}

/// A single operation within a write batch.
#[derive(Debug, Clone)]
pub enum BatchOp {
    /// Upsert an entry by id.
    Put(Partition, Entry),
    /// Delete an entry by id if present.
    Delete(Partition, String),
}

/// An ordered set of operations that commits atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an upsert to the batch.
    pub fn put(&mut self, partition: Partition, entry: Entry) {
        self.ops.push(BatchOp::Put(partition, entry));
    }

    /// Adds a delete to the batch.
    pub fn delete(&mut self, partition: Partition, id: impl Into<String>) {
        self.ops.push(BatchOp::Delete(partition, id.into()));
    }

    /// Number of operations in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the batch holds no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consumes the batch, yielding its operations in order.
    #[must_use]
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// A transactional document backend holding partitioned entry collections.
///
/// Implementations must apply [`commit`](StoreBackend::commit) batches
/// atomically: either every operation in the batch lands or none does.
/// Individual `put`/`delete` calls are single-operation batches.
pub trait StoreBackend: Send + Sync {
    /// Upserts an entry into a partition, keyed by `entry.id`.
    fn put(&self, partition: &Partition, entry: Entry) -> StoreResult<()>;

    /// Fetches an entry by id.
    fn get(&self, partition: &Partition, id: &str) -> StoreResult<Option<Entry>>;

    /// Deletes an entry by id. Returns whether it was present.
    fn delete(&self, partition: &Partition, id: &str) -> StoreResult<bool>;

    /// Returns every entry in a partition, unordered and unfiltered.
    fn list(&self, partition: &Partition) -> StoreResult<Vec<Entry>>;

    /// Returns every entry id in a partition.
    fn list_ids(&self, partition: &Partition) -> StoreResult<Vec<String>>;

    /// Applies a write batch atomically.
    ///
    /// Fails with [`crate::StoreError::BatchTooLarge`] when the batch
    /// exceeds [`MAX_BATCH_OPS`].
    fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}
