//! The master/inbox webhook store.

use crate::backend::{Partition, StoreBackend, WriteBatch};
use crate::error::StoreResult;
use hookbin_model::{Entry, Identity, ENTRY_TTL_MS};
use std::sync::Arc;
use tracing::debug;

/// Operations per chunk for bulk deletions.
///
/// Kept under [`crate::MAX_BATCH_OPS`] so a chunk always fits the backend's
/// transactional ceiling with headroom.
pub const CLEAR_CHUNK_OPS: usize = 450;

/// The durable store: master collection plus per-identity inboxes.
///
/// Master is the source of truth; inboxes are mutable copies with fully
/// independent lifecycles. Reads filter expired entries; only
/// [`sweep_expired_master`](WebhookStore::sweep_expired_master) deletes
/// them, and only from master.
pub struct WebhookStore<B: StoreBackend> {
    backend: Arc<B>,
}

impl<B: StoreBackend> Clone for WebhookStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: StoreBackend> WebhookStore<B> {
    /// Creates a store over a backend.
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Writes an entry into master, assigning its expiry.
    ///
    /// Upserts by id, so retrying the same entry is idempotent. Returns the
    /// entry as stored.
    pub fn create_master(&self, mut entry: Entry) -> StoreResult<Entry> {
        entry.expires_at = entry.received_at + ENTRY_TTL_MS;
        self.backend.put(&Partition::Master, entry.clone())?;
        Ok(entry)
    }

    /// Copies an entry into an identity's inbox. Upserts by id.
    pub fn create_inbox(&self, identity: &Identity, entry: Entry) -> StoreResult<()> {
        self.backend
            .put(&Partition::Inbox(identity.clone()), entry)
    }

    /// Returns all non-expired master entries, newest first.
    pub fn list_master(&self, now_ms: u64) -> StoreResult<Vec<Entry>> {
        let mut entries = self.backend.list(&Partition::Master)?;
        Self::filter_and_order(&mut entries, now_ms);
        Ok(entries)
    }

    /// Returns an identity's non-expired inbox entries, newest first.
    ///
    /// Expiry is enforced here as a read-time filter; expired inbox rows are
    /// not deleted until the identity's own clear or restore touches them.
    pub fn list_inbox(&self, identity: &Identity, now_ms: u64) -> StoreResult<Vec<Entry>> {
        let mut entries = self.backend.list(&Partition::Inbox(identity.clone()))?;
        Self::filter_and_order(&mut entries, now_ms);
        Ok(entries)
    }

    /// Returns the non-expired ids currently in an identity's inbox.
    pub fn list_inbox_ids(&self, identity: &Identity, now_ms: u64) -> StoreResult<Vec<String>> {
        Ok(self
            .list_inbox(identity, now_ms)?
            .into_iter()
            .map(|e| e.id)
            .collect())
    }

    /// Fetches one entry from an identity's inbox, expiry-filtered.
    pub fn get_inbox(
        &self,
        identity: &Identity,
        id: &str,
        now_ms: u64,
    ) -> StoreResult<Option<Entry>> {
        Ok(self
            .backend
            .get(&Partition::Inbox(identity.clone()), id)?
            .filter(|e| !e.is_expired(now_ms)))
    }

    /// Removes one entry from an identity's inbox.
    ///
    /// Returns whether it was present. Master and other inboxes are never
    /// affected.
    pub fn delete_inbox(&self, identity: &Identity, id: &str) -> StoreResult<bool> {
        self.backend.delete(&Partition::Inbox(identity.clone()), id)
    }

    /// Removes every entry in an identity's inbox, returning the count.
    ///
    /// Deletion runs in chunks of [`CLEAR_CHUNK_OPS`]; each chunk commits
    /// atomically, and a failure between chunks leaves earlier chunks
    /// deleted (at-least-once across chunk boundaries).
    pub fn clear_inbox(&self, identity: &Identity) -> StoreResult<usize> {
        let partition = Partition::Inbox(identity.clone());
        let ids = self.backend.list_ids(&partition)?;
        let total = ids.len();

        for chunk in ids.chunks(CLEAR_CHUNK_OPS) {
            let mut batch = WriteBatch::new();
            for id in chunk {
                batch.delete(partition.clone(), id.clone());
            }
            self.backend.commit(batch)?;
            debug!(identity = %identity, deleted = chunk.len(), "cleared inbox chunk");
        }
        Ok(total)
    }

    /// Copies a set of entries into an identity's inbox in atomic chunks.
    pub fn copy_into_inbox(&self, identity: &Identity, entries: &[Entry]) -> StoreResult<usize> {
        let partition = Partition::Inbox(identity.clone());
        for chunk in entries.chunks(CLEAR_CHUNK_OPS) {
            let mut batch = WriteBatch::new();
            for entry in chunk {
                batch.put(partition.clone(), entry.clone());
            }
            self.backend.commit(batch)?;
        }
        Ok(entries.len())
    }

    /// Deletes every master entry whose expiry has elapsed at `now_ms`.
    ///
    /// Returns the count deleted. Triggered externally on a fixed schedule;
    /// this method does not schedule itself.
    pub fn sweep_expired_master(&self, now_ms: u64) -> StoreResult<usize> {
        let expired: Vec<String> = self
            .backend
            .list(&Partition::Master)?
            .into_iter()
            .filter(|e| e.is_expired(now_ms))
            .map(|e| e.id)
            .collect();

        for chunk in expired.chunks(CLEAR_CHUNK_OPS) {
            let mut batch = WriteBatch::new();
            for id in chunk {
                batch.delete(Partition::Master, id.clone());
            }
            self.backend.commit(batch)?;
        }
        Ok(expired.len())
    }

    fn filter_and_order(entries: &mut Vec<Entry>, now_ms: u64) {
        entries.retain(|e| !e.is_expired(now_ms));
        // Newest first; id as a deterministic tie-break.
        entries.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use proptest::prelude::*;

    fn store() -> WebhookStore<MemoryBackend> {
        WebhookStore::new(Arc::new(MemoryBackend::new()))
    }

    fn ident(email: &str) -> Identity {
        Identity::new(email).unwrap()
    }

    #[test]
    fn create_master_assigns_expiry() {
        let store = store();
        let mut entry = Entry::new("POST", "/webhook", 5_000);
        entry.expires_at = 0; // store must overwrite this
        let stored = store.create_master(entry).unwrap();
        assert_eq!(stored.expires_at, 5_000 + ENTRY_TTL_MS);

        let listed = store.list_master(5_000).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], stored);
    }

    #[test]
    fn create_master_is_idempotent_by_id() {
        let store = store();
        let entry = Entry::new("POST", "/webhook", 0);
        store.create_master(entry.clone()).unwrap();
        store.create_master(entry).unwrap();
        assert_eq!(store.list_master(0).unwrap().len(), 1);
    }

    #[test]
    fn list_master_filters_expired_and_orders_newest_first() {
        let store = store();
        let old = store.create_master(Entry::new("GET", "/webhook", 1_000)).unwrap();
        let new = store.create_master(Entry::new("GET", "/webhook", 2_000)).unwrap();

        let listed = store.list_master(2_000).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, new.id);
        assert_eq!(listed[1].id, old.id);

        // Past the old entry's expiry only the newer one remains, but it is
        // not deleted by the read.
        let listed = store.list_master(1_000 + ENTRY_TTL_MS).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, new.id);
        assert_eq!(
            store.backend().list(&Partition::Master).unwrap().len(),
            2
        );
    }

    #[test]
    fn inbox_delete_does_not_touch_master_or_other_inboxes() {
        let store = store();
        let a = ident("a@x.com");
        let b = ident("b@x.com");
        let entry = store.create_master(Entry::new("POST", "/webhook", 0)).unwrap();
        store.create_inbox(&a, entry.clone()).unwrap();
        store.create_inbox(&b, entry.clone()).unwrap();

        assert!(store.delete_inbox(&a, &entry.id).unwrap());
        assert!(!store.delete_inbox(&a, &entry.id).unwrap());

        assert!(store.get_inbox(&b, &entry.id, 0).unwrap().is_some());
        assert_eq!(store.list_master(0).unwrap().len(), 1);
    }

    #[test]
    fn get_inbox_filters_expired() {
        let store = store();
        let a = ident("a@x.com");
        let entry = store.create_master(Entry::new("POST", "/webhook", 0)).unwrap();
        store.create_inbox(&a, entry.clone()).unwrap();

        assert!(store.get_inbox(&a, &entry.id, 0).unwrap().is_some());
        assert!(store
            .get_inbox(&a, &entry.id, ENTRY_TTL_MS)
            .unwrap()
            .is_none());
    }

    #[test]
    fn clear_inbox_counts_and_empties() {
        let store = store();
        let a = ident("a@x.com");
        for _ in 0..3 {
            let entry = store.create_master(Entry::new("GET", "/webhook", 0)).unwrap();
            store.create_inbox(&a, entry).unwrap();
        }

        assert_eq!(store.clear_inbox(&a).unwrap(), 3);
        assert!(store.list_inbox(&a, 0).unwrap().is_empty());
        assert_eq!(store.clear_inbox(&a).unwrap(), 0);
    }

    #[test]
    fn sweep_deletes_only_expired_master_rows() {
        let store = store();
        let a = ident("a@x.com");
        let old = store.create_master(Entry::new("GET", "/webhook", 0)).unwrap();
        let new = store.create_master(Entry::new("GET", "/webhook", 10_000)).unwrap();
        store.create_inbox(&a, old.clone()).unwrap();

        let swept = store.sweep_expired_master(ENTRY_TTL_MS).unwrap();
        assert_eq!(swept, 1);

        let remaining = store.backend().list(&Partition::Master).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, new.id);

        // Inbox rows are never swept, only read-filtered.
        let inbox = Partition::Inbox(a);
        assert_eq!(store.backend().list(&inbox).unwrap().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        // Chunked clear must delete everything and report the exact count
        // for inboxes of any size, including sizes spanning chunk borders.
        #[test]
        fn clear_inbox_handles_arbitrary_sizes(n in 0usize..1200) {
            let store = store();
            let a = ident("a@x.com");
            for i in 0..n {
                let mut entry = Entry::new("GET", "/webhook", i as u64);
                entry.id = format!("e{i:05}");
                store.create_inbox(&a, entry).unwrap();
            }
            prop_assert_eq!(store.clear_inbox(&a).unwrap(), n);
            prop_assert!(store.list_inbox(&a, 0).unwrap().is_empty());
        }
    }
}
