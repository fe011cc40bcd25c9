//! In-memory storage backend.

use crate::backend::{BatchOp, Partition, StoreBackend, WriteBatch, MAX_BATCH_OPS};
use crate::error::{StoreError, StoreResult};
use hookbin_model::Entry;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};

/// An in-memory [`StoreBackend`].
///
/// Batches apply under a single write lock, so single-batch atomicity holds
/// trivially. Supports failure injection for exercising error paths: a
/// global failure flag and a per-partition failure set (used to simulate one
/// identity's fan-out write failing while others succeed).
#[derive(Default)]
pub struct MemoryBackend {
    partitions: RwLock<HashMap<Partition, BTreeMap<String, Entry>>>,
    fail_all: RwLock<bool>,
    fail_partitions: RwLock<HashSet<Partition>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail until cleared.
    pub fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write() = fail;
    }

    /// Makes writes targeting one partition fail until cleared.
    pub fn fail_partition(&self, partition: Partition) {
        self.fail_partitions.write().insert(partition);
    }

    /// Clears a per-partition failure.
    pub fn heal_partition(&self, partition: &Partition) {
        self.fail_partitions.write().remove(partition);
    }

    fn check_available(&self, partition: Option<&Partition>) -> StoreResult<()> {
        if *self.fail_all.read() {
            return Err(StoreError::unavailable("injected failure"));
        }
        if let Some(p) = partition {
            if self.fail_partitions.read().contains(p) {
                return Err(StoreError::unavailable(format!(
                    "injected failure for partition {p:?}"
                )));
            }
        }
        Ok(())
    }
}

impl StoreBackend for MemoryBackend {
    fn put(&self, partition: &Partition, entry: Entry) -> StoreResult<()> {
        self.check_available(Some(partition))?;
        self.partitions
            .write()
            .entry(partition.clone())
            .or_default()
            .insert(entry.id.clone(), entry);
        Ok(())
    }

    fn get(&self, partition: &Partition, id: &str) -> StoreResult<Option<Entry>> {
        self.check_available(None)?;
        Ok(self
            .partitions
            .read()
            .get(partition)
            .and_then(|p| p.get(id))
            .cloned())
    }

    fn delete(&self, partition: &Partition, id: &str) -> StoreResult<bool> {
        self.check_available(Some(partition))?;
        Ok(self
            .partitions
            .write()
            .get_mut(partition)
            .is_some_and(|p| p.remove(id).is_some()))
    }

    fn list(&self, partition: &Partition) -> StoreResult<Vec<Entry>> {
        self.check_available(None)?;
        Ok(self
            .partitions
            .read()
            .get(partition)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default())
    }

    fn list_ids(&self, partition: &Partition) -> StoreResult<Vec<String>> {
        self.check_available(None)?;
        Ok(self
            .partitions
            .read()
            .get(partition)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.len() > MAX_BATCH_OPS {
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                limit: MAX_BATCH_OPS,
            });
        }
        let ops = batch.into_ops();
        // Validate the whole batch before touching state so a failing
        // partition rejects the batch without partial application.
        self.check_available(None)?;
        {
            let failing = self.fail_partitions.read();
            for op in &ops {
                let partition = match op {
                    BatchOp::Put(p, _) | BatchOp::Delete(p, _) => p,
                };
                if failing.contains(partition) {
                    return Err(StoreError::unavailable(format!(
                        "injected failure for partition {partition:?}"
                    )));
                }
            }
        }

        let mut partitions = self.partitions.write();
        for op in ops {
            match op {
                BatchOp::Put(partition, entry) => {
                    partitions
                        .entry(partition)
                        .or_default()
                        .insert(entry.id.clone(), entry);
                }
                BatchOp::Delete(partition, id) => {
                    if let Some(p) = partitions.get_mut(&partition) {
                        p.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbin_model::Identity;

    fn ident(email: &str) -> Identity {
        Identity::new(email).unwrap()
    }

    #[test]
    fn put_get_delete() {
        let backend = MemoryBackend::new();
        let entry = Entry::new("POST", "/webhook", 0);
        let id = entry.id.clone();

        backend.put(&Partition::Master, entry.clone()).unwrap();
        assert_eq!(backend.get(&Partition::Master, &id).unwrap(), Some(entry));

        assert!(backend.delete(&Partition::Master, &id).unwrap());
        assert!(!backend.delete(&Partition::Master, &id).unwrap());
        assert_eq!(backend.get(&Partition::Master, &id).unwrap(), None);
    }

    #[test]
    fn partitions_are_isolated() {
        let backend = MemoryBackend::new();
        let entry = Entry::new("POST", "/webhook", 0);
        let id = entry.id.clone();

        let inbox_a = Partition::Inbox(ident("a@x.com"));
        let inbox_b = Partition::Inbox(ident("b@x.com"));

        backend.put(&inbox_a, entry).unwrap();
        assert!(backend.get(&inbox_a, &id).unwrap().is_some());
        assert!(backend.get(&inbox_b, &id).unwrap().is_none());
        assert!(backend.get(&Partition::Master, &id).unwrap().is_none());
    }

    #[test]
    fn commit_rejects_oversized_batch() {
        let backend = MemoryBackend::new();
        let mut batch = WriteBatch::new();
        for _ in 0..=MAX_BATCH_OPS {
            batch.put(Partition::Master, Entry::new("GET", "/webhook", 0));
        }
        assert!(matches!(
            backend.commit(batch),
            Err(StoreError::BatchTooLarge { .. })
        ));
    }

    #[test]
    fn commit_applies_all_ops() {
        let backend = MemoryBackend::new();
        let a = Entry::new("GET", "/webhook", 0);
        let b = Entry::new("GET", "/webhook", 0);
        let a_id = a.id.clone();

        let mut batch = WriteBatch::new();
        batch.put(Partition::Master, a);
        batch.put(Partition::Master, b);
        batch.delete(Partition::Master, a_id.clone());
        backend.commit(batch).unwrap();

        assert!(backend.get(&Partition::Master, &a_id).unwrap().is_none());
        assert_eq!(backend.list(&Partition::Master).unwrap().len(), 1);
    }

    #[test]
    fn failure_injection() {
        let backend = MemoryBackend::new();
        backend.set_fail_all(true);
        assert!(backend
            .put(&Partition::Master, Entry::new("GET", "/webhook", 0))
            .is_err());
        backend.set_fail_all(false);

        let inbox = Partition::Inbox(ident("a@x.com"));
        backend.fail_partition(inbox.clone());
        assert!(backend
            .put(&inbox, Entry::new("GET", "/webhook", 0))
            .is_err());
        assert!(backend
            .put(&Partition::Master, Entry::new("GET", "/webhook", 0))
            .is_ok());

        backend.heal_partition(&inbox);
        assert!(backend
            .put(&inbox, Entry::new("GET", "/webhook", 0))
            .is_ok());
    }

    #[test]
    fn failing_partition_rejects_whole_batch() {
        let backend = MemoryBackend::new();
        let inbox = Partition::Inbox(ident("a@x.com"));
        backend.fail_partition(inbox.clone());

        let survivor = Entry::new("GET", "/webhook", 0);
        let survivor_id = survivor.id.clone();
        let mut batch = WriteBatch::new();
        batch.put(Partition::Master, survivor);
        batch.put(inbox, Entry::new("GET", "/webhook", 0));

        assert!(backend.commit(batch).is_err());
        // Atomicity: the master put must not have landed either.
        assert!(backend
            .get(&Partition::Master, &survivor_id)
            .unwrap()
            .is_none());
    }
}
