//! The synchronization engine.

use crate::connection::ConnectionId;
use crate::error::SyncResult;
use crate::presence::PresenceRegistry;
use crate::sink::EventSink;
use hookbin_model::{now_ms, Entry, Identity};
use hookbin_protocol::ServerEvent;
use hookbin_store::{StoreBackend, WebhookStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Keeps every active identity's inbox consistent with master and emits the
/// matching push events.
///
/// The engine owns the ordering guarantees: the master write commits before
/// any fan-out write begins, and per-identity fan-out failures are recovered
/// locally (logged, skipped) rather than propagated, because the identity's
/// next reconnect reconciliation heals them transparently.
pub struct SyncEngine<B: StoreBackend, S: EventSink> {
    store: WebhookStore<B>,
    registry: Arc<PresenceRegistry>,
    sink: Arc<S>,
}

impl<B: StoreBackend, S: EventSink> Clone for SyncEngine<B, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: Arc::clone(&self.registry),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<B: StoreBackend, S: EventSink> SyncEngine<B, S> {
    /// Creates an engine over a store and a delivery sink.
    pub fn new(store: WebhookStore<B>, sink: Arc<S>) -> Self {
        Self {
            store,
            registry: Arc::new(PresenceRegistry::new()),
            sink,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &WebhookStore<B> {
        &self.store
    }

    /// The active-connection registry.
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// Handles a newly captured entry.
    ///
    /// Writes master first; that write's failure fails the capture. Then
    /// fans the entry out to every identity active in a registry snapshot
    /// taken now, and broadcasts `NewWebhook` to all connections. Identities
    /// that become active after the snapshot receive the entry at their own
    /// reconciliation point.
    pub fn capture(&self, entry: Entry) -> SyncResult<Entry> {
        let stored = self.store.create_master(entry)?;

        for identity in self.registry.active_identities() {
            if let Err(error) = self.store.create_inbox(&identity, stored.clone()) {
                // Recovered locally: the identity catches up on reconnect.
                warn!(%identity, id = %stored.id, %error, "fan-out write failed");
            }
        }

        self.sink.broadcast(&ServerEvent::NewWebhook {
            entry: stored.clone(),
        });
        Ok(stored)
    }

    /// Handles a connection reaching the `Connected` state.
    ///
    /// Registers the identity for fan-out, reconciles its inbox against
    /// master, and sends the full inbox snapshot to the new connection only.
    /// Returns the number of entries reconciliation added. Safe to repeat:
    /// reconciliation is idempotent, and repeating it is the system's sole
    /// resync mechanism.
    pub fn connect(&self, identity: &Identity, connection: ConnectionId) -> SyncResult<usize> {
        self.registry.increment(identity);
        match self.connect_registered(identity, connection) {
            Ok(added) => Ok(added),
            Err(err) => {
                // A connection that never reaches Connected must not stay
                // counted for fan-out: undo the registration.
                self.registry.decrement(identity);
                Err(err)
            }
        }
    }

    fn connect_registered(
        &self,
        identity: &Identity,
        connection: ConnectionId,
    ) -> SyncResult<usize> {
        let added = self.reconcile(identity)?;

        let entries = self.store.list_inbox(identity, now_ms())?;
        debug!(%identity, %connection, added, snapshot = entries.len(), "connection established");
        self.sink
            .send_to_connection(connection, &ServerEvent::InitialData { entries });
        Ok(added)
    }

    /// Handles a connection going away. Data is untouched.
    pub fn disconnect(&self, identity: &Identity) {
        let remaining = self.registry.decrement(identity);
        debug!(%identity, remaining, "connection closed");
    }

    /// Additively reconciles an identity's inbox against master.
    ///
    /// Inserts exactly the non-expired master entries whose ids are missing
    /// from the inbox; never deletes. Reconciliation reasons purely from
    /// current inbox contents, not deletion history, so an entry the user
    /// deleted is re-added while it remains live in master. Returns the
    /// count added.
    pub fn reconcile(&self, identity: &Identity) -> SyncResult<usize> {
        let now = now_ms();
        let present: HashSet<String> =
            self.store.list_inbox_ids(identity, now)?.into_iter().collect();

        let missing: Vec<Entry> = self
            .store
            .list_master(now)?
            .into_iter()
            .filter(|e| !present.contains(&e.id))
            .collect();

        let added = self.store.copy_into_inbox(identity, &missing)?;
        if added > 0 {
            debug!(%identity, added, "reconciled inbox");
        }
        Ok(added)
    }

    /// Deletes one entry from an identity's inbox.
    ///
    /// Master and other identities' inboxes are never affected. On success,
    /// `EntryDeleted` goes to the identity's own connection group so their
    /// other tabs converge. Returns whether the entry was present.
    pub fn delete_entry(&self, identity: &Identity, id: &str) -> SyncResult<bool> {
        let deleted = self.store.delete_inbox(identity, id)?;
        if deleted {
            self.sink
                .send_to_group(identity, &ServerEvent::EntryDeleted { id: id.to_owned() });
        }
        Ok(deleted)
    }

    /// Clears an identity's entire inbox, returning the count removed.
    pub fn clear(&self, identity: &Identity) -> SyncResult<usize> {
        let removed = self.store.clear_inbox(identity)?;
        self.sink.send_to_group(identity, &ServerEvent::AllCleared);
        Ok(removed)
    }

    /// Replaces an identity's inbox wholesale with a fresh copy of master.
    ///
    /// Returns the full resulting entry list (newest first) so the caller
    /// can display it without a second round trip.
    pub fn restore(&self, identity: &Identity) -> SyncResult<Vec<Entry>> {
        self.store.clear_inbox(identity)?;
        let entries = self.store.list_master(now_ms())?;
        self.store.copy_into_inbox(identity, &entries)?;

        self.sink.send_to_group(
            identity,
            &ServerEvent::AllRestored {
                entries: entries.clone(),
            },
        );
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Audience, MockSink};
    use hookbin_model::now_ms;
    use hookbin_store::MemoryBackend;

    fn engine() -> (SyncEngine<MemoryBackend, MockSink>, Arc<MockSink>) {
        let sink = Arc::new(MockSink::new());
        let store = WebhookStore::new(Arc::new(MemoryBackend::new()));
        (SyncEngine::new(store, Arc::clone(&sink)), sink)
    }

    fn ident(email: &str) -> Identity {
        Identity::new(email).unwrap()
    }

    fn entry() -> Entry {
        Entry::new("POST", "/webhook/orders", now_ms()).with_body("{\"a\":1}")
    }

    #[test]
    fn capture_with_no_active_identities_writes_master_only() {
        let (engine, sink) = engine();
        let stored = engine.capture(entry()).unwrap();

        assert_eq!(engine.store().list_master(now_ms()).unwrap().len(), 1);
        assert!(engine
            .store()
            .list_inbox(&ident("a@x.com"), now_ms())
            .unwrap()
            .is_empty());

        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, Audience::Broadcast);
        assert_eq!(
            deliveries[0].1,
            ServerEvent::NewWebhook { entry: stored }
        );
    }

    #[test]
    fn capture_fans_out_to_active_identities_only() {
        let (engine, _sink) = engine();
        let a = ident("a@x.com");
        let b = ident("b@x.com");

        engine.connect(&a, ConnectionId::next()).unwrap();
        engine.capture(entry()).unwrap();

        assert_eq!(engine.store().list_inbox(&a, now_ms()).unwrap().len(), 1);
        assert!(engine.store().list_inbox(&b, now_ms()).unwrap().is_empty());
    }

    #[test]
    fn connect_sends_snapshot_to_caller_only() {
        let (engine, sink) = engine();
        let a = ident("a@x.com");
        engine.capture(entry()).unwrap();
        sink.clear();

        let conn = ConnectionId::next();
        let added = engine.connect(&a, conn).unwrap();
        assert_eq!(added, 1);

        let to_conn = sink.events_for(&Audience::Connection(conn));
        assert_eq!(to_conn.len(), 1);
        match &to_conn[0] {
            ServerEvent::InitialData { entries } => assert_eq!(entries.len(), 1),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn reconcile_is_idempotent() {
        let (engine, _sink) = engine();
        let a = ident("a@x.com");
        engine.capture(entry()).unwrap();

        assert_eq!(engine.reconcile(&a).unwrap(), 1);
        assert_eq!(engine.reconcile(&a).unwrap(), 0);
        assert_eq!(engine.store().list_inbox(&a, now_ms()).unwrap().len(), 1);
    }

    #[test]
    fn reconcile_readds_deleted_entries_still_in_master() {
        // Inherited policy: reconciliation reasons from current inbox
        // contents only, so a deleted entry reappears on reconnect.
        let (engine, _sink) = engine();
        let a = ident("a@x.com");
        let stored = engine.capture(entry()).unwrap();

        engine.reconcile(&a).unwrap();
        assert!(engine.delete_entry(&a, &stored.id).unwrap());
        assert!(engine.store().list_inbox(&a, now_ms()).unwrap().is_empty());

        assert_eq!(engine.reconcile(&a).unwrap(), 1);
        assert_eq!(engine.store().list_inbox(&a, now_ms()).unwrap().len(), 1);
    }

    #[test]
    fn delete_is_isolated_and_scoped_to_group() {
        let (engine, sink) = engine();
        let a = ident("a@x.com");
        let b = ident("b@x.com");

        engine.connect(&a, ConnectionId::next()).unwrap();
        engine.connect(&b, ConnectionId::next()).unwrap();
        let stored = engine.capture(entry()).unwrap();
        sink.clear();

        assert!(engine.delete_entry(&a, &stored.id).unwrap());
        assert!(!engine.delete_entry(&a, &stored.id).unwrap());

        // B's inbox and master are untouched.
        assert_eq!(engine.store().list_inbox(&b, now_ms()).unwrap().len(), 1);
        assert_eq!(engine.store().list_master(now_ms()).unwrap().len(), 1);

        // Exactly one EntryDeleted, to A's group only.
        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, Audience::Group(a));
    }

    #[test]
    fn clear_empties_and_notifies_group() {
        let (engine, sink) = engine();
        let a = ident("a@x.com");
        engine.connect(&a, ConnectionId::next()).unwrap();
        engine.capture(entry()).unwrap();
        engine.capture(entry()).unwrap();
        sink.clear();

        assert_eq!(engine.clear(&a).unwrap(), 2);
        assert!(engine.store().list_inbox(&a, now_ms()).unwrap().is_empty());
        assert_eq!(
            sink.events_for(&Audience::Group(a)),
            vec![ServerEvent::AllCleared]
        );
    }

    #[test]
    fn restore_matches_master_exactly() {
        let (engine, sink) = engine();
        let a = ident("a@x.com");
        let kept = engine.capture(entry()).unwrap();
        let deleted = engine.capture(entry()).unwrap();

        engine.reconcile(&a).unwrap();
        engine.delete_entry(&a, &deleted.id).unwrap();
        sink.clear();

        let restored = engine.restore(&a).unwrap();
        let master = engine.store().list_master(now_ms()).unwrap();
        assert_eq!(restored, master);
        assert_eq!(engine.store().list_inbox(&a, now_ms()).unwrap(), master);
        assert!(master.iter().any(|e| e.id == kept.id));
        assert!(master.iter().any(|e| e.id == deleted.id));

        match &sink.events_for(&Audience::Group(a))[0] {
            ServerEvent::AllRestored { entries } => assert_eq!(entries, &master),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn failed_connect_leaves_identity_unregistered() {
        let sink = Arc::new(MockSink::new());
        let backend = Arc::new(MemoryBackend::new());
        let store = WebhookStore::new(Arc::clone(&backend));
        let engine = SyncEngine::new(store, Arc::clone(&sink));
        let a = ident("a@x.com");

        backend.set_fail_all(true);
        assert!(engine.connect(&a, ConnectionId::next()).is_err());

        // The registration was rolled back, so later captures do not fan
        // out to an unwatched inbox.
        assert!(!engine.registry().is_active(&a));
        backend.set_fail_all(false);
        engine.capture(entry()).unwrap();
        assert!(engine.store().list_inbox(&a, now_ms()).unwrap().is_empty());

        // A later successful connect registers and reconciles normally.
        assert_eq!(engine.connect(&a, ConnectionId::next()).unwrap(), 1);
        assert!(engine.registry().is_active(&a));
    }

    #[test]
    fn fanout_failure_for_one_identity_does_not_fail_capture() {
        let sink = Arc::new(MockSink::new());
        let backend = Arc::new(MemoryBackend::new());
        let store = WebhookStore::new(Arc::clone(&backend));
        let engine = SyncEngine::new(store, Arc::clone(&sink));

        let a = ident("a@x.com");
        let b = ident("b@x.com");
        engine.connect(&a, ConnectionId::next()).unwrap();
        engine.connect(&b, ConnectionId::next()).unwrap();

        backend.fail_partition(hookbin_store::Partition::Inbox(a.clone()));
        let stored = engine.capture(entry()).unwrap();

        // Master and B were written; A was skipped but the capture and the
        // broadcast still happened.
        assert_eq!(engine.store().list_master(now_ms()).unwrap().len(), 1);
        assert_eq!(engine.store().list_inbox(&b, now_ms()).unwrap().len(), 1);
        assert!(engine.store().list_inbox(&a, now_ms()).unwrap().is_empty());
        assert!(sink
            .deliveries()
            .iter()
            .any(|(aud, e)| *aud == Audience::Broadcast
                && *e == ServerEvent::NewWebhook { entry: stored.clone() }));

        // A heals on its next reconnect.
        backend.heal_partition(&hookbin_store::Partition::Inbox(a.clone()));
        assert_eq!(engine.reconcile(&a).unwrap(), 1);
    }
}
