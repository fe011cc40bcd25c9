//! Active-connection registry.

use hookbin_model::Identity;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Reference-counted set of identities with at least one live connection.
///
/// One count per identity, incremented per connection, so several tabs or
/// devices for the same identity share a single counter. Purely in-memory
/// and process-local: a restart loses all active state, which is acceptable
/// because clients reconnect and re-register themselves.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    counts: Mutex<HashMap<Identity, usize>>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more live connection for an identity.
    ///
    /// Returns the new count.
    pub fn increment(&self, identity: &Identity) -> usize {
        let mut counts = self.counts.lock();
        let count = counts.entry(identity.clone()).or_insert(0);
        *count += 1;
        *count
    }

    /// Records one connection gone for an identity.
    ///
    /// Floors at zero: decrementing an absent or zero-count identity is a
    /// no-op. Returns the remaining count.
    pub fn decrement(&self, identity: &Identity) -> usize {
        let mut counts = self.counts.lock();
        match counts.get_mut(identity) {
            Some(count) if *count > 1 => {
                *count -= 1;
                *count
            }
            Some(_) => {
                counts.remove(identity);
                0
            }
            None => 0,
        }
    }

    /// Returns true if the identity has at least one live connection.
    pub fn is_active(&self, identity: &Identity) -> bool {
        self.counts.lock().contains_key(identity)
    }

    /// Snapshot of every currently active identity.
    ///
    /// The snapshot is taken at call time; identities that connect after it
    /// was taken are not included.
    pub fn active_identities(&self) -> Vec<Identity> {
        self.counts.lock().keys().cloned().collect()
    }

    /// Number of active identities.
    pub fn len(&self) -> usize {
        self.counts.lock().len()
    }

    /// Returns true if no identity is active.
    pub fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }
}
