//! Scheduled master-expiry sweep.

use hookbin_model::now_ms;
use hookbin_store::{StoreBackend, WebhookStore};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Spawns the periodic master sweep.
///
/// One task runs for the lifetime of the returned handle, deleting expired
/// master rows every `interval`. Each run completes before the next tick is
/// awaited, so runs never overlap. Per-identity inboxes are not swept;
/// their expiry is enforced at read time.
pub fn spawn_sweeper<B: StoreBackend + 'static>(
    store: WebhookStore<B>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would sweep at startup; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.sweep_expired_master(now_ms()) {
                Ok(0) => {}
                Ok(deleted) => info!(deleted, "swept expired master entries"),
                Err(err) => error!(%err, "master sweep failed"),
            }
        }
    })
}
