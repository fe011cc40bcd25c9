//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] hookbin_store::StoreError),

    /// A connection attempted an invalid lifecycle transition.
    #[error("invalid connection transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}
