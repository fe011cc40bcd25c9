//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the call.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// A write batch exceeded the backend's transactional ceiling.
    #[error("write batch too large: {size} operations exceeds limit of {limit}")]
    BatchTooLarge {
        /// Number of operations in the rejected batch.
        size: usize,
        /// Maximum operations the backend accepts per batch.
        limit: usize,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::unavailable("connection refused");
        assert_eq!(err.to_string(), "store unavailable: connection refused");

        let err = StoreError::BatchTooLarge {
            size: 600,
            limit: 500,
        };
        assert!(err.to_string().contains("600"));
        assert!(err.to_string().contains("500"));
    }
}
