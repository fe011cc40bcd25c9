//! Error types for the service layer.

use thiserror::Error;

/// Result type for service operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested entry is not in the caller's inbox.
    #[error("not found: {0}")]
    NotFound(String),

    /// No verified identity accompanied the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The identity is verified but not on the allow-list.
    #[error("forbidden: {identity} is not permitted")]
    Forbidden {
        /// The rejected identity.
        identity: String,
    },

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] hookbin_store::StoreError),

    /// The token claim was not a usable identity.
    #[error("invalid identity claim: {0}")]
    InvalidIdentity(#[from] hookbin_model::IdentityError),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<hookbin_sync::SyncError> for ApiError {
    fn from(err: hookbin_sync::SyncError) -> Self {
        match err {
            hookbin_sync::SyncError::Store(e) => ApiError::Store(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    /// HTTP status equivalent for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::Unauthorized(_) | ApiError::InvalidIdentity(_) => 401,
            ApiError::Forbidden { .. } => 403,
            ApiError::Store(_) => 503,
            ApiError::Internal(_) => 500,
        }
    }

    /// Returns true if the caller is at fault (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
