//! Identity type: a normalized email address.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error produced when constructing an [`Identity`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The input was empty after trimming.
    #[error("identity is empty")]
    Empty,

    /// The input does not look like an email address.
    #[error("identity is not an email address: {0}")]
    NotAnEmail(String),
}

/// A verified principal's email, normalized for use as a key.
///
/// Identities serve three roles: key into the active-connection registry,
/// partition key for the per-user inbox, and push-channel group name. No
/// separate identity record exists; an identity is derived per-request from
/// a verified token claim.
///
/// Normalization is trim + ASCII lowercase, so `" User@X.com "` and
/// `"user@x.com"` are the same identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from a raw email claim, normalizing it.
    pub fn new(raw: &str) -> Result<Self, IdentityError> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(IdentityError::Empty);
        }
        if !normalized.contains('@') {
            return Err(IdentityError::NotAnEmail(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the email, if present.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.0.rsplit_once('@').map(|(_, d)| d).filter(|d| !d.is_empty())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
