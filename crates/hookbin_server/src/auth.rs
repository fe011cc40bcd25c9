//! Identity verification and the access allow-list.
//!
//! Token verification is a seam: the service only needs "verify token →
//! principal with email". [`HmacTokenVerifier`] is the bundled
//! implementation; deployments fronted by an external identity provider
//! implement [`TokenVerifier`] over that provider instead.
//!
//! ## Token format
//!
//! `email|timestamp|signature` where `timestamp` is unix millis at issue
//! time and `signature` is hex-encoded HMAC-SHA256 over `email|timestamp`.

use crate::error::{ApiError, ApiResult};
use hmac::{Hmac, Mac};
use hookbin_model::{now_ms, Identity};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Email claim from the verified token, not yet normalized.
    pub email: String,
}

/// Verifies an opaque bearer token into a [`Principal`].
pub trait TokenVerifier: Send + Sync {
    /// Verifies a token, returning the principal it asserts.
    fn verify(&self, token: &str) -> ApiResult<Principal>;
}

/// HMAC-SHA256 token verifier with an expiry window.
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
    token_expiry: Duration,
}

impl HmacTokenVerifier {
    /// Creates a verifier with a 24-hour token expiry.
    #[must_use]
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Sets the token expiry window.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }

    /// Issues a token for an email claim.
    #[must_use]
    pub fn issue(&self, email: &str) -> String {
        let timestamp = now_ms();
        let payload = format!("{email}|{timestamp}");
        let signature = self.sign(payload.as_bytes());
        format!("{payload}|{signature}")
    }

    fn sign(&self, data: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(data);
        let bytes = mac.finalize().into_bytes();
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> ApiResult<Principal> {
        let mut parts = token.rsplitn(2, '|');
        let signature = parts.next().unwrap_or_default();
        let payload = parts
            .next()
            .ok_or_else(|| ApiError::Unauthorized("malformed token".into()))?;

        if self.sign(payload.as_bytes()) != signature {
            return Err(ApiError::Unauthorized("invalid signature".into()));
        }

        let (email, timestamp) = payload
            .rsplit_once('|')
            .ok_or_else(|| ApiError::Unauthorized("malformed token payload".into()))?;
        let issued_at: u64 = timestamp
            .parse()
            .map_err(|_| ApiError::Unauthorized("malformed token timestamp".into()))?;

        let expiry_ms = self.token_expiry.as_millis() as u64;
        if now_ms() > issued_at + expiry_ms {
            return Err(ApiError::Unauthorized("token expired".into()));
        }

        Ok(Principal {
            email: email.to_owned(),
        })
    }
}

/// A verifier that accepts any token of the form `email` directly.
///
/// For tests and local development only.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier;

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> ApiResult<Principal> {
        if token.is_empty() {
            return Err(ApiError::Unauthorized("empty token".into()));
        }
        Ok(Principal {
            email: token.to_owned(),
        })
    }
}

/// Allow-list over verified identities.
///
/// An identity passes if its domain is in `allowed_domains` or its full
/// email is in `allowed_emails`. An empty policy admits everyone.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed_domains: Vec<String>,
    allowed_emails: Vec<String>,
}

impl AccessPolicy {
    /// Creates a policy that admits everyone.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Adds an allowed domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.allowed_domains.push(domain.into().to_ascii_lowercase());
        self
    }

    /// Adds an allowed email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.allowed_emails.push(email.into().to_ascii_lowercase());
        self
    }

    /// Returns true if the identity may use the service.
    #[must_use]
    pub fn permits(&self, identity: &Identity) -> bool {
        if self.allowed_domains.is_empty() && self.allowed_emails.is_empty() {
            return true;
        }
        if self
            .allowed_emails
            .iter()
            .any(|email| email == identity.as_str())
        {
            return true;
        }
        identity
            .domain()
            .is_some_and(|domain| self.allowed_domains.iter().any(|d| d == domain))
    }
}
