//! # hookbin server
//!
//! The service layer in front of the sync engine:
//! - public capture-request parsing (any method, any path under the webhook
//!   prefix, optional trailing channel segment),
//! - identity verification (token → principal email) and the allow-list
//!   access policy,
//! - identity-scoped read/management operations and push-channel command
//!   dispatch,
//! - the scheduled master-expiry sweep task.
//!
//! HTTP routing and the concrete push transport live outside this crate;
//! everything here is framework-agnostic and exercised directly by tests.

mod auth;
mod capture;
mod config;
mod error;
mod service;
mod sweep;

pub use auth::{AccessPolicy, HmacTokenVerifier, Principal, StaticTokenVerifier, TokenVerifier};
pub use capture::CaptureRequest;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use service::WebhookService;
pub use sweep::spawn_sweeper;
