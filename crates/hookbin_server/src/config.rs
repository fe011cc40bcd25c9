//! Service configuration.

use crate::auth::AccessPolicy;
use std::time::Duration;

/// Configuration for the webhook service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path prefix for the public capture endpoint.
    pub webhook_prefix: String,
    /// Interval between master-expiry sweeps.
    pub sweep_interval: Duration,
    /// Allow-list applied after token verification.
    pub access_policy: AccessPolicy,
}

impl ServerConfig {
    /// Creates a configuration with the given capture prefix.
    #[must_use]
    pub fn new(webhook_prefix: impl Into<String>) -> Self {
        Self {
            webhook_prefix: webhook_prefix.into(),
            sweep_interval: Duration::from_secs(60 * 60),
            access_policy: AccessPolicy::allow_all(),
        }
    }

    /// Sets the sweep interval.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets the access policy.
    #[must_use]
    pub fn with_access_policy(mut self, policy: AccessPolicy) -> Self {
        self.access_policy = policy;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("/webhook")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.webhook_prefix, "/webhook");
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new("/hooks")
            .with_sweep_interval(Duration::from_secs(60))
            .with_access_policy(AccessPolicy::default().with_domain("x.com"));
        assert_eq!(config.webhook_prefix, "/hooks");
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }
}
