//! Configuration for the refresh orchestrator.

use std::env;
use std::time::Duration;

/// Default deadline for one combined oracle assessment, in seconds.
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 20;

/// Default maximum length of the alert feed.
pub const DEFAULT_ALERT_CAP: usize = 50;

/// Refresh configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Deadline for a single supplier's assessment. Expiry counts as a failure.
    pub oracle_timeout: Duration,

    /// Alert feed length; older entries beyond it are dropped.
    pub alert_cap: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            oracle_timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
            alert_cap: DEFAULT_ALERT_CAP,
        }
    }
}

impl RefreshConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CHAINGUARD_ORACLE_TIMEOUT_SECS` - per-supplier deadline (default: 20)
    /// - `CHAINGUARD_ALERT_CAP` - alert feed length (default: 50)
    pub fn from_env() -> Self {
        let oracle_timeout_secs = env::var("CHAINGUARD_ORACLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_ORACLE_TIMEOUT_SECS);

        let alert_cap = env::var("CHAINGUARD_ALERT_CAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ALERT_CAP);

        Self {
            oracle_timeout: Duration::from_secs(oracle_timeout_secs),
            alert_cap,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> RefreshConfigBuilder {
        RefreshConfigBuilder::default()
    }
}

/// Builder for RefreshConfig.
#[derive(Debug, Default)]
pub struct RefreshConfigBuilder {
    config: RefreshConfig,
}

impl RefreshConfigBuilder {
    /// Set the per-supplier oracle deadline.
    pub fn oracle_timeout(mut self, timeout: Duration) -> Self {
        self.config.oracle_timeout = timeout;
        self
    }

    /// Set the alert feed length.
    pub fn alert_cap(mut self, cap: usize) -> Self {
        self.config.alert_cap = cap;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RefreshConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RefreshConfig::default();
        assert_eq!(config.oracle_timeout, Duration::from_secs(20));
        assert_eq!(config.alert_cap, 50);
    }

    #[test]
    fn test_builder() {
        let config = RefreshConfig::builder()
            .oracle_timeout(Duration::from_millis(250))
            .alert_cap(5)
            .build();
        assert_eq!(config.oracle_timeout, Duration::from_millis(250));
        assert_eq!(config.alert_cap, 5);
    }
}
