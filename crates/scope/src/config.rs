//! Scope-management configuration.
//!
//! YAML model mirroring the deployed `scope_management` settings file; a
//! missing file falls back to defaults, a malformed one fails at load time.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use tessera_core::{CoreError, CoreResult};

/// Settings for the periodic reconciliation sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub batch_size: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 30,
            batch_size: 100,
        }
    }
}

/// Settings for per-request scope version checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionCheckingConfig {
    pub enabled: bool,
    /// A session whose last successful check is older than this is flagged
    /// by the sweep even if its version still matches (drift/clock-skew
    /// defense).
    pub max_age_minutes: i64,
    pub check_on_api_request: bool,
}

impl Default for VersionCheckingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_minutes: 30,
            check_on_api_request: true,
        }
    }
}

/// Settings for proactive session invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInvalidationConfig {
    pub enabled: bool,
    pub grace_period_minutes: i64,
    pub notify_before_invalidation: bool,
}

impl Default for SessionInvalidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grace_period_minutes: 5,
            notify_before_invalidation: true,
        }
    }
}

/// Top-level scope-management configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub polling: PollingConfig,
    pub version_checking: VersionCheckingConfig,
    pub session_invalidation: SessionInvalidationConfig,
}

impl ScopeConfig {
    /// Parse the YAML settings document.
    pub fn from_yaml(yaml: &str) -> CoreResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::configuration(format!("scope config: {e}")))
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::seconds(self.polling.interval_seconds as i64)
    }

    pub fn max_scope_check_age(&self) -> Duration {
        Duration::minutes(self.version_checking.max_age_minutes)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::minutes(self.session_invalidation.grace_period_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_settings() {
        let config = ScopeConfig::default();
        assert!(config.polling.enabled);
        assert_eq!(config.polling.interval_seconds, 30);
        assert_eq!(config.polling.batch_size, 100);
        assert_eq!(config.max_scope_check_age(), Duration::minutes(30));
        assert_eq!(config.grace_period(), Duration::minutes(5));
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let config = ScopeConfig::from_yaml(
            r#"
version_checking:
  max_age_minutes: 1
"#,
        )
        .unwrap();
        assert_eq!(config.max_scope_check_age(), Duration::minutes(1));
        assert_eq!(config.polling.interval_seconds, 30);
    }

    #[test]
    fn malformed_yaml_is_a_configuration_error() {
        let err = ScopeConfig::from_yaml("polling: [not, a, map]").unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
