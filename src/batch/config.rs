//! Coordinator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::policy::Policy;
use crate::error::CoordinatorError;

/// Configuration for a batch coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of buffered items that triggers an immediate flush
    pub limit: usize,
    /// Deadline window measured according to `policy`
    pub duration: Duration,
    /// Whether the deadline is fixed at the first item or extended per item
    pub policy: Policy,
    /// Capacity of the command channel feeding the coordinator task
    pub channel_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            duration: Duration::from_millis(5),
            policy: Policy::FirstItem,
            channel_size: 1024,
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig from application config values.
    pub fn from_config(limit: usize, duration_ms: u64, policy: Policy) -> Self {
        Self {
            limit,
            duration: Duration::from_millis(duration_ms),
            policy,
            ..Self::default()
        }
    }

    /// Reject configurations the coordinator cannot honor.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if self.limit == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "limit must be positive".into(),
            ));
        }
        if self.duration.is_zero() {
            return Err(CoordinatorError::InvalidConfig(
                "duration must be positive".into(),
            ));
        }
        if self.channel_size == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "channel_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BatchConfig::default();
        assert_eq!(config.limit, 100);
        assert_eq!(config.policy, Policy::FirstItem);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = BatchConfig::from_config(10, 250, Policy::LastItem);
        assert_eq!(config.limit, 10);
        assert_eq!(config.duration, Duration::from_millis(250));
        assert_eq!(config.policy, Policy::LastItem);
        assert_eq!(config.channel_size, 1024);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let zero_limit = BatchConfig::from_config(0, 10, Policy::FirstItem);
        assert!(matches!(
            zero_limit.validate(),
            Err(CoordinatorError::InvalidConfig(_))
        ));

        let zero_duration = BatchConfig::from_config(10, 0, Policy::FirstItem);
        assert!(zero_duration.validate().is_err());

        let zero_channel = BatchConfig {
            channel_size: 0,
            ..BatchConfig::default()
        };
        assert!(zero_channel.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BatchConfig =
            serde_json::from_str(r#"{"limit": 20, "policy": "last-item"}"#).unwrap();
        assert_eq!(config.limit, 20);
        assert_eq!(config.policy, Policy::LastItem);
        assert_eq!(config.duration, Duration::from_millis(5));
    }
}
