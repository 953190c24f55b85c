//! Binder configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BinderError, Result};

/// What happens to a binding whose callback panicked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the binding registered and retry it on the next pass.
    #[default]
    Keep,

    /// Unregister the binding after its first failure.
    Remove,
}

/// Configuration for a [`Binder`](crate::Binder).
///
/// ```rust,ignore
/// let config = BinderConfig::from_json(r#"{ "frame_interval": { "secs": 0, "nanos": 8333333 } }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Delay between frames for timer-driven frame sources. Read by
    /// [`TokioFrames::from_config`](crate::TokioFrames::from_config) and
    /// [`Binder::on_tokio`](crate::Binder::on_tokio).
    pub frame_interval: Duration,

    /// Handling of bindings whose callbacks panic.
    pub failure_policy: FailurePolicy,
}

impl BinderConfig {
    /// Roughly 60 frames per second.
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BinderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.frame_interval.is_zero() {
            return Err(BinderError::Config("frame_interval must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            frame_interval: Self::DEFAULT_FRAME_INTERVAL,
            failure_policy: FailurePolicy::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = BinderConfig::from_json("{}").unwrap();
        assert_eq!(config, BinderConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let config = BinderConfig::from_json(
            r#"{ "frame_interval": { "secs": 0, "nanos": 4000000 }, "failure_policy": "remove" }"#,
        )
        .unwrap();

        assert_eq!(config.frame_interval, Duration::from_millis(4));
        assert_eq!(config.failure_policy, FailurePolicy::Remove);
    }

    #[test]
    fn rejects_zero_interval() {
        let err = BinderConfig::from_json(r#"{ "frame_interval": { "secs": 0, "nanos": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, BinderError::Config(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = BinderConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, BinderError::Config(_)));
    }
}
