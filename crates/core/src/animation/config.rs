use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(600);
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// What to do with targets that arrive while earlier ones are still waiting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacklogPolicy {
    /// Visit every accepted target in arrival order.
    #[default]
    Fifo,
    /// A newly accepted target replaces whatever is still pending. The segment
    /// currently being animated always runs to completion.
    KeepLatest,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Time spent gliding to each target.
    #[serde(rename = "duration_ms", with = "millis")]
    pub duration: Duration,

    /// Delay between intermediate frames.
    #[serde(rename = "frame_interval_ms", with = "millis")]
    pub frame_interval: Duration,

    pub backlog: BacklogPolicy,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            backlog: BacklogPolicy::default(),
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.duration.is_zero() {
            return Err(CoreError::InvalidConfig(
                "animation duration must be positive".to_string(),
            ));
        }
        if self.frame_interval.is_zero() {
            return Err(CoreError::InvalidConfig(
                "frame interval must be positive".to_string(),
            ));
        }
        if self.frame_interval > self.duration {
            return Err(CoreError::InvalidConfig(format!(
                "frame interval ({:?}) exceeds animation duration ({:?})",
                self.frame_interval, self.duration
            )));
        }

        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnimationConfig::default();

        assert_eq!(config.duration, Duration::from_millis(600));
        assert_eq!(config.frame_interval, Duration::from_millis(16));
        assert_eq!(config.backlog, BacklogPolicy::Fifo);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnimationConfig =
            serde_json::from_str(r#"{"duration_ms": 250, "backlog": "keep_latest"}"#).unwrap();

        assert_eq!(config.duration, Duration::from_millis(250));
        assert_eq!(config.frame_interval, DEFAULT_FRAME_INTERVAL);
        assert_eq!(config.backlog, BacklogPolicy::KeepLatest);
    }

    #[test]
    fn test_validate_rejects_bad_timings() {
        let zero = AnimationConfig {
            duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let slow_frames = AnimationConfig {
            frame_interval: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(slow_frames.validate().is_err());
    }
}
