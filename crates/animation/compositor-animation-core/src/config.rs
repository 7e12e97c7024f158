//! Scheduler configuration: the host's animation-speed multiplier and the
//! test-mode switch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a [`SchedulerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scheduler config json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid duration scale: {scale} (must be finite and >= 0)")]
    InvalidDurationScale { scale: f32 },
}

/// Configuration injected into an [`AnimationScheduler`](crate::AnimationScheduler).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Multiplier applied to every task's duration and start delay.
    /// Mirrors the platform animation-speed setting; 0 disables animations.
    pub duration_scale: f32,

    /// When set, newly started tasks are fast-forwarded to completion
    /// synchronously.
    pub test_mode: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            duration_scale: 1.0,
            test_mode: false,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration with test mode enabled.
    pub fn testing() -> Self {
        Self {
            test_mode: true,
            ..Self::default()
        }
    }

    pub fn with_duration_scale(mut self, scale: f32) -> Self {
        self.duration_scale = sanitize_scale(scale);
        self
    }

    pub fn with_test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.duration_scale.is_finite() || self.duration_scale < 0.0 {
            return Err(ConfigError::InvalidDurationScale {
                scale: self.duration_scale,
            });
        }
        Ok(())
    }
}

/// Non-finite scales fall back to 1.0, negative ones clamp to 0.
pub(crate) fn sanitize_scale(scale: f32) -> f32 {
    if !scale.is_finite() {
        1.0
    } else {
        scale.max(0.0)
    }
}
