//! Lockdown
//!
//! Makes sure a due check-in prompt is actually seen: fullscreen
//! presentation, a repeating vibration pattern and a navigation guard, all
//! torn down together when the prompt is no longer outstanding.

mod escalator;

pub use escalator::AttentionEscalator;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Lockdown errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockdownError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Lockdown configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockdownConfig {
    /// Vibration pattern on activation (on/off durations, milliseconds)
    pub initial_pattern_ms: Vec<u64>,

    /// Shorter pattern repeated while active (milliseconds)
    pub repeat_pattern_ms: Vec<u64>,

    /// Time between repeats (milliseconds)
    pub repeat_interval_ms: u64,

    /// Delay before re-requesting fullscreen after the platform exits it (milliseconds)
    pub fullscreen_retry_ms: u64,
}

impl Default for LockdownConfig {
    fn default() -> Self {
        Self {
            initial_pattern_ms: vec![300, 200, 300, 200, 500],
            repeat_pattern_ms: vec![200, 150, 200],
            repeat_interval_ms: 8000,
            fullscreen_retry_ms: 500,
        }
    }
}

impl LockdownConfig {
    /// No vibration; fullscreen and navigation guard only
    pub fn silent() -> Self {
        Self {
            initial_pattern_ms: Vec::new(),
            repeat_pattern_ms: Vec::new(),
            ..Default::default()
        }
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    pub fn fullscreen_retry(&self) -> Duration {
        Duration::from_millis(self.fullscreen_retry_ms)
    }

    /// Check invariants
    pub fn validate(&self) -> Result<(), LockdownError> {
        if self.repeat_interval_ms == 0 {
            return Err(LockdownError::Config("repeat_interval_ms must be positive".into()));
        }
        if self.initial_pattern_ms.len() > 32 || self.repeat_pattern_ms.len() > 32 {
            return Err(LockdownError::Config("vibration pattern too long".into()));
        }
        Ok(())
    }
}

/// Which effects the platform supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub vibration: bool,
    pub fullscreen: bool,
    pub navigation_guard: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            vibration: true,
            fullscreen: true,
            navigation_guard: true,
        }
    }
}

/// Platform primitives used while locked down.
///
/// Calls are only made for capabilities the platform reports; an
/// unsupported effect is skipped, never an error.
pub trait PlatformEffects: Send + Sync + 'static {
    fn capabilities(&self) -> Capabilities;

    /// Vibrate with alternating on/off durations (milliseconds)
    fn vibrate(&self, pattern_ms: &[u64]);

    /// Stop any vibration in progress
    fn cancel_vibration(&self);

    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&self);

    fn exit_fullscreen(&self);

    /// Intercept attempts to leave the check-in screen
    fn set_navigation_guard(&self, enabled: bool);
}
