//! Check-in configuration

use std::time::Duration;

use camera_capture::{SamplingSchedule, StreamRequest};
use presence::DetectorStrategy;
use serde::{Deserialize, Serialize};

use crate::messages::Language;
use crate::ConfigError;

/// Check-in flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInConfig {
    /// Too dark / too bright frames tolerated before manual fallback
    pub max_lighting_failures: u32,

    /// No-face frames and analysis errors tolerated before manual fallback
    pub max_detection_failures: u32,

    /// Minimum verdict confidence (0-100) that counts as present
    pub success_confidence: u8,

    /// Delay after camera activation before the first sample (milliseconds)
    pub warmup_ms: u64,

    /// Time between samples with the remote analyzer (milliseconds)
    pub remote_interval_ms: u64,

    /// Time between samples with the local heuristic (milliseconds)
    pub local_interval_ms: u64,

    /// Camera stays visible this long after success (milliseconds)
    pub release_delay_ms: u64,

    /// Success confirmation shown this long before returning to idle (milliseconds)
    pub success_display_ms: u64,

    /// Stream requested from the camera
    pub camera: StreamRequest,

    /// Attach battery telemetry to check-in records
    pub share_battery: bool,

    /// Status message language
    pub language: Language,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            max_lighting_failures: 2,
            max_detection_failures: 2,
            success_confidence: 60,
            warmup_ms: 2000,
            remote_interval_ms: 3000,
            local_interval_ms: 4000,
            release_delay_ms: 500,
            success_display_ms: 3000,
            camera: StreamRequest::front(),
            share_battery: false,
            language: Language::English,
        }
    }
}

impl CheckInConfig {
    /// More attempts before falling back to the manual button
    pub fn lenient() -> Self {
        Self {
            max_lighting_failures: 3,
            max_detection_failures: 3,
            ..Default::default()
        }
    }

    /// Sampling schedule for the given analyzer strategy
    pub fn schedule(&self, strategy: DetectorStrategy) -> SamplingSchedule {
        let interval_ms = match strategy {
            DetectorStrategy::Remote => self.remote_interval_ms,
            DetectorStrategy::LocalHeuristic => self.local_interval_ms,
        };
        SamplingSchedule {
            warmup: Duration::from_millis(self.warmup_ms),
            interval: Duration::from_millis(interval_ms),
        }
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    /// Check invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lighting_failures == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_lighting_failures",
                value: "0".into(),
            });
        }
        if self.max_detection_failures == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_detection_failures",
                value: "0".into(),
            });
        }
        if self.success_confidence > 100 {
            return Err(ConfigError::OutOfRange {
                field: "success_confidence",
                value: self.success_confidence.to_string(),
            });
        }
        for (field, value) in [
            ("remote_interval_ms", self.remote_interval_ms),
            ("local_interval_ms", self.local_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: value.to_string(),
                });
            }
        }
        if self.camera.ideal_width == 0 || self.camera.ideal_height == 0 {
            return Err(ConfigError::Invalid("camera resolution must be non-zero".into()));
        }
        Ok(())
    }
}
