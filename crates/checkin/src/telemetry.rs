//! Device telemetry attached to check-ins

use serde::{Deserialize, Serialize};

/// Battery state reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Charge level (0-100)
    pub level: u8,
    pub charging: bool,
}

/// Source of optional device telemetry
pub trait TelemetrySource: Send + Sync {
    /// Current battery state, `None` when the platform does not report one
    fn battery(&self) -> Option<BatteryStatus>;
}

/// Platform without telemetry
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTelemetry;

impl TelemetrySource for NoTelemetry {
    fn battery(&self) -> Option<BatteryStatus> {
        None
    }
}
