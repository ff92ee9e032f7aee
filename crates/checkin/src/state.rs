//! Check-in session state

use camera_capture::CameraError;
use serde::Serialize;

/// Sub-state while the automated check is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActiveStage {
    /// Waiting for the camera stream
    CameraStarting,
    /// Sampling and analyzing frames
    Scanning,
}

/// Finite state of a check-in session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Active(ActiveStage),
    /// Check-in recorded; returns to idle after the confirmation display
    Success,
    /// Automated path given up; only the manual button remains
    ManualFallback,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Active(_))
    }
}

/// Colour of the target-oval indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Indicator {
    #[default]
    Neutral,
    /// Face seen but needs repositioning
    Adjusting,
    Failure,
    Success,
}

/// Why the automated path ended in manual fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FallbackReason {
    /// Camera could not be acquired
    Camera(#[serde(serialize_with = "serialize_camera_error")] CameraError),
    /// Too many too-dark/too-bright frames
    LightingBudget,
    /// Too many no-face frames or analysis errors
    DetectionBudget,
}

fn serialize_camera_error<S: serde::Serializer>(
    error: &CameraError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// Everything a UI needs to render the check-in screen
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CheckInSessionState {
    pub phase: Phase,

    /// Last status or guidance text
    pub guidance: String,

    pub indicator: Indicator,

    /// Detection attempts left before manual fallback
    pub attempts_remaining: u32,

    /// Set while in manual fallback
    pub fallback_reason: Option<FallbackReason>,
}
