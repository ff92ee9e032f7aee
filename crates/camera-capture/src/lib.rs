//! Camera Capture for Presence Check-ins
//!
//! Owns the front-facing video stream for one check-in session and turns it
//! into downscaled still frames for analysis:
//! - Camera session acquisition and idempotent release
//! - Still-frame sampling on a warm-up gated schedule
//! - Replay backend that plays back images from disk

pub mod frame;
pub mod replay;
pub mod sampler;
pub mod session;

pub use frame::{CaptureFrame, Region};
pub use replay::ReplayCamera;
pub use sampler::{AnalysisResolution, FrameSampler, SamplingSchedule};
pub use session::{CameraBackend, CameraSession, StreamHandle, StreamInfo};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera acquisition errors.
///
/// All of these are terminal for the current check-in session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera found")]
    DeviceNotFound,

    #[error("Camera is in use by another application")]
    DeviceBusy,

    #[error("Camera error: {0}")]
    Unknown(String),
}

impl CameraError {
    /// Human-readable explanation shown next to the manual check-in button
    pub fn reason(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied => {
                "Camera access was not allowed. You can still check in with the button."
            }
            CameraError::DeviceNotFound => "No camera was found on this device.",
            CameraError::DeviceBusy => "The camera is being used by another app.",
            CameraError::Unknown(_) => "The camera could not be started.",
        }
    }
}

/// Which way the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Selfie camera
    #[default]
    User,
    /// Rear camera
    Environment,
}

/// Stream request sent to the platform when acquiring the camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamRequest {
    /// Camera facing
    pub facing: FacingMode,
    /// Ideal capture width
    pub ideal_width: u32,
    /// Ideal capture height
    pub ideal_height: u32,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self::front()
    }
}

impl StreamRequest {
    /// Portrait selfie stream used for check-ins
    pub fn front() -> Self {
        Self {
            facing: FacingMode::User,
            ideal_width: 480,
            ideal_height: 640,
        }
    }
}
