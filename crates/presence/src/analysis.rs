//! Detection results

use serde::{Deserialize, Serialize};

/// Result of one analysis pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionVerdict {
    /// A human face is visible
    pub face_detected: bool,

    /// The face sits inside the on-screen target oval
    pub in_target_region: bool,

    /// Frame is too dark to analyze
    pub is_too_dark: bool,

    /// Frame is washed out
    pub is_too_bright: bool,

    /// Confidence that a real face is present (0-100)
    pub confidence: u8,

    /// User-facing guidance; opaque, empty when the analyzer has none
    pub guidance: String,
}

impl DetectionVerdict {
    /// Partial verdict from a lighting screen; presence fields stay defaulted
    pub fn from_lighting(report: &LightingReport) -> Self {
        Self {
            is_too_dark: report.is_too_dark,
            is_too_bright: report.is_too_bright,
            ..Default::default()
        }
    }

    /// Face present, framed, and confident enough to check in
    pub fn is_confirmed(&self, success_confidence: u8) -> bool {
        self.face_detected && self.in_target_region && self.confidence >= success_confidence
    }

    /// Either lighting flag is set
    pub fn has_lighting_problem(&self) -> bool {
        self.is_too_dark || self.is_too_bright
    }
}

/// Output of the local lighting screen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightingReport {
    pub is_too_dark: bool,
    pub is_too_bright: bool,
    /// Fraction of near-black pixels in the central region
    pub dark_fraction: f32,
    /// Fraction of near-white pixels in the central region
    pub bright_fraction: f32,
}

impl LightingReport {
    /// Frame is worth analyzing
    pub fn is_adequate(&self) -> bool {
        !self.is_too_dark && !self.is_too_bright
    }
}

/// Output of the local presence heuristic
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PresenceReport {
    pub looks_present: bool,
    /// Fraction of non-background pixels
    pub content_fraction: f32,
    /// Fraction of skin-tone pixels
    pub skin_fraction: f32,
}
