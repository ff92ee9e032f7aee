//! Still-frame sampling from the live stream

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::frame::CaptureFrame;
use crate::session::{CameraBackend, CameraSession};

/// Resolution frames are downscaled to before analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResolution {
    pub width: u32,
    pub height: u32,
}

impl AnalysisResolution {
    /// Upload size for remote analysis
    pub const REMOTE: Self = Self { width: 320, height: 400 };
    /// Size for pure local pixel heuristics
    pub const LOCAL: Self = Self { width: 160, height: 200 };
}

/// Warm-up gated sampling schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSchedule {
    /// Delay after the camera becomes active before the first sample
    pub warmup: Duration,
    /// Time between samples
    pub interval: Duration,
}

impl SamplingSchedule {
    /// Ticker whose first tick fires after the warm-up.
    ///
    /// Ticks missed while an analysis is in flight are skipped, never queued.
    pub fn ticker(&self) -> Interval {
        let period = self.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + self.warmup, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }
}

/// Captures downscaled stills from a camera session
#[derive(Debug)]
pub struct FrameSampler {
    resolution: AnalysisResolution,
    sequence: u32,
}

impl FrameSampler {
    pub fn new(resolution: AnalysisResolution) -> Self {
        Self {
            resolution,
            sequence: 0,
        }
    }

    /// Analysis resolution
    pub fn resolution(&self) -> AnalysisResolution {
        self.resolution
    }

    /// Capture one still.
    ///
    /// Returns `None` while the stream is not producing frames; the caller
    /// skips the cycle.
    pub fn capture_still<B: CameraBackend>(
        &mut self,
        session: &mut CameraSession<B>,
    ) -> Option<CaptureFrame> {
        let Some(raw) = session.frame() else {
            debug!("No frame available, skipping sample");
            return None;
        };

        self.sequence = self.sequence.wrapping_add(1);
        let mut still = raw.resize(self.resolution.width, self.resolution.height);
        still.captured_at = Utc::now();
        still.sequence = self.sequence;
        Some(still)
    }
}
