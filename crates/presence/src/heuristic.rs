//! Local pixel-statistics heuristics
//!
//! Cheap checks that run before any remote call. Only the central region of
//! the frame is considered; edges are unreliable on handheld selfie shots.

use camera_capture::{CaptureFrame, Region};

use crate::analysis::{LightingReport, PresenceReport};
use crate::config::HeuristicConfig;

/// Lighting screen and crude skin-tone presence estimate
#[derive(Debug, Clone, Default)]
pub struct LocalFrameHeuristic {
    config: HeuristicConfig,
}

impl LocalFrameHeuristic {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    fn region(&self, frame: &CaptureFrame) -> Region {
        Region::centered(frame.width, frame.height, self.config.region_fraction)
    }

    /// Classify the frame as too dark, too bright, or usable
    pub fn screen_lighting(&self, frame: &CaptureFrame) -> LightingReport {
        let (mut dark, mut bright, mut total) = (0usize, 0usize, 0usize);

        for [r, g, b] in frame.region_pixels(self.region(frame)) {
            let brightness = (r as u16 + g as u16 + b as u16) / 3;
            if brightness < self.config.dark_level as u16 {
                dark += 1;
            } else if brightness > self.config.bright_level as u16 {
                bright += 1;
            }
            total += 1;
        }

        if total == 0 {
            return LightingReport::default();
        }

        let dark_fraction = dark as f32 / total as f32;
        let bright_fraction = bright as f32 / total as f32;
        LightingReport {
            is_too_dark: dark_fraction > self.config.lighting_fraction,
            is_too_bright: bright_fraction > self.config.lighting_fraction,
            dark_fraction,
            bright_fraction,
        }
    }

    /// Estimate presence from skin-tone and non-background pixel fractions.
    ///
    /// Both thresholds must pass, so doubtful frames read as absent.
    pub fn screen_presence(&self, frame: &CaptureFrame) -> PresenceReport {
        let [min_r, min_g, min_b] = self.config.skin_min_rgb;
        let level = self.config.content_level;
        let (mut content, mut skin, mut total) = (0usize, 0usize, 0usize);

        for [r, g, b] in frame.region_pixels(self.region(frame)) {
            if r > level || g > level || b > level {
                content += 1;
            }
            if r > min_r && g > min_g && b > min_b && r > g && r > b {
                skin += 1;
            }
            total += 1;
        }

        if total == 0 {
            return PresenceReport::default();
        }

        let content_fraction = content as f32 / total as f32;
        let skin_fraction = skin as f32 / total as f32;
        PresenceReport {
            looks_present: content_fraction > self.config.content_fraction
                && skin_fraction > self.config.skin_fraction,
            content_fraction,
            skin_fraction,
        }
    }
}
