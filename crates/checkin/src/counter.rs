//! Attempt budgets

/// Session-scoped failure counters.
///
/// Lighting and detection failures are counted independently; exhausting
/// either budget ends the automated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptCounter {
    lighting_failures: u32,
    detection_failures: u32,
    max_lighting_failures: u32,
    max_detection_failures: u32,
}

impl AttemptCounter {
    pub fn new(max_lighting_failures: u32, max_detection_failures: u32) -> Self {
        Self {
            lighting_failures: 0,
            detection_failures: 0,
            max_lighting_failures,
            max_detection_failures,
        }
    }

    /// Count a too-dark/too-bright frame. Returns true once the budget is used up.
    pub fn record_lighting_failure(&mut self) -> bool {
        self.lighting_failures = self.lighting_failures.saturating_add(1);
        self.lighting_exhausted()
    }

    /// Count a no-face verdict or analysis error. Returns true once the budget is used up.
    pub fn record_detection_failure(&mut self) -> bool {
        self.detection_failures = self.detection_failures.saturating_add(1);
        self.detection_exhausted()
    }

    pub fn lighting_exhausted(&self) -> bool {
        self.lighting_failures >= self.max_lighting_failures
    }

    pub fn detection_exhausted(&self) -> bool {
        self.detection_failures >= self.max_detection_failures
    }

    pub fn lighting_failures(&self) -> u32 {
        self.lighting_failures
    }

    pub fn detection_failures(&self) -> u32 {
        self.detection_failures
    }

    /// Detection attempts left before fallback
    pub fn detection_attempts_remaining(&self) -> u32 {
        self.max_detection_failures.saturating_sub(self.detection_failures)
    }

    /// Start a fresh attempt cycle
    pub fn reset(&mut self) {
        self.lighting_failures = 0;
        self.detection_failures = 0;
    }
}
