//! Session driver
//!
//! Runs the state machine on a cancellable repeating timer. The ticker is
//! created when scanning begins, so the warm-up is measured from camera
//! activation; ticks that come due during a slow analysis are dropped.
//! Cancelling abandons an analysis in flight, but never a check-in that
//! has already entered success.

use camera_capture::CameraBackend;
use presence::FaceAnalyzer;
use storage::RecordSink;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::machine::{CheckInStateMachine, TickOutcome};
use crate::state::{FallbackReason, Phase};

/// How a driven session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Presence confirmed and camera released
    CheckedIn,
    /// Automated path ended; waiting for the manual button
    ManualFallback(FallbackReason),
    /// Screen closed before the check-in finished
    Cancelled,
}

impl<B, A, S> CheckInStateMachine<B, A, S>
where
    B: CameraBackend,
    A: FaceAnalyzer,
    S: RecordSink,
{
    /// Start (or retry) a session and sample until success, fallback or cancel.
    ///
    /// Every exit path leaves the camera released.
    pub async fn run(&mut self, cancel: &CancellationToken) -> SessionOutcome {
        let started = tokio::select! {
            phase = self.start() => Some(phase),
            _ = cancel.cancelled() => None,
        };
        match started {
            None => {
                self.close();
                return SessionOutcome::Cancelled;
            }
            Some(Phase::ManualFallback) => return self.fallback_outcome(),
            Some(Phase::Active(_)) => {}
            Some(phase) => {
                debug!("Session not started ({:?})", phase);
                return SessionOutcome::Cancelled;
            }
        }

        let states = self.subscribe();
        let mut ticker = self.config().schedule(self.strategy()).ticker();
        loop {
            let ticked = tokio::select! {
                _ = ticker.tick() => true,
                _ = cancel.cancelled() => false,
            };
            if !ticked {
                self.close();
                return SessionOutcome::Cancelled;
            }

            let outcome = {
                let tick = self.tick();
                tokio::pin!(tick);
                let finished = tokio::select! {
                    outcome = &mut tick => Some(outcome),
                    _ = cancel.cancelled() => None,
                };
                // Success was already shown; the record must still be written
                let shown_success = states.borrow().phase == Phase::Success;
                match finished {
                    Some(outcome) => Some(outcome),
                    None if shown_success => {
                        debug!("Cancelled while recording check-in, finishing insert");
                        Some(tick.await)
                    }
                    None => None,
                }
            };
            let Some(outcome) = outcome else {
                self.close();
                return SessionOutcome::Cancelled;
            };

            match outcome {
                TickOutcome::CheckedIn => {
                    // Keep the camera view up briefly so the success is visible
                    tokio::select! {
                        _ = tokio::time::sleep(self.config().release_delay()) => {}
                        _ = cancel.cancelled() => {}
                    }
                    self.release_camera();
                    info!("Check-in complete, camera released");
                    return SessionOutcome::CheckedIn;
                }
                TickOutcome::FellBack(reason) => return SessionOutcome::ManualFallback(reason),
                TickOutcome::Inactive => return SessionOutcome::Cancelled,
                TickOutcome::NoFrame
                | TickOutcome::LightingFailure
                | TickOutcome::DetectionFailure
                | TickOutcome::Adjusting => {}
            }
        }
    }

    /// Show the success confirmation, then return to idle
    pub async fn hold_confirmation(&mut self) {
        if self.phase() == Phase::Success {
            tokio::time::sleep(self.config().success_display()).await;
            self.finish_display();
        }
    }

    fn fallback_outcome(&self) -> SessionOutcome {
        match &self.state().fallback_reason {
            Some(reason) => SessionOutcome::ManualFallback(reason.clone()),
            None => SessionOutcome::ManualFallback(FallbackReason::DetectionBudget),
        }
    }
}
