//! Check-in state machine
//!
//! Every transition goes through `&mut self`, so ticks are serialized by
//! construction: a new capture cannot begin while an analysis is awaited.
//! Entering manual fallback or closing the screen releases the camera
//! immediately; success releases it once the driver's confirmation delay
//! has elapsed.

use camera_capture::{CameraBackend, CameraSession, FrameSampler};
use chrono::Utc;
use presence::{DetectionVerdict, DetectorStrategy, FaceAnalyzer, LocalFrameHeuristic};
use storage::{CheckInRecord, NewCheckIn, RecordSink, StorageError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::CheckInConfig;
use crate::counter::AttemptCounter;
use crate::messages::{MessageCatalog, MessageKey};
use crate::state::{ActiveStage, CheckInSessionState, FallbackReason, Indicator, Phase};
use crate::telemetry::{NoTelemetry, TelemetrySource};

/// What one sampling tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not scanning; nothing was sampled
    Inactive,
    /// Stream produced no frame; cycle skipped
    NoFrame,
    /// Frame too dark or too bright; counted
    LightingFailure,
    /// No face or analysis error; counted
    DetectionFailure,
    /// Face seen but not framed or not confident enough; not counted
    Adjusting,
    /// Presence confirmed and check-in emitted
    CheckedIn,
    /// A budget ran out
    FellBack(FallbackReason),
}

/// Orchestrates camera, lighting screen, analyzer and record sink for one user
pub struct CheckInStateMachine<B, A, S>
where
    B: CameraBackend,
    A: FaceAnalyzer,
    S: RecordSink,
{
    config: CheckInConfig,
    user_id: String,
    camera: CameraSession<B>,
    sampler: FrameSampler,
    heuristic: LocalFrameHeuristic,
    analyzer: A,
    sink: S,
    telemetry: Box<dyn TelemetrySource>,
    messages: MessageCatalog,
    counter: AttemptCounter,
    state: CheckInSessionState,
    state_tx: watch::Sender<CheckInSessionState>,
    /// One-shot guard; reset only when a new session starts
    emitted: bool,
    last_record: Option<CheckInRecord>,
    last_storage_error: Option<StorageError>,
}

impl<B, A, S> CheckInStateMachine<B, A, S>
where
    B: CameraBackend,
    A: FaceAnalyzer,
    S: RecordSink,
{
    pub fn new(
        config: CheckInConfig,
        user_id: impl Into<String>,
        camera: B,
        analyzer: A,
        sink: S,
    ) -> Self {
        let counter = AttemptCounter::new(config.max_lighting_failures, config.max_detection_failures);
        let state = CheckInSessionState {
            attempts_remaining: counter.detection_attempts_remaining(),
            ..Default::default()
        };
        let (state_tx, _) = watch::channel(state.clone());

        Self {
            user_id: user_id.into(),
            camera: CameraSession::new(camera, config.camera.clone()),
            sampler: FrameSampler::new(analyzer.resolution()),
            heuristic: LocalFrameHeuristic::default(),
            analyzer,
            sink,
            telemetry: Box::new(NoTelemetry),
            messages: MessageCatalog::new(config.language),
            counter,
            state,
            state_tx,
            emitted: false,
            last_record: None,
            last_storage_error: None,
            config,
        }
    }

    /// Use a custom lighting screen
    pub fn with_heuristic(mut self, heuristic: LocalFrameHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Battery telemetry source; only read when sharing is enabled
    pub fn with_telemetry(mut self, telemetry: impl TelemetrySource + 'static) -> Self {
        self.telemetry = Box::new(telemetry);
        self
    }

    pub fn config(&self) -> &CheckInConfig {
        &self.config
    }

    pub fn state(&self) -> &CheckInSessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Observe every state change
    pub fn subscribe(&self) -> watch::Receiver<CheckInSessionState> {
        self.state_tx.subscribe()
    }

    pub fn counter(&self) -> &AttemptCounter {
        &self.counter
    }

    pub fn strategy(&self) -> DetectorStrategy {
        self.analyzer.strategy()
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    pub fn camera(&self) -> &CameraSession<B> {
        &self.camera
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Record produced by the last success
    pub fn last_record(&self) -> Option<&CheckInRecord> {
        self.last_record.as_ref()
    }

    /// Sink failure from the last success; the check-in itself still stands
    pub fn last_storage_error(&self) -> Option<&StorageError> {
        self.last_storage_error.as_ref()
    }

    /// Begin a check-in (from idle) or retry one (from manual fallback).
    ///
    /// Resets both budgets and the one-shot guard, then acquires the camera.
    /// A camera error goes straight to manual fallback.
    pub async fn start(&mut self) -> Phase {
        match self.state.phase {
            Phase::Idle | Phase::ManualFallback => {}
            phase => {
                warn!("Ignoring check-in start while {:?}", phase);
                return phase;
            }
        }

        self.counter.reset();
        self.emitted = false;
        self.last_record = None;
        self.last_storage_error = None;
        self.state = CheckInSessionState {
            phase: Phase::Active(ActiveStage::CameraStarting),
            guidance: self.messages.text(MessageKey::ScanPrompt).to_string(),
            indicator: Indicator::Neutral,
            attempts_remaining: self.counter.detection_attempts_remaining(),
            fallback_reason: None,
        };
        info!("Check-in started for {} ({:?} analyzer)", self.user_id, self.analyzer.strategy());
        self.publish();

        match self.camera.open().await {
            Ok(handle) => {
                self.state.phase = Phase::Active(ActiveStage::Scanning);
                self.state.guidance = self.messages.text(MessageKey::PlaceFaceInOval).to_string();
                debug!("Scanning on stream {}", handle.id);
                self.publish();
            }
            Err(e) => {
                warn!("Camera unavailable, falling back to manual check-in: {}", e);
                self.enter_fallback(FallbackReason::Camera(e));
            }
        }
        self.state.phase
    }

    /// Explicit retry from manual fallback
    pub async fn retry(&mut self) -> Phase {
        self.start().await
    }

    /// Run one sampling cycle. Does nothing unless scanning.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.state.phase != Phase::Active(ActiveStage::Scanning) {
            return TickOutcome::Inactive;
        }

        let Some(frame) = self.sampler.capture_still(&mut self.camera) else {
            return TickOutcome::NoFrame;
        };

        let lighting = self.heuristic.screen_lighting(&frame);
        if !lighting.is_adequate() {
            debug!(
                "Frame {} rejected by lighting screen (dark={:.2}, bright={:.2})",
                frame.sequence, lighting.dark_fraction, lighting.bright_fraction
            );
            return self.lighting_failure(&DetectionVerdict::from_lighting(&lighting));
        }

        self.state.guidance = self.messages.text(MessageKey::Scanning).to_string();
        self.publish();

        let verdict = match self.analyzer.analyze(&frame).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Analysis of frame {} failed: {}", frame.sequence, e);
                let message = self.messages.detector_error(&e);
                return self.detection_failure(message);
            }
        };

        debug!(
            "Frame {}: face={} in_oval={} confidence={}",
            frame.sequence, verdict.face_detected, verdict.in_target_region, verdict.confidence
        );

        if verdict.is_confirmed(self.config.success_confidence) {
            self.succeed().await;
            TickOutcome::CheckedIn
        } else if verdict.has_lighting_problem() {
            self.lighting_failure(&verdict)
        } else if !verdict.face_detected {
            let message = self.messages.text(MessageKey::FaceNotDetected);
            self.detection_failure(message)
        } else {
            self.state.guidance = if verdict.guidance.is_empty() {
                self.messages.text(MessageKey::PlaceFaceInOval).to_string()
            } else {
                verdict.guidance
            };
            self.state.indicator = Indicator::Adjusting;
            self.publish();
            TickOutcome::Adjusting
        }
    }

    /// One-tap confirmation. Only valid in manual fallback; never touches
    /// the camera or the analyzer. Returns whether the check-in was accepted.
    pub async fn confirm_manually(&mut self) -> bool {
        if self.state.phase != Phase::ManualFallback {
            warn!("Manual confirmation ignored while {:?}", self.state.phase);
            return false;
        }
        info!("Manual check-in confirmed by {}", self.user_id);
        self.succeed().await;
        self.state.guidance = self.messages.text(MessageKey::CheckedIn).to_string();
        self.publish();
        true
    }

    /// Release the camera stream. Safe to call at any time.
    pub fn release_camera(&mut self) {
        self.camera.close();
    }

    /// The check-in screen was closed
    pub fn close(&mut self) {
        self.camera.close();
        if self.state.phase != Phase::Idle {
            info!("Check-in screen closed while {:?}", self.state.phase);
        }
        self.state.phase = Phase::Idle;
        self.state.indicator = Indicator::Neutral;
        self.state.guidance.clear();
        self.state.fallback_reason = None;
        self.publish();
    }

    /// Confirmation display finished; back to idle
    pub fn finish_display(&mut self) {
        if self.state.phase == Phase::Success {
            self.state.phase = Phase::Idle;
            self.state.indicator = Indicator::Neutral;
            self.state.guidance.clear();
            self.publish();
        }
    }

    fn lighting_failure(&mut self, verdict: &DetectionVerdict) -> TickOutcome {
        let exhausted = self.counter.record_lighting_failure();
        let key = if verdict.is_too_dark {
            MessageKey::TooDark
        } else {
            MessageKey::TooBright
        };
        info!(
            "Lighting failure {}/{}",
            self.counter.lighting_failures(),
            self.config.max_lighting_failures
        );

        if exhausted {
            self.enter_fallback(FallbackReason::LightingBudget);
            return TickOutcome::FellBack(FallbackReason::LightingBudget);
        }
        self.state.guidance = self.messages.text(key).to_string();
        self.state.indicator = Indicator::Failure;
        self.publish();
        TickOutcome::LightingFailure
    }

    fn detection_failure(&mut self, message: &str) -> TickOutcome {
        let exhausted = self.counter.record_detection_failure();
        self.state.attempts_remaining = self.counter.detection_attempts_remaining();
        info!(
            "Detection failure {}/{}",
            self.counter.detection_failures(),
            self.config.max_detection_failures
        );

        if exhausted {
            self.enter_fallback(FallbackReason::DetectionBudget);
            return TickOutcome::FellBack(FallbackReason::DetectionBudget);
        }
        self.state.guidance = format!(
            "{} {}",
            message,
            self.messages.attempts_remaining(self.state.attempts_remaining)
        );
        self.state.indicator = Indicator::Failure;
        self.publish();
        TickOutcome::DetectionFailure
    }

    fn enter_fallback(&mut self, reason: FallbackReason) {
        self.camera.close();
        self.state.guidance = match &reason {
            FallbackReason::Camera(e) => self.messages.camera_error(e).to_string(),
            _ => self.messages.text(MessageKey::UseManualCheckIn).to_string(),
        };
        warn!("Manual fallback for {}: {:?}", self.user_id, reason);
        self.state.phase = Phase::ManualFallback;
        self.state.indicator = Indicator::Failure;
        self.state.attempts_remaining = self.counter.detection_attempts_remaining();
        self.state.fallback_reason = Some(reason);
        self.publish();
    }

    /// Enter success and hand the check-in to the sink, at most once per session
    async fn succeed(&mut self) {
        if self.emitted {
            debug!("Duplicate success suppressed");
            return;
        }
        self.emitted = true;

        self.state.phase = Phase::Success;
        self.state.indicator = Indicator::Success;
        self.state.guidance = self.messages.text(MessageKey::FaceDetected).to_string();
        self.state.fallback_reason = None;
        self.publish();

        let check_in = self.build_check_in();
        match self.sink.insert(check_in).await {
            Ok(record) => {
                info!("Check-in {} recorded for {}", record.id, self.user_id);
                self.last_record = Some(record);
            }
            Err(e) => {
                error!("Failed to record check-in for {}: {}", self.user_id, e);
                self.last_storage_error = Some(e);
            }
        }
    }

    fn build_check_in(&self) -> NewCheckIn {
        let check_in = NewCheckIn::new(self.user_id.clone(), Utc::now());
        if !self.config.share_battery {
            return check_in;
        }
        match self.telemetry.battery() {
            Some(battery) => check_in.with_battery(battery.level.min(100), battery.charging),
            None => check_in,
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
