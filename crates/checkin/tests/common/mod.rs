//! Scripted collaborators for check-in scenarios

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camera_capture::{
    AnalysisResolution, CameraBackend, CameraError, CaptureFrame, StreamInfo, StreamRequest,
};
use checkin::{BatteryStatus, CheckInConfig, CheckInStateMachine, TelemetrySource};
use presence::{DetectionVerdict, DetectorError, DetectorStrategy, FaceAnalyzer};
use storage::{CheckInRecord, NewCheckIn, RecordSink, Repository, StorageError};

pub const USER: &str = "elder-1";
pub const WELL_LIT: [u8; 3] = [150, 120, 100];
pub const DARK: [u8; 3] = [5, 5, 5];
pub const GLARE: [u8; 3] = [250, 250, 250];

/// What the fake camera has done
#[derive(Debug, Default)]
pub struct CameraStats {
    pub starts: AtomicUsize,
    pub releases: AtomicUsize,
    pub frames: AtomicUsize,
    pub streaming: AtomicBool,
}

impl CameraStats {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }
}

/// Camera producing solid frames in a scripted colour order; the last
/// colour repeats
pub struct FakeCamera {
    stats: Arc<CameraStats>,
    colours: Vec<[u8; 3]>,
    cursor: usize,
    fail_with: Option<CameraError>,
}

impl FakeCamera {
    pub fn new(colours: Vec<[u8; 3]>) -> (Self, Arc<CameraStats>) {
        let stats = Arc::new(CameraStats::default());
        let camera = Self {
            stats: Arc::clone(&stats),
            colours,
            cursor: 0,
            fail_with: None,
        };
        (camera, stats)
    }

    pub fn well_lit() -> (Self, Arc<CameraStats>) {
        Self::new(vec![WELL_LIT])
    }

    pub fn failing(error: CameraError) -> (Self, Arc<CameraStats>) {
        let (mut camera, stats) = Self::well_lit();
        camera.fail_with = Some(error);
        (camera, stats)
    }
}

impl CameraBackend for FakeCamera {
    async fn start(&mut self, _request: &StreamRequest) -> Result<StreamInfo, CameraError> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_with.clone() {
            return Err(error);
        }
        self.stats.streaming.store(true, Ordering::SeqCst);
        Ok(StreamInfo { width: 48, height: 64 })
    }

    fn current_frame(&mut self) -> Option<CaptureFrame> {
        if !self.stats.is_streaming() {
            return None;
        }
        let colour = *self.colours.get(self.cursor).or(self.colours.last())?;
        self.cursor += 1;
        self.stats.frames.fetch_add(1, Ordering::SeqCst);
        Some(CaptureFrame::solid(48, 64, colour))
    }

    fn stop(&mut self) {
        if self.stats.streaming.swap(false, Ordering::SeqCst) {
            self.stats.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Analyzer replaying scripted results; answers "no face" once the script runs out
#[derive(Default)]
pub struct ScriptedAnalyzer {
    script: Mutex<VecDeque<Result<DetectionVerdict, DetectorError>>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl ScriptedAnalyzer {
    pub fn new(script: Vec<Result<DetectionVerdict, DetectorError>>) -> Arc<Self> {
        Self::slow(script, Duration::ZERO)
    }

    /// Each analysis takes `latency` of (tokio) time
    pub fn slow(script: Vec<Result<DetectionVerdict, DetectorError>>, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            latency,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceAnalyzer for ScriptedAnalyzer {
    fn strategy(&self) -> DetectorStrategy {
        DetectorStrategy::Remote
    }

    fn resolution(&self) -> AnalysisResolution {
        AnalysisResolution { width: 32, height: 40 }
    }

    async fn analyze(&self, _frame: &CaptureFrame) -> Result<DetectionVerdict, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(no_face()))
    }
}

/// Sink that always fails
pub struct BrokenSink;

impl RecordSink for BrokenSink {
    async fn insert(&self, _check_in: NewCheckIn) -> Result<CheckInRecord, StorageError> {
        Err(StorageError::DatabaseError("connection reset".into()))
    }
}

/// Sink that takes `latency` of (tokio) time before writing to a repository
pub struct SlowSink {
    pub repo: Arc<Repository>,
    latency: Duration,
    inserts: AtomicUsize,
}

impl SlowSink {
    pub fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            repo: Arc::new(Repository::new()),
            latency,
            inserts: AtomicUsize::new(0),
        })
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

impl RecordSink for SlowSink {
    async fn insert(&self, check_in: NewCheckIn) -> Result<CheckInRecord, StorageError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.repo.insert_check_in(check_in)
    }
}

pub struct FixedBattery(pub BatteryStatus);

impl TelemetrySource for FixedBattery {
    fn battery(&self) -> Option<BatteryStatus> {
        Some(self.0)
    }
}

pub fn confirmed(confidence: u8) -> DetectionVerdict {
    DetectionVerdict {
        face_detected: true,
        in_target_region: true,
        confidence,
        guidance: "Perfect! Hold still".into(),
        ..Default::default()
    }
}

pub fn off_center(guidance: &str) -> DetectionVerdict {
    DetectionVerdict {
        face_detected: true,
        in_target_region: false,
        confidence: 80,
        guidance: guidance.into(),
        ..Default::default()
    }
}

pub fn no_face() -> DetectionVerdict {
    DetectionVerdict {
        guidance: "Show your face".into(),
        ..Default::default()
    }
}

pub type Machine = CheckInStateMachine<FakeCamera, Arc<ScriptedAnalyzer>, Arc<Repository>>;

pub struct Harness {
    pub machine: Machine,
    pub camera: Arc<CameraStats>,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub repo: Arc<Repository>,
}

pub fn harness(
    config: CheckInConfig,
    camera: (FakeCamera, Arc<CameraStats>),
    script: Vec<Result<DetectionVerdict, DetectorError>>,
) -> Harness {
    with_analyzer(config, camera, ScriptedAnalyzer::new(script))
}

pub fn with_analyzer(
    config: CheckInConfig,
    camera: (FakeCamera, Arc<CameraStats>),
    analyzer: Arc<ScriptedAnalyzer>,
) -> Harness {
    let (camera, stats) = camera;
    let repo = Arc::new(Repository::new());
    let machine = CheckInStateMachine::new(config, USER, camera, Arc::clone(&analyzer), Arc::clone(&repo));
    Harness {
        machine,
        camera: stats,
        analyzer,
        repo,
    }
}
