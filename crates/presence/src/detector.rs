//! Face analyzers
//!
//! Two strategies answer "is someone in the oval": the remote
//! face-analysis service and the local skin-tone heuristic. Callers pick one
//! explicitly when building the check-in flow.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use camera_capture::{AnalysisResolution, CaptureFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::DetectionVerdict;
use crate::config::{DetectorStrategy, HeuristicConfig, RemoteDetectorConfig};
use crate::heuristic::LocalFrameHeuristic;
use crate::DetectorError;

/// Analyzer that turns a still frame into a detection verdict
pub trait FaceAnalyzer: Send + Sync {
    /// Which strategy this analyzer implements
    fn strategy(&self) -> DetectorStrategy;

    /// Resolution frames should be sampled at for this analyzer
    fn resolution(&self) -> AnalysisResolution;

    /// Analyze one frame
    fn analyze(
        &self,
        frame: &CaptureFrame,
    ) -> impl Future<Output = Result<DetectionVerdict, DetectorError>> + Send;
}

impl<T: FaceAnalyzer> FaceAnalyzer for Arc<T> {
    fn strategy(&self) -> DetectorStrategy {
        (**self).strategy()
    }

    fn resolution(&self) -> AnalysisResolution {
        (**self).resolution()
    }

    fn analyze(
        &self,
        frame: &CaptureFrame,
    ) -> impl Future<Output = Result<DetectionVerdict, DetectorError>> + Send {
        (**self).analyze(frame)
    }
}

/// Request body of the face-analysis service
#[derive(Debug, Serialize)]
struct FaceDetectRequest<'a> {
    image: &'a str,
}

/// Response body of the face-analysis service.
///
/// `face_detected` and `confidence` are required; the flags and guidance may
/// be omitted by the service and default to false/empty.
#[derive(Debug, Deserialize)]
struct FaceDetectResponse {
    face_detected: bool,
    #[serde(default)]
    face_in_oval: bool,
    #[serde(default)]
    is_dark: bool,
    #[serde(default)]
    is_bright: bool,
    #[serde(default)]
    guidance: String,
    confidence: f64,
}

impl TryFrom<FaceDetectResponse> for DetectionVerdict {
    type Error = DetectorError;

    fn try_from(raw: FaceDetectResponse) -> Result<Self, Self::Error> {
        if !raw.confidence.is_finite() || !(0.0..=100.0).contains(&raw.confidence) {
            return Err(DetectorError::MalformedResponse(format!(
                "confidence out of range: {}",
                raw.confidence
            )));
        }
        Ok(DetectionVerdict {
            face_detected: raw.face_detected,
            in_target_region: raw.face_in_oval,
            is_too_dark: raw.is_dark,
            is_too_bright: raw.is_bright,
            confidence: raw.confidence.round() as u8,
            guidance: raw.guidance.trim().to_string(),
        })
    }
}

/// Validate a service response body into a verdict
pub fn parse_verdict(body: &[u8]) -> Result<DetectionVerdict, DetectorError> {
    let raw: FaceDetectResponse = serde_json::from_slice(body)
        .map_err(|e| DetectorError::MalformedResponse(e.to_string()))?;
    DetectionVerdict::try_from(raw)
}

/// Map a non-success HTTP status to its error kind
pub fn status_error(status: u16) -> DetectorError {
    match status {
        429 => DetectorError::RateLimited,
        402 => DetectorError::QuotaExhausted,
        status => DetectorError::Service { status },
    }
}

/// Client for the remote face-analysis service
#[derive(Debug, Clone)]
pub struct RemoteFaceDetector {
    config: RemoteDetectorConfig,
    client: reqwest::Client,
}

impl RemoteFaceDetector {
    pub fn new(config: RemoteDetectorConfig) -> Result<Self, DetectorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DetectorError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl FaceAnalyzer for RemoteFaceDetector {
    fn strategy(&self) -> DetectorStrategy {
        DetectorStrategy::Remote
    }

    fn resolution(&self) -> AnalysisResolution {
        AnalysisResolution::REMOTE
    }

    async fn analyze(&self, frame: &CaptureFrame) -> Result<DetectionVerdict, DetectorError> {
        let image = frame
            .to_jpeg_data_uri(self.config.jpeg_quality)
            .map_err(|e| DetectorError::Encoding(e.to_string()))?;

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&FaceDetectRequest { image: &image });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        debug!("Sending frame {} ({} bytes) for analysis", frame.sequence, image.len());
        let response = request
            .send()
            .await
            .map_err(|e| DetectorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error = status_error(status.as_u16());
            warn!("Face analysis rejected: {}", error);
            return Err(error);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DetectorError::Transport(e.to_string()))?;
        parse_verdict(&body)
    }
}

/// Presence check using only the local skin-tone heuristic
#[derive(Debug, Clone, Default)]
pub struct LocalPresenceAnalyzer {
    heuristic: LocalFrameHeuristic,
}

impl LocalPresenceAnalyzer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self {
            heuristic: LocalFrameHeuristic::new(config),
        }
    }
}

impl FaceAnalyzer for LocalPresenceAnalyzer {
    fn strategy(&self) -> DetectorStrategy {
        DetectorStrategy::LocalHeuristic
    }

    fn resolution(&self) -> AnalysisResolution {
        AnalysisResolution::LOCAL
    }

    async fn analyze(&self, frame: &CaptureFrame) -> Result<DetectionVerdict, DetectorError> {
        let presence = self.heuristic.screen_presence(frame);
        debug!(
            "Local presence: content={:.2} skin={:.2} present={}",
            presence.content_fraction, presence.skin_fraction, presence.looks_present
        );
        // The heuristic is binary and only samples the central region
        Ok(DetectionVerdict {
            face_detected: presence.looks_present,
            in_target_region: presence.looks_present,
            confidence: if presence.looks_present { 100 } else { 0 },
            ..Default::default()
        })
    }
}
