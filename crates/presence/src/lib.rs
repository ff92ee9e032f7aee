//! Presence Detection
//!
//! Decides whether a still frame shows the user's face inside the target
//! oval:
//! - Local lighting screen (too dark / too bright) before any remote call
//! - Remote face-analysis service with strict response validation
//! - Local skin-tone heuristic as a network-free alternative

pub mod analysis;
pub mod config;
pub mod detector;
pub mod heuristic;

pub use analysis::{DetectionVerdict, LightingReport, PresenceReport};
pub use config::{DetectorStrategy, HeuristicConfig, PresenceConfig, RemoteDetectorConfig};
pub use detector::{parse_verdict, FaceAnalyzer, LocalPresenceAnalyzer, RemoteFaceDetector};
pub use heuristic::LocalFrameHeuristic;

use thiserror::Error;

/// Presence detection errors.
///
/// Every variant returned from an analysis attempt counts as one failed
/// detection attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("Analysis service unreachable: {0}")]
    Transport(String),

    #[error("Analysis service rate limited")]
    RateLimited,

    #[error("Analysis service quota exhausted")]
    QuotaExhausted,

    #[error("Analysis service returned status {status}")]
    Service { status: u16 },

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("Frame encoding failed: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
