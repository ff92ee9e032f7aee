//! Presence detection configuration

use serde::{Deserialize, Serialize};

use crate::DetectorError;

/// Which analyzer confirms presence once lighting is acceptable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorStrategy {
    /// Remote face-analysis service
    #[default]
    Remote,
    /// Local skin-tone heuristic only (no network)
    LocalHeuristic,
}

/// Thresholds for the local pixel heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Fraction of each frame dimension covered by the central analysis region
    pub region_fraction: f32,

    /// Average channel brightness below which a pixel counts as near-black
    pub dark_level: u8,

    /// Average channel brightness above which a pixel counts as near-white
    pub bright_level: u8,

    /// Fraction of near-black (near-white) pixels that makes a frame too dark (bright)
    pub lighting_fraction: f32,

    /// A pixel is non-background if any channel exceeds this
    pub content_level: u8,

    /// Minimum non-background fraction for presence
    pub content_fraction: f32,

    /// Minimum red, green, blue values of a skin-tone pixel
    pub skin_min_rgb: [u8; 3],

    /// Minimum skin-tone fraction for presence
    pub skin_fraction: f32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            region_fraction: 0.5,
            dark_level: 40,
            bright_level: 220,
            lighting_fraction: 0.8,
            content_level: 30,
            content_fraction: 0.4,
            skin_min_rgb: [60, 40, 20],
            skin_fraction: 0.05,
        }
    }
}

impl HeuristicConfig {
    /// Stricter presence thresholds (more manual fallbacks, fewer false check-ins)
    pub fn strict() -> Self {
        Self {
            content_fraction: 0.5,
            skin_fraction: 0.1,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), DetectorError> {
        let fractions = [
            ("region_fraction", self.region_fraction),
            ("lighting_fraction", self.lighting_fraction),
            ("content_fraction", self.content_fraction),
            ("skin_fraction", self.skin_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) || (name == "region_fraction" && value == 0.0) {
                return Err(DetectorError::Config(format!("{name} out of range: {value}")));
            }
        }
        if self.dark_level >= self.bright_level {
            return Err(DetectorError::Config(format!(
                "dark_level {} must be below bright_level {}",
                self.dark_level, self.bright_level
            )));
        }
        Ok(())
    }
}

/// Remote face-analysis service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteDetectorConfig {
    /// Analysis endpoint URL
    pub endpoint: String,

    /// API key sent as bearer token and `apikey` header
    pub api_key: Option<String>,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// JPEG quality of uploaded frames (1-100)
    pub jpeg_quality: u8,
}

impl Default for RemoteDetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:54321/functions/v1/face-detect".to_string(),
            api_key: None,
            timeout_secs: 10,
            jpeg_quality: 70,
        }
    }
}

/// Presence detection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub strategy: DetectorStrategy,
    pub heuristic: HeuristicConfig,
    pub remote: RemoteDetectorConfig,
}

impl PresenceConfig {
    /// Check invariants
    pub fn validate(&self) -> Result<(), DetectorError> {
        self.heuristic.validate()?;
        if self.strategy == DetectorStrategy::Remote {
            if self.remote.endpoint.trim().is_empty() {
                return Err(DetectorError::Config("remote endpoint is empty".into()));
            }
            if self.remote.timeout_secs == 0 {
                return Err(DetectorError::Config("remote timeout must be positive".into()));
            }
            if !(1..=100).contains(&self.remote.jpeg_quality) {
                return Err(DetectorError::Config(format!(
                    "jpeg_quality out of range: {}",
                    self.remote.jpeg_quality
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PresenceConfig::default().validate().is_ok());
        let strict = PresenceConfig {
            heuristic: HeuristicConfig::strict(),
            ..Default::default()
        };
        assert!(strict.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_levels() {
        let config = PresenceConfig {
            heuristic: HeuristicConfig {
                dark_level: 200,
                bright_level: 100,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DetectorError::Config(_))));
    }

    #[test]
    fn test_remote_requires_endpoint() {
        let mut config = PresenceConfig::default();
        config.remote.endpoint = "  ".into();
        assert!(config.validate().is_err());

        // Endpoint irrelevant for the local strategy
        config.strategy = DetectorStrategy::LocalHeuristic;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_names() {
        let strategy: DetectorStrategy = serde_json::from_str("\"local_heuristic\"").unwrap();
        assert_eq!(strategy, DetectorStrategy::LocalHeuristic);
    }
}
