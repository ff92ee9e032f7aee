//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `WELLCHECK__*` environment variables
//! (e.g. `WELLCHECK__CHECKIN__SHARE_BATTERY=true`).

use std::path::{Path, PathBuf};

use checkin::CheckInConfig;
use lockdown::LockdownConfig;
use presence::PresenceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogConfig;

/// Configuration errors
#[derive(Error, Debug)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid check-in settings: {0}")]
    CheckIn(#[from] checkin::ConfigError),

    #[error("Invalid presence settings: {0}")]
    Presence(#[from] presence::DetectorError),

    #[error("Invalid lockdown settings: {0}")]
    Lockdown(#[from] lockdown::LockdownError),

    #[error("user_id must not be empty")]
    MissingUser,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// User checking in
    pub user_id: String,

    /// Directory of still images played back as the camera
    pub frames_dir: PathBuf,

    #[serde(flatten)]
    pub log: LogConfig,

    pub checkin: CheckInConfig,
    pub presence: PresenceConfig,
    pub lockdown: LockdownConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: "elder".to_string(),
            frames_dir: PathBuf::from("frames"),
            log: LogConfig::default(),
            checkin: CheckInConfig::default(),
            presence: PresenceConfig::default(),
            lockdown: LockdownConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (or `wellcheck.toml` in the working directory if
    /// present) plus environment overrides, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, AppConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("wellcheck").required(false),
        };

        let config: AppConfig = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("WELLCHECK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(AppConfigError::MissingUser);
        }
        self.checkin.validate()?;
        self.presence.validate()?;
        self.lockdown.validate()?;
        Ok(())
    }
}
