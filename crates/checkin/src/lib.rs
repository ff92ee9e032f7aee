//! Face-Presence Check-In
//!
//! Turns a live camera feed into a verified "I am present" signal:
//! - Lighting screen before every analysis call
//! - Independent lighting and detection attempt budgets
//! - One-tap manual fallback that can never fail
//! - Exactly one check-in record per success

pub mod config;
pub mod counter;
pub mod driver;
pub mod machine;
pub mod messages;
pub mod state;
pub mod telemetry;

pub use config::CheckInConfig;
pub use counter::AttemptCounter;
pub use driver::SessionOutcome;
pub use machine::{CheckInStateMachine, TickOutcome};
pub use messages::{Language, MessageCatalog, MessageKey};
pub use state::{ActiveStage, CheckInSessionState, FallbackReason, Indicator, Phase};
pub use telemetry::{BatteryStatus, NoTelemetry, TelemetrySource};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
