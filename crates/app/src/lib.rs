//! Wellcheck terminal application
//!
//! Wires the camera, presence analyzer, check-in state machine, lockdown
//! and record store into a single interactive check-in.

pub mod config;
pub mod logging;
pub mod platform;

pub use config::{AppConfig, AppConfigError};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use platform::{SysfsBattery, TerminalPlatform};
