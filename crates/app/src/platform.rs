//! Terminal platform capabilities

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use checkin::{BatteryStatus, TelemetrySource};
use lockdown::{Capabilities, PlatformEffects};
use tracing::debug;

/// Lockdown effects for a terminal session.
///
/// "Vibration" rings the terminal bell; there is no fullscreen. The
/// navigation guard is a flag the Ctrl-C handler consults.
#[derive(Debug, Default)]
pub struct TerminalPlatform {
    guard: AtomicBool,
}

impl TerminalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaving should be confirmed first
    pub fn navigation_guarded(&self) -> bool {
        self.guard.load(Ordering::SeqCst)
    }
}

impl PlatformEffects for TerminalPlatform {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            vibration: true,
            fullscreen: false,
            navigation_guard: true,
        }
    }

    fn vibrate(&self, pattern_ms: &[u64]) {
        // One bell per "on" segment
        let bells = pattern_ms.iter().step_by(2).count();
        let mut stderr = std::io::stderr();
        for _ in 0..bells {
            let _ = stderr.write_all(b"\x07");
        }
        let _ = stderr.flush();
    }

    fn cancel_vibration(&self) {}

    fn is_fullscreen(&self) -> bool {
        false
    }

    fn request_fullscreen(&self) {}

    fn exit_fullscreen(&self) {}

    fn set_navigation_guard(&self, enabled: bool) {
        debug!("Navigation guard {}", if enabled { "on" } else { "off" });
        self.guard.store(enabled, Ordering::SeqCst);
    }
}

/// Battery telemetry from Linux `power_supply` sysfs
#[derive(Debug, Clone)]
pub struct SysfsBattery {
    root: PathBuf,
}

impl Default for SysfsBattery {
    fn default() -> Self {
        Self::new("/sys/class/power_supply")
    }
}

impl SysfsBattery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_supply(dir: &Path) -> Option<BatteryStatus> {
        let capacity = std::fs::read_to_string(dir.join("capacity")).ok()?;
        let level: u8 = capacity.trim().parse().ok()?;
        let status = std::fs::read_to_string(dir.join("status")).unwrap_or_default();
        let charging = matches!(status.trim(), "Charging" | "Full");
        Some(BatteryStatus {
            level: level.min(100),
            charging,
        })
    }
}

impl TelemetrySource for SysfsBattery {
    fn battery(&self) -> Option<BatteryStatus> {
        let mut batteries: Vec<PathBuf> = std::fs::read_dir(&self.root)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("BAT"))
            })
            .collect();
        batteries.sort();
        batteries.iter().find_map(|dir| Self::read_supply(dir))
    }
}
