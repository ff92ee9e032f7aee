//! Replay camera backend
//!
//! Plays back still images instead of a live device. Used by the
//! `wellcheck` binary on machines without a camera and by tests.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::frame::CaptureFrame;
use crate::session::{CameraBackend, StreamInfo};
use crate::{CameraError, StreamRequest};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

enum Source {
    Directory(PathBuf),
    Frames(Vec<CaptureFrame>),
}

/// Camera backend that cycles through pre-recorded frames
pub struct ReplayCamera {
    source: Source,
    loaded: Vec<CaptureFrame>,
    cursor: usize,
    streaming: bool,
}

impl ReplayCamera {
    /// Replay the images in `dir`, in file name order.
    ///
    /// The directory is read when the stream starts, so a missing directory
    /// surfaces as [`CameraError::DeviceNotFound`] at acquisition time.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Directory(dir.into()),
            loaded: Vec::new(),
            cursor: 0,
            streaming: false,
        }
    }

    /// Replay frames already in memory
    pub fn from_frames(frames: Vec<CaptureFrame>) -> Self {
        Self {
            source: Source::Frames(frames),
            loaded: Vec::new(),
            cursor: 0,
            streaming: false,
        }
    }

    /// Whether the replay stream is running
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn load_dir(dir: &Path) -> Result<Vec<CaptureFrame>, CameraError> {
        let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CameraError::DeviceNotFound,
            std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            _ => CameraError::Unknown(e.to_string()),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match image::open(&path) {
                Ok(img) => {
                    let rgb = img.to_rgb8();
                    let (width, height) = rgb.dimensions();
                    if let Some(frame) = CaptureFrame::from_rgb(rgb.into_raw(), width, height) {
                        frames.push(frame);
                    }
                }
                Err(e) => warn!("Skipping unreadable frame {}: {}", path.display(), e),
            }
        }
        Ok(frames)
    }
}

impl CameraBackend for ReplayCamera {
    async fn start(&mut self, request: &StreamRequest) -> Result<StreamInfo, CameraError> {
        let frames = match &self.source {
            Source::Directory(dir) => {
                // Directory listing and decoding are blocking
                let dir = dir.clone();
                tokio::task::spawn_blocking(move || Self::load_dir(&dir))
                    .await
                    .map_err(|e| CameraError::Unknown(e.to_string()))??
            }
            Source::Frames(frames) => frames.clone(),
        };

        let Some(first) = frames.first() else {
            return Err(CameraError::DeviceNotFound);
        };
        let info = StreamInfo {
            width: first.width,
            height: first.height,
        };

        info!(
            "Replay stream started with {} frames (requested {}x{})",
            frames.len(),
            request.ideal_width,
            request.ideal_height
        );
        self.loaded = frames;
        self.cursor = 0;
        self.streaming = true;
        Ok(info)
    }

    fn current_frame(&mut self) -> Option<CaptureFrame> {
        if !self.streaming || self.loaded.is_empty() {
            return None;
        }
        let frame = self.loaded[self.cursor % self.loaded.len()].clone();
        self.cursor = self.cursor.wrapping_add(1);
        Some(frame)
    }

    fn stop(&mut self) {
        if self.streaming {
            debug!("Replay stream stopped");
        }
        self.streaming = false;
        self.loaded.clear();
    }
}
