//! Camera session lifecycle
//!
//! A [`CameraSession`] owns the platform stream for exactly one check-in
//! attempt. `open` resolves only once the stream reports its metadata and a
//! paintable first frame; `close` is idempotent and also runs on drop so the
//! hardware indicator never outlives the session.

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::CaptureFrame;
use crate::{CameraError, StreamRequest};

/// Properties reported by the platform once a stream is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    /// Actual capture width
    pub width: u32,
    /// Actual capture height
    pub height: u32,
}

/// Handle for an active stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    pub id: Uuid,
    pub width: u32,
    pub height: u32,
    pub opened_at: DateTime<Utc>,
}

/// Platform camera capability.
///
/// `start` must not resolve before the first frame is paintable, otherwise
/// the sampler would capture a blank frame. `stop` must release the hardware
/// stream and any attached video sink, and must be a no-op when nothing is
/// running.
pub trait CameraBackend: Send {
    /// Acquire the camera and wait for the stream to become ready
    fn start(
        &mut self,
        request: &StreamRequest,
    ) -> impl Future<Output = Result<StreamInfo, CameraError>> + Send;

    /// Latest frame from the live stream, `None` while no frame is available
    fn current_frame(&mut self) -> Option<CaptureFrame>;

    /// Release the stream
    fn stop(&mut self);
}

/// Exclusive owner of one camera stream
pub struct CameraSession<B: CameraBackend> {
    backend: B,
    request: StreamRequest,
    stream: Option<StreamHandle>,
    /// Set while `start` is in flight; survives a dropped `open` future
    starting: bool,
}

impl<B: CameraBackend> CameraSession<B> {
    /// Create a closed session
    pub fn new(backend: B, request: StreamRequest) -> Self {
        Self {
            backend,
            request,
            stream: None,
            starting: false,
        }
    }

    /// Acquire the camera.
    ///
    /// Returns the existing handle if the session is already open.
    pub async fn open(&mut self) -> Result<StreamHandle, CameraError> {
        if let Some(handle) = &self.stream {
            debug!("Camera already open ({})", handle.id);
            return Ok(handle.clone());
        }

        info!(
            "Opening {:?} camera at {}x{}",
            self.request.facing, self.request.ideal_width, self.request.ideal_height
        );

        self.starting = true;
        let started = self.backend.start(&self.request).await;
        self.starting = false;

        match started {
            Ok(info) => {
                let handle = StreamHandle {
                    id: Uuid::new_v4(),
                    width: info.width,
                    height: info.height,
                    opened_at: Utc::now(),
                };
                info!("Camera stream {} active ({}x{})", handle.id, info.width, info.height);
                self.stream = Some(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                warn!("Camera acquisition failed: {}", e);
                // Partially started streams must not keep the indicator lit
                self.backend.stop();
                Err(e)
            }
        }
    }

    /// Release the camera. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(handle) = self.stream.take() {
            self.backend.stop();
            info!("Camera stream {} released", handle.id);
        } else if self.starting {
            // Acquisition was abandoned mid-flight
            self.starting = false;
            self.backend.stop();
            info!("Abandoned camera acquisition released");
        }
    }

    /// Whether a stream is currently held
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Current stream handle
    pub fn handle(&self) -> Option<&StreamHandle> {
        self.stream.as_ref()
    }

    /// Raw frame from the live stream; `None` when closed or not yet producing
    pub fn frame(&mut self) -> Option<CaptureFrame> {
        if self.stream.is_none() {
            return None;
        }
        self.backend.current_frame()
    }

    /// Underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: CameraBackend> Drop for CameraSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}
