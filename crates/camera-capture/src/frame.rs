//! Still frame types and processing

use base64::Engine;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageBuffer, ImageError, Rgb};

/// Rectangular pixel region inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Region centered in a `frame_width` x `frame_height` frame covering
    /// `fraction` of each dimension. Never empty for a non-empty frame.
    pub fn centered(frame_width: u32, frame_height: u32, fraction: f32) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        let width = ((frame_width as f32 * fraction).round() as u32).clamp(1, frame_width.max(1));
        let height = ((frame_height as f32 * fraction).round() as u32).clamp(1, frame_height.max(1));
        Self {
            x: frame_width.saturating_sub(width) / 2,
            y: frame_height.saturating_sub(height) / 2,
            width,
            height,
        }
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Downscaled RGB still captured from the live stream
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture time
    pub captured_at: DateTime<Utc>,
    /// Sequence number within the session
    pub sequence: u32,
}

impl CaptureFrame {
    /// Create a frame from raw RGB data.
    ///
    /// Returns `None` for empty dimensions or a buffer that does not hold
    /// exactly `width * height` RGB pixels.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            captured_at: Utc::now(),
            sequence: 0,
        })
    }

    /// Frame filled with a single color
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            data,
            width,
            height,
            captured_at: Utc::now(),
            sequence: 0,
        }
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Iterate the pixels of a region, clipped to the frame
    pub fn region_pixels(&self, region: Region) -> impl Iterator<Item = [u8; 3]> + '_ {
        let x_end = region.x.saturating_add(region.width).min(self.width);
        let y_end = region.y.saturating_add(region.height).min(self.height);
        (region.y..y_end).flat_map(move |y| {
            (region.x..x_end).filter_map(move |x| self.get_pixel(x, y))
        })
    }

    /// Resize frame using triangle filtering
    pub fn resize(&self, new_width: u32, new_height: u32) -> CaptureFrame {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }

        let data = match ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(
            self.width,
            self.height,
            self.data.as_slice(),
        ) {
            Some(img) => {
                image::imageops::resize(&img, new_width, new_height, FilterType::Triangle)
                    .into_raw()
            }
            None => vec![0; new_width as usize * new_height as usize * 3],
        };

        CaptureFrame {
            data,
            width: new_width,
            height: new_height,
            captured_at: self.captured_at,
            sequence: self.sequence,
        }
    }

    /// Encode as a `data:image/jpeg;base64,...` URI for upload
    pub fn to_jpeg_data_uri(&self, quality: u8) -> Result<String, ImageError> {
        let img = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(
            self.width,
            self.height,
            self.data.as_slice(),
        )
        .ok_or_else(|| {
            ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)).encode_image(&img)?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&jpeg);
        Ok(format!("data:image/jpeg;base64,{encoded}"))
    }
}
