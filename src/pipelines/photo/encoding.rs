// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Converts RGBA camera frames to JPEG (with quality control) or PNG.

use crate::backends::camera::types::CameraFrame;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    /// MIME type reported for captured images
    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Png => "image/png",
        }
    }

    /// Format of a saved file, judged by its extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(EncodingFormat::Jpeg),
            "png" => Some(EncodingFormat::Png),
            _ => None,
        }
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
        }
    }
}

/// Encoded image data ready for saving
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Default)]
pub struct PhotoEncoder {
    format: EncodingFormat,
    quality: EncodingQuality,
}

impl PhotoEncoder {
    /// Create a new encoder with JPEG format and high quality
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_format(&mut self, format: EncodingFormat) {
        self.format = format;
    }

    pub fn set_quality(&mut self, quality: EncodingQuality) {
        self.quality = quality;
    }

    /// Encode a frame, dropping the alpha channel and any stride padding
    pub fn encode(&self, frame: &CameraFrame) -> Result<EncodedImage, String> {
        let rgb = frame_to_rgb(frame)?;
        let mut data = Vec::new();

        match self.format {
            EncodingFormat::Jpeg => {
                let mut encoder =
                    JpegEncoder::new_with_quality(&mut data, self.quality.jpeg_quality());
                encoder
                    .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                    .map_err(|e| format!("JPEG encoding failed: {}", e))?;
            }
            EncodingFormat::Png => {
                rgb.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
                    .map_err(|e| format!("PNG encoding failed: {}", e))?;
            }
        }

        debug!(
            format = ?self.format,
            bytes = data.len(),
            width = frame.width,
            height = frame.height,
            "Encoded photo"
        );

        Ok(EncodedImage {
            data,
            format: self.format,
            width: frame.width,
            height: frame.height,
        })
    }
}

/// Copy an RGBA frame into a packed RGB image
fn frame_to_rgb(frame: &CameraFrame) -> Result<RgbImage, String> {
    let mut rgb_data = Vec::with_capacity((frame.width * frame.height * 3) as usize);
    for y in 0..frame.height {
        for x in 0..frame.width {
            let (r, g, b) = frame.pixel_rgb(x, y);
            rgb_data.extend_from_slice(&[r, g, b]);
        }
    }
    RgbImage::from_raw(frame.width, frame.height, rgb_data)
        .ok_or_else(|| "Failed to create image".to_string())
}
