// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! It converts camera frames to grayscale and searches for QR codes,
//! returning their positions and decoded content.

use crate::app::frame_processor::types::{FrameRegion, QrDetection};
use crate::backends::camera::types::CameraFrame;
use tracing::{debug, trace};

/// QR code detector
///
/// Analyzes camera frames to detect and decode QR codes.
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            // QR codes are typically large enough to be detected at 640px
            max_dimension: 640,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Detect QR codes in a camera frame
    ///
    /// CPU bound; callers run it on the stream thread, never on the UI loop.
    pub fn detect(&self, frame: &CameraFrame) -> Vec<QrDetection> {
        let start = std::time::Instant::now();

        let (luma, proc_width, proc_height, scale) = prepare_luma(frame, self.max_dimension);
        trace!(
            proc_width,
            proc_height,
            scale,
            conversion_ms = start.elapsed().as_millis(),
            "Prepared luma plane for processing"
        );

        if proc_width == 0 || proc_height == 0 {
            return Vec::new();
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            proc_width as usize,
            proc_height as usize,
            |x, y| luma[y * proc_width as usize + x],
        );
        let grids = prepared.detect_grids();

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            let content = match grid.decode() {
                Ok((_meta, content)) => content,
                Err(e) => {
                    debug!(error = %e, "Failed to decode QR code");
                    continue;
                }
            };

            let corners: Vec<(i32, i32)> = grid.bounds.iter().map(|p| (p.x, p.y)).collect();
            let region = bounding_region(&corners, scale, frame.width, frame.height);

            debug!(
                content = %content,
                x = region.x,
                y = region.y,
                width = region.width,
                height = region.height,
                "Detected QR code"
            );

            detections.push(QrDetection::new(region, content));
        }

        if !detections.is_empty() {
            debug!(
                count = detections.len(),
                total_ms = start.elapsed().as_millis(),
                "QR detection found codes"
            );
        }

        detections
    }
}

/// Convert a frame to a packed luma plane, downscaling when needed
///
/// Returns (luma, width, height, scale) where scale maps processed
/// coordinates back to frame coordinates.
fn prepare_luma(frame: &CameraFrame, max_dimension: u32) -> (Vec<u8>, u32, u32, f32) {
    let width = frame.width;
    let height = frame.height;

    if width > max_dimension || height > max_dimension {
        let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
        let new_width = ((width as f32 / scale) as u32).max(1);
        let new_height = ((height as f32 / scale) as u32).max(1);
        (
            downscale_luma(frame, new_width, new_height),
            new_width,
            new_height,
            scale,
        )
    } else {
        let mut luma = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                luma.push(frame.luma(x, y));
            }
        }
        (luma, width, height, 1.0)
    }
}

/// Downscale to a luma plane using nearest-neighbour sampling
fn downscale_luma(frame: &CameraFrame, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let x_ratio = frame.width as f32 / dst_width as f32;
    let y_ratio = frame.height as f32 / dst_height as f32;

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);
    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = (x as f32 * x_ratio) as u32;
            let src_y = (y as f32 * y_ratio) as u32;
            result.push(frame.luma(src_x, src_y));
        }
    }
    result
}

/// Axis-aligned region covering the given corner points
fn bounding_region(
    corners: &[(i32, i32)],
    scale: f32,
    frame_width: u32,
    frame_height: u32,
) -> FrameRegion {
    let min_x = corners.iter().map(|c| c.0).min().unwrap_or(0).max(0) as f32 * scale;
    let max_x = corners.iter().map(|c| c.0).max().unwrap_or(0).max(0) as f32 * scale;
    let min_y = corners.iter().map(|c| c.1).min().unwrap_or(0).max(0) as f32 * scale;
    let max_y = corners.iter().map(|c| c.1).max().unwrap_or(0).max(0) as f32 * scale;

    FrameRegion::from_pixels(
        min_x as u32,
        min_y as u32,
        (max_x - min_x) as u32,
        (max_y - min_y) as u32,
        frame_width,
        frame_height,
    )
}

/// RGBA frame showing `text` as a QR code, `scale` pixels per module
#[cfg(test)]
pub(crate) fn qr_code_frame(text: &str, scale: u32) -> CameraFrame {
    const QUIET_ZONE: u32 = 4;

    let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * scale;

    let mut data = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            let (mx, my) = (x / scale, y / scale);
            let inside = (QUIET_ZONE..QUIET_ZONE + modules).contains(&mx)
                && (QUIET_ZONE..QUIET_ZONE + modules).contains(&my);
            let dark = inside
                && colors[((my - QUIET_ZONE) * modules + mx - QUIET_ZONE) as usize]
                    == qrcode::Color::Dark;
            let v = if dark { 0 } else { 255 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    CameraFrame::from_rgba(side, side, data, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, value: u8) -> CameraFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[value, value, value, 255]);
        }
        CameraFrame::from_rgba(width, height, data, 0)
    }

    #[test]
    fn test_blank_frame_has_no_codes() {
        let detector = QrDetector::new();
        assert!(detector.detect(&solid_frame(64, 48, 200)).is_empty());
    }

    #[test]
    fn test_decodes_rendered_qr_code() {
        let frame = qr_code_frame("https://example.com/camera-showcase", 6);
        let detections = QrDetector::new().detect(&frame);

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].content, "https://example.com/camera-showcase");
        let region = &detections[0].region;
        assert!(region.width > 0.5 && region.width <= 1.0);
        assert!(region.x > 0.0 && region.x < 0.25);
    }

    #[test]
    fn test_decodes_after_downscaling() {
        let frame = qr_code_frame("EAN or QR", 12);
        assert!(frame.width > 320);
        let detections = QrDetector::with_max_dimension(320).detect(&frame);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].content, "EAN or QR");
    }

    #[test]
    fn test_prepare_luma_downscales_large_frames() {
        let frame = solid_frame(1280, 720, 128);
        let (luma, w, h, scale) = prepare_luma(&frame, 640);
        assert_eq!(w, 640);
        assert_eq!(h, 360);
        assert_eq!(scale, 2.0);
        assert_eq!(luma.len(), (w * h) as usize);
        assert!(luma.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_prepare_luma_keeps_small_frames() {
        let frame = solid_frame(32, 16, 0);
        let (_, w, h, scale) = prepare_luma(&frame, 640);
        assert_eq!((w, h, scale), (32, 16, 1.0));
    }

    #[test]
    fn test_bounding_region_scales_back() {
        let corners = [(10, 10), (30, 10), (30, 30), (10, 30)];
        let region = bounding_region(&corners, 2.0, 80, 80);
        assert_eq!(region.x, 0.25);
        assert_eq!(region.width, 0.5);
    }
}
