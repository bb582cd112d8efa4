// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources for the virtual camera
//!
//! Frames either come from image files (decoded once, reused for every
//! repetition) or are generated as a slowly moving gradient so the preview
//! visibly updates.

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use std::path::Path;
use tracing::info;

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path, sequence: u64) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    info!(width, height, "Image loaded successfully");

    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw(), sequence))
}

/// Generate a placeholder frame
///
/// The gradient shifts with `sequence`, and frames with faces in view get a
/// bright disc per face so the terminal preview shows something to look at.
pub fn placeholder_frame(width: u32, height: u32, sequence: u64, faces: u32) -> CameraFrame {
    let shift = (sequence % 256) as u32;
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255 / width.max(1)) + shift) % 256;
            let g = (y * 255 / height.max(1)) % 256;
            let b = (255 + 256 - shift) % 256;
            data.extend_from_slice(&[r as u8, g as u8, b as u8, 255]);
        }
    }

    for (cx, cy, radius) in face_discs(width, height, faces) {
        paint_disc(&mut data, width, height, cx, cy, radius);
    }

    CameraFrame::from_rgba(width, height, data, sequence)
}

/// Centers and radius of the synthetic faces, spread across the frame
pub(crate) fn face_discs(width: u32, height: u32, faces: u32) -> Vec<(u32, u32, u32)> {
    if faces == 0 {
        return Vec::new();
    }
    let slot = width / faces;
    let radius = (slot.min(height) / 4).max(1);
    (0..faces)
        .map(|i| (slot * i + slot / 2, height / 2, radius))
        .collect()
}

fn paint_disc(data: &mut [u8], width: u32, height: u32, cx: u32, cy: u32, radius: u32) {
    let r2 = (radius * radius) as i64;
    let y0 = cy.saturating_sub(radius);
    let y1 = (cy + radius).min(height.saturating_sub(1));
    let x0 = cx.saturating_sub(radius);
    let x1 = (cx + radius).min(width.saturating_sub(1));

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as i64 - cx as i64;
            let dy = y as i64 - cy as i64;
            if dx * dx + dy * dy <= r2 {
                let idx = ((y * width + x) * 4) as usize;
                data[idx..idx + 3].copy_from_slice(&[240, 200, 170]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_dimensions() {
        let frame = placeholder_frame(16, 8, 3, 0);
        assert_eq!(frame.width, 16);
        assert_eq!(frame.data.len(), 16 * 8 * 4);
        assert_eq!(frame.sequence, 3);
    }

    #[test]
    fn test_placeholder_paints_faces() {
        let frame = placeholder_frame(40, 20, 0, 1);
        assert_eq!(frame.pixel_rgb(20, 10), (240, 200, 170));
    }

    #[test]
    fn test_face_discs_spread() {
        let discs = face_discs(300, 100, 3);
        assert_eq!(discs.len(), 3);
        assert_eq!(discs[0].0, 50);
        assert_eq!(discs[2].0, 250);
        assert!(face_discs(300, 100, 0).is_empty());
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let result = load_image_as_frame(Path::new("/nonexistent/frame.png"), 0);
        assert!(matches!(result, Err(BackendError::Other(_))));
    }
}
