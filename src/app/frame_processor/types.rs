// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let fw = frame_width.max(1) as f32;
        let fh = frame_height.max(1) as f32;
        Self {
            x: x as f32 / fw,
            y: y as f32 / fh,
            width: width as f32 / fw,
            height: height as f32 / fh,
        }
    }

    /// Center point of the region
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A decoded QR code and where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct QrDetection {
    pub region: FrameRegion,
    pub content: String,
}

impl QrDetection {
    pub fn new(region: FrameRegion, content: String) -> Self {
        Self { region, content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_pixels() {
        let region = FrameRegion::from_pixels(160, 120, 320, 240, 640, 480);
        assert_eq!(region.x, 0.25);
        assert_eq!(region.y, 0.25);
        assert_eq!(region.width, 0.5);
        assert_eq!(region.center(), (0.5, 0.5));
    }

    #[test]
    fn test_region_zero_sized_frame() {
        let region = FrameRegion::from_pixels(0, 0, 0, 0, 0, 0);
        assert_eq!(region.width, 0.0);
    }
}
