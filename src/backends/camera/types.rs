// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::app::frame_processor::FrameRegion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Direction a camera faces relative to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Selfie camera
    Front,
    /// Main camera on the far side of the device
    #[default]
    Back,
}

impl Facing {
    /// The opposite direction (Back <-> Front)
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    /// Parse a facing direction from a user supplied string
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "front" | "user" | "selfie" => Some(Facing::Front),
            "back" | "rear" | "environment" => Some(Facing::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

/// Flash setting applied to the next photo capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    /// Flash stays dark
    #[default]
    Off,
    /// Flash fires during photo capture
    On,
}

impl FlashMode {
    /// Off -> On -> Off
    pub fn toggled(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self == FlashMode::On
    }
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlashMode::Off => write!(f, "off"),
            FlashMode::On => write!(f, "on"),
        }
    }
}

/// Represents a camera device handle returned by device lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Stable backend identifier
    pub id: String,
    /// Human readable name
    pub name: String,
    pub facing: Facing,
    /// Whether the device reports a flash unit
    pub has_flash: bool,
}

/// Options for a single photo capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TakePhotoOptions {
    pub flash: FlashMode,
    pub shutter_sound: bool,
}

/// A photo written by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    /// Filesystem path of the encoded image
    pub path: PathBuf,
}

/// Barcode symbologies the scanner can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeKind {
    #[serde(rename = "qr")]
    Qr,
    #[serde(rename = "ean-13")]
    Ean13,
}

impl std::fmt::Display for CodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeKind::Qr => write!(f, "qr"),
            CodeKind::Ean13 => write!(f, "ean-13"),
        }
    }
}

/// One decoded code reported by the scanner
///
/// The value can be missing when the symbol was located but its payload
/// could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCode {
    pub kind: CodeKind,
    pub value: Option<String>,
}

impl ScannedCode {
    pub fn new(kind: CodeKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
        }
    }

    /// The decoded value, if present and non-empty
    pub fn decoded(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

/// A detected face
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Normalized bounding box within the frame
    pub bounds: FrameRegion,
}

/// Lightweight description of the frame a detection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    /// Position of the frame in the stream
    pub sequence: u64,
}

impl std::fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame {}x{} #{}", self.width, self.height, self.sequence)
    }
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Position of the frame in the stream
    pub sequence: u64,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>, sequence: u64) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            stride: width * 4,
            sequence,
            captured_at: Instant::now(),
        }
    }

    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            width: self.width,
            height: self.height,
            sequence: self.sequence,
        }
    }

    /// RGB value at the given pixel, clamped to the frame bounds
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 4) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }

    /// Luma (BT.601) at the given pixel
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        let (r, g, b) = self.pixel_rgb(x, y);
        ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
    }
}

/// Which passive analysis a stream should run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamAnalysis {
    /// Code kinds to scan for (empty = scanner off)
    pub codes: Vec<CodeKind>,
    /// Face detection delivery path (None = detector off)
    pub faces: Option<FaceDelivery>,
}

impl StreamAnalysis {
    /// Preview only, no detectors
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.codes.is_empty() || self.faces.is_some()
    }
}

/// How face detections reach the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceDelivery {
    /// Faces are computed by a frame processor and marshaled back per frame
    #[default]
    FrameProcessor,
    /// The detector invokes a callback with the faces and the source frame
    Callback,
}

impl FaceDelivery {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "frame-processor" | "worklet" => Some(FaceDelivery::FrameProcessor),
            "callback" | "direct" => Some(FaceDelivery::Callback),
            _ => None,
        }
    }
}

/// Events delivered by an open camera stream
#[derive(Debug, Clone)]
pub enum CameraEvent {
    /// A new preview frame
    Frame(Arc<CameraFrame>),
    /// Codes seen in the most recent analysed frame (may be empty)
    CodesScanned(Vec<ScannedCode>),
    /// Faces seen in the most recent analysed frame (may be empty)
    FacesDetected {
        faces: Vec<Face>,
        /// Source frame, only attached on the callback delivery path
        frame: Option<FrameInfo>,
    },
    /// Runtime camera error; the stream keeps running
    Error(BackendError),
}

/// Receiver side of a camera stream
pub type EventReceiver = futures::channel::mpsc::Receiver<CameraEvent>;

/// Sender side of a camera stream
pub type EventSender = futures::channel::mpsc::Sender<CameraEvent>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Coarse error classification the capture flow branches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// The device has no usable flash unit
    FlashUnsupported,
    /// The device or its driver failed
    DeviceError,
    /// Anything else
    Unknown,
}

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Capture requested flash but the driver reports no flash unit
    FlashUnsupported,
    /// Camera permission has not been granted
    PermissionDenied,
    /// Camera device not found
    DeviceNotFound(String),
    /// Device or driver failure during an operation
    Device(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl BackendError {
    pub fn kind(&self) -> CaptureErrorKind {
        match self {
            BackendError::FlashUnsupported => CaptureErrorKind::FlashUnsupported,
            BackendError::Device(_) | BackendError::DeviceNotFound(_) => {
                CaptureErrorKind::DeviceError
            }
            BackendError::PermissionDenied | BackendError::IoError(_) | BackendError::Other(_) => {
                CaptureErrorKind::Unknown
            }
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::FlashUnsupported => write!(f, "No flash unit"),
            BackendError::PermissionDenied => write!(f, "Camera permission denied"),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Device(msg) => write!(f, "Device error: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_toggle() {
        assert_eq!(Facing::Back.toggled(), Facing::Front);
        assert_eq!(Facing::Front.toggled(), Facing::Back);
    }

    #[test]
    fn test_flash_toggle() {
        assert_eq!(FlashMode::Off.toggled(), FlashMode::On);
        assert_eq!(FlashMode::On.toggled(), FlashMode::Off);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BackendError::FlashUnsupported.kind(),
            CaptureErrorKind::FlashUnsupported
        );
        assert_eq!(
            BackendError::Device("sensor timeout".into()).kind(),
            CaptureErrorKind::DeviceError
        );
        assert_eq!(
            BackendError::Other("?".into()).kind(),
            CaptureErrorKind::Unknown
        );
    }

    #[test]
    fn test_scanned_code_empty_value_is_not_decoded() {
        let empty = ScannedCode {
            kind: CodeKind::Qr,
            value: Some(String::new()),
        };
        assert_eq!(empty.decoded(), None);
        assert_eq!(ScannedCode::new(CodeKind::Ean13, "123").decoded(), Some("123"));
    }

    #[test]
    fn test_pixel_rgb_respects_stride() {
        let data: Vec<u8> = vec![
            10, 20, 30, 255, // (0,0)
            0, 0, // padding
            40, 50, 60, 255, // (0,1)
            0, 0, // padding
        ];
        let frame = CameraFrame {
            width: 1,
            height: 2,
            data: Arc::from(data.as_slice()),
            stride: 6,
            sequence: 0,
            captured_at: Instant::now(),
        };
        assert_eq!(frame.pixel_rgb(0, 1), (40, 50, 60));
        // Out-of-range coordinates clamp to the last pixel
        assert_eq!(frame.pixel_rgb(5, 9), (40, 50, 60));
    }

    #[test]
    fn test_facing_from_name() {
        assert_eq!(Facing::from_name("Front"), Some(Facing::Front));
        assert_eq!(Facing::from_name("rear"), Some(Facing::Back));
        assert_eq!(Facing::from_name("sideways"), None);
    }
}
