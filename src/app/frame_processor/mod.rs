// SPDX-License-Identifier: GPL-3.0-only

//! Frame analysis used by camera streams
//!
//! Detectors run on the stream thread of a backend and turn frames into
//! detection results. Currently implements QR code detection.

pub mod tasks;
pub mod types;

pub use tasks::QrDetector;
pub use tasks::qr_detector;
pub use types::{FrameRegion, QrDetection};
