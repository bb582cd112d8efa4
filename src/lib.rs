// SPDX-License-Identifier: GPL-3.0-only

//! Camera Showcase - photo capture, code scanning and face-triggered capture
//!
//! This library provides the capture flows of the Camera Showcase
//! application, independent of how they are presented.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture sessions, permission gate, navigation and screens
//! - [`backends`]: Camera backend abstraction and the scripted virtual camera
//! - [`pipelines`]: Photo encoding and saving
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo directories and captured image descriptors
//! - [`terminal`]: Interactive terminal front-end
//!
//! # Example
//!
//! ```ignore
//! // Interactive terminal UI:
//! //   camera-showcase
//! // Headless scan against a scripted scene:
//! //   camera-showcase --scene scene.json scan --timeout 10
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::QrDetection;
pub use app::{CaptureSession, DetectionSource, SessionMessage, SessionOutput};
pub use config::Config;
pub use errors::{AppError, AppResult};
