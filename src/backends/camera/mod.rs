// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The application never talks to camera hardware directly. Everything it
//! needs (permission, device lookup, photo capture and passive analysis
//! streams) goes through the [`CameraBackend`] trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ Sessions / Screens  │
//! └──────────┬──────────┘
//!            │  SessionCommand
//!            ▼
//! ┌─────────────────────┐
//! │    SessionDriver    │  ← async execution, spawn_blocking
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← shared handle, logging
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!    ┌───────────────┐
//!    │ VirtualCamera │  ← scripted implementation
//!    └───────────────┘
//! ```

pub mod manager;
pub mod types;

pub use manager::CameraBackendManager;
pub use types::*;

/// Camera capability consumed by the application
///
/// Calls may block (permission prompts, sensor readout, encoding); async
/// callers go through `tokio::task::spawn_blocking`.
pub trait CameraBackend: Send + Sync {
    // ===== Permission =====

    /// Whether camera access is currently granted
    fn has_permission(&self) -> bool;

    /// Ask the user for camera access
    ///
    /// # Returns
    /// * `Ok(true)` - Access granted
    /// * `Ok(false)` - Access denied
    /// * `Err(BackendError)` - The request itself failed
    fn request_permission(&self) -> BackendResult<bool>;

    // ===== Enumeration =====

    /// Enumerate all cameras known to this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Look up the device for a facing direction
    ///
    /// Returns `None` when no such device exists or access is not granted.
    fn device(&self, facing: Facing) -> Option<CameraDevice>;

    // ===== Capture =====

    /// Capture a single photo and write it to disk
    ///
    /// # Returns
    /// * `Ok(PhotoFile)` - Photo saved
    /// * `Err(BackendError::FlashUnsupported)` - Flash requested but the driver has none
    /// * `Err(BackendError)` - Capture failed for another reason
    fn take_photo(&self, device: &CameraDevice, options: &TakePhotoOptions)
    -> BackendResult<PhotoFile>;

    // ===== Preview & analysis =====

    /// Start streaming preview frames and analysis results for a device
    ///
    /// The stream stops when the returned receiver is dropped.
    fn open_stream(
        &self,
        device: &CameraDevice,
        analysis: StreamAnalysis,
    ) -> BackendResult<EventReceiver>;

    // ===== Metadata =====

    /// Backend name for logs and the device list
    fn name(&self) -> &str;
}
