// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend handle shared between the UI loop and background tasks
//!
//! The manager provides:
//! - Cheap cloning into `spawn_blocking` closures
//! - Uniform logging around every backend call

use super::CameraBackend;
use super::types::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Camera backend manager
///
/// Thread-safe and can be shared across threads.
#[derive(Clone)]
pub struct CameraBackendManager {
    backend: Arc<dyn CameraBackend>,
}

impl CameraBackendManager {
    /// Wrap a backend
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        info!(backend = backend.name(), "Creating camera backend manager");
        Self { backend }
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Check whether camera access is granted
    pub fn has_permission(&self) -> bool {
        self.backend.has_permission()
    }

    /// Request camera access
    pub fn request_permission(&self) -> BackendResult<bool> {
        info!("Requesting camera permission");
        let result = self.backend.request_permission();
        match &result {
            Ok(granted) => info!(granted, "Permission request finished"),
            Err(e) => warn!(error = %e, "Permission request failed"),
        }
        result
    }

    /// Enumerate available cameras
    pub fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras = self.backend.enumerate_cameras();
        if cameras.is_empty() {
            Err(BackendError::DeviceNotFound("No cameras found".to_string()))
        } else {
            Ok(cameras)
        }
    }

    /// Look up the device for a facing direction
    pub fn device(&self, facing: Facing) -> Option<CameraDevice> {
        let device = self.backend.device(facing);
        match &device {
            Some(d) => debug!(
                %facing,
                device = %d.name,
                has_flash = d.has_flash,
                "Device resolved"
            ),
            None => debug!(%facing, "No device available"),
        }
        device
    }

    /// Capture a photo
    pub fn take_photo(
        &self,
        device: &CameraDevice,
        options: &TakePhotoOptions,
    ) -> BackendResult<PhotoFile> {
        info!(device = %device.name, flash = %options.flash, "Taking photo");
        self.backend.take_photo(device, options)
    }

    /// Start a preview/analysis stream
    pub fn open_stream(
        &self,
        device: &CameraDevice,
        analysis: StreamAnalysis,
    ) -> BackendResult<EventReceiver> {
        info!(
            device = %device.name,
            codes = analysis.codes.len(),
            faces = ?analysis.faces,
            "Opening camera stream"
        );
        self.backend.open_stream(device, analysis)
    }
}

impl std::fmt::Debug for CameraBackendManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraBackendManager")
            .field("backend", &self.backend.name())
            .field("permission", &self.backend.has_permission())
            .finish()
    }
}
