// SPDX-License-Identifier: GPL-3.0-only

//! One-shot camera permission gate
//!
//! Runs once at startup. Access that is already granted finishes the gate
//! immediately; otherwise exactly one request is made. Whatever the answer,
//! the gate finishes and the app moves on: screens show their own
//! placeholder when access is missing.

use crate::app::notice::Notice;
use crate::backends::camera::CameraBackendManager;
use crate::constants::messages;
use tracing::{debug, info, warn};

/// Camera access as seen by screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionState {
    pub granted: bool,
}

impl PermissionState {
    pub fn granted() -> Self {
        Self { granted: true }
    }

    pub fn denied() -> Self {
        Self { granted: false }
    }
}

/// Result of running the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOutcome {
    pub state: PermissionState,
    /// Shown when access was granted by the request
    pub notice: Option<Notice>,
}

#[derive(Debug, Default)]
pub struct PermissionGate {
    outcome: Option<PermissionOutcome>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of the first run, if the gate has finished
    pub fn outcome(&self) -> Option<&PermissionOutcome> {
        self.outcome.as_ref()
    }

    /// Run the gate; later runs return the first outcome without asking again
    pub async fn run(&mut self, camera: &CameraBackendManager) -> PermissionOutcome {
        if let Some(outcome) = &self.outcome {
            debug!("Permission gate already finished");
            return outcome.clone();
        }

        let outcome = if camera.has_permission() {
            debug!("Camera permission already granted");
            PermissionOutcome {
                state: PermissionState::granted(),
                notice: None,
            }
        } else {
            let camera = camera.clone();
            let answer = tokio::task::spawn_blocking(move || camera.request_permission()).await;
            match answer {
                Ok(Ok(true)) => {
                    info!("Camera permission granted");
                    PermissionOutcome {
                        state: PermissionState::granted(),
                        notice: Some(Notice::info(messages::PERMISSION_GRANTED)),
                    }
                }
                Ok(Ok(false)) => {
                    info!("Camera permission denied");
                    PermissionOutcome {
                        state: PermissionState::denied(),
                        notice: None,
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Camera permission request failed");
                    PermissionOutcome {
                        state: PermissionState::denied(),
                        notice: None,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Permission request task failed");
                    PermissionOutcome {
                        state: PermissionState::denied(),
                        notice: None,
                    }
                }
            }
        };

        self.outcome = Some(outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{
        BackendError, BackendResult, CameraDevice, EventReceiver, Facing, PhotoFile,
        StreamAnalysis, TakePhotoOptions,
    };
    use crate::backends::camera::CameraBackend;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Backend that only answers permission questions
    struct PermissionOnly {
        granted: AtomicBool,
        answer: BackendResult<bool>,
        requests: AtomicUsize,
    }

    impl PermissionOnly {
        fn new(granted: bool, answer: BackendResult<bool>) -> Arc<Self> {
            Arc::new(Self {
                granted: AtomicBool::new(granted),
                answer,
                requests: AtomicUsize::new(0),
            })
        }
    }

    impl CameraBackend for PermissionOnly {
        fn has_permission(&self) -> bool {
            self.granted.load(Ordering::SeqCst)
        }

        fn request_permission(&self) -> BackendResult<bool> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if let Ok(true) = self.answer {
                self.granted.store(true, Ordering::SeqCst);
            }
            self.answer.clone()
        }

        fn enumerate_cameras(&self) -> Vec<CameraDevice> {
            Vec::new()
        }

        fn device(&self, _facing: Facing) -> Option<CameraDevice> {
            None
        }

        fn take_photo(
            &self,
            _device: &CameraDevice,
            _options: &TakePhotoOptions,
        ) -> BackendResult<PhotoFile> {
            Err(BackendError::PermissionDenied)
        }

        fn open_stream(
            &self,
            _device: &CameraDevice,
            _analysis: StreamAnalysis,
        ) -> BackendResult<EventReceiver> {
            Err(BackendError::PermissionDenied)
        }

        fn name(&self) -> &str {
            "permission-only"
        }
    }

    #[tokio::test]
    async fn test_already_granted_skips_request() {
        let backend = PermissionOnly::new(true, Ok(true));
        let camera = CameraBackendManager::new(backend.clone());
        let outcome = PermissionGate::new().run(&camera).await;
        assert!(outcome.state.granted);
        assert!(outcome.notice.is_none());
        assert_eq!(backend.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_grant_shows_notice() {
        let backend = PermissionOnly::new(false, Ok(true));
        let camera = CameraBackendManager::new(backend.clone());
        let outcome = PermissionGate::new().run(&camera).await;
        assert!(outcome.state.granted);
        assert_eq!(
            outcome.notice,
            Some(Notice::info(messages::PERMISSION_GRANTED))
        );
    }

    #[tokio::test]
    async fn test_denial_finishes_without_retry() {
        let backend = PermissionOnly::new(false, Ok(false));
        let camera = CameraBackendManager::new(backend.clone());
        let mut gate = PermissionGate::new();

        let first = gate.run(&camera).await;
        let second = gate.run(&camera).await;
        assert!(!first.state.granted);
        assert_eq!(first, second);
        assert_eq!(backend.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_error_counts_as_denied() {
        let backend = PermissionOnly::new(false, Err(BackendError::Other("no portal".into())));
        let camera = CameraBackendManager::new(backend);
        let outcome = PermissionGate::new().run(&camera).await;
        assert_eq!(outcome.state, PermissionState::denied());
    }
}
