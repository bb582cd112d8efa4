// SPDX-License-Identifier: GPL-3.0-only

//! Leaf screens
//!
//! Each capture screen hosts exactly one [`CaptureSession`] and keeps the
//! last result it reported. Without camera permission a screen shows a
//! placeholder and never opens its session.

use crate::app::detection::DetectionSource;
use crate::app::navigation::Route;
use crate::app::permission::PermissionState;
use crate::app::session::{
    CaptureSession, SessionCommand, SessionConfig, SessionMessage, SessionOutput,
};
use crate::backends::camera::types::Facing;
use crate::config::Config;
use tracing::{info, warn};

/// Placeholder shown when camera access is missing
pub const NO_PERMISSION_TEXT: &str = "No camera permission";

/// What a capture screen renders outside the modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView<'a> {
    NoPermission,
    /// Nothing captured yet
    Empty,
    Result(&'a SessionOutput),
}

#[derive(Debug)]
pub struct CaptureScreen {
    route: Route,
    permission: PermissionState,
    session: CaptureSession,
    output: Option<SessionOutput>,
}

impl CaptureScreen {
    /// Build the screen for a capture route; `Home` has none
    pub fn for_route(route: Route, permission: PermissionState, config: &Config) -> Option<Self> {
        // Only the photo modal follows the configured facing; the scanner
        // uses the back camera and face detection the front one
        let (source, facing) = match route {
            Route::Home => return None,
            Route::TakingPhoto => (DetectionSource::PhotoOnly, config.photo_facing),
            Route::ScanningBarcode => (
                DetectionSource::CodeScanner {
                    kinds: config.code_kinds.clone(),
                },
                Facing::Back,
            ),
            Route::DetectingFace => (
                DetectionSource::FaceTrigger {
                    delivery: config.face_delivery,
                },
                Facing::Front,
            ),
        };
        let session_config = SessionConfig {
            initial_facing: facing,
            ..SessionConfig::from_config(config)
        };
        Some(Self::new(
            route,
            permission,
            CaptureSession::new(source, session_config),
        ))
    }

    pub fn new(route: Route, permission: PermissionState, session: CaptureSession) -> Self {
        Self {
            route,
            permission,
            session,
            output: None,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Last result reported by the session
    pub fn output(&self) -> Option<&SessionOutput> {
        self.output.as_ref()
    }

    /// Label of the button that opens the modal
    pub fn action_label(&self) -> &'static str {
        match self.route {
            Route::ScanningBarcode => "Scan Barcode",
            Route::DetectingFace => "Detect Face",
            _ => "Take Photo",
        }
    }

    pub fn view(&self) -> ScreenView<'_> {
        if !self.permission.granted {
            return ScreenView::NoPermission;
        }
        match &self.output {
            Some(output) => ScreenView::Result(output),
            None => ScreenView::Empty,
        }
    }

    /// Open the modal, unless camera access is missing
    pub fn open(&mut self) -> Vec<SessionCommand> {
        if !self.permission.granted {
            warn!(route = ?self.route, "Refusing to open camera without permission");
            return Vec::new();
        }
        self.session.update(SessionMessage::Open)
    }

    /// Forward a message to the session, keeping any completed result
    pub fn update(&mut self, message: SessionMessage) -> Vec<SessionCommand> {
        if matches!(message, SessionMessage::Open) {
            return self.open();
        }
        let commands = self.session.update(message);
        for command in &commands {
            if let SessionCommand::Complete(output) = command {
                info!(route = ?self.route, "Screen received result");
                self.output = Some(output.clone());
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{
        CameraDevice, CameraEvent, CodeKind, FaceDelivery, Facing, ScannedCode,
    };

    #[test]
    fn test_screen_without_permission_shows_placeholder() {
        let mut screen = CaptureScreen::for_route(
            Route::TakingPhoto,
            PermissionState::denied(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(screen.view(), ScreenView::NoPermission);
        assert!(screen.open().is_empty());
        assert!(screen.update(SessionMessage::Open).is_empty());
        assert!(!screen.session().is_visible());
    }

    #[test]
    fn test_routes_select_detection_source() {
        let config = Config {
            face_delivery: FaceDelivery::Callback,
            ..Default::default()
        };
        let granted = PermissionState::granted();
        assert!(CaptureScreen::for_route(Route::Home, granted, &config).is_none());

        let face = CaptureScreen::for_route(Route::DetectingFace, granted, &config).unwrap();
        assert_eq!(
            face.session().source(),
            &DetectionSource::FaceTrigger {
                delivery: FaceDelivery::Callback
            }
        );
    }

    #[test]
    fn test_each_route_opens_its_camera() {
        let granted = PermissionState::granted();
        let opened = |route: Route, config: &Config| {
            CaptureScreen::for_route(route, granted, config)
                .unwrap()
                .update(SessionMessage::Open)
        };

        let defaults = Config::default();
        assert_eq!(
            opened(Route::TakingPhoto, &defaults),
            vec![SessionCommand::ResolveDevice(Facing::Back)]
        );
        assert_eq!(
            opened(Route::DetectingFace, &defaults),
            vec![SessionCommand::ResolveDevice(Facing::Front)]
        );
        assert_eq!(
            opened(Route::ScanningBarcode, &defaults),
            vec![SessionCommand::ResolveDevice(Facing::Back)]
        );

        // The configured facing applies to the photo modal only
        let front = Config {
            photo_facing: Facing::Front,
            ..Default::default()
        };
        assert_eq!(
            opened(Route::TakingPhoto, &front),
            vec![SessionCommand::ResolveDevice(Facing::Front)]
        );
        assert_eq!(
            opened(Route::ScanningBarcode, &front),
            vec![SessionCommand::ResolveDevice(Facing::Back)]
        );
        assert_eq!(
            opened(Route::DetectingFace, &front),
            vec![SessionCommand::ResolveDevice(Facing::Front)]
        );
    }

    #[test]
    fn test_scan_result_is_kept() {
        let mut screen = CaptureScreen::for_route(
            Route::ScanningBarcode,
            PermissionState::granted(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(screen.view(), ScreenView::Empty);

        screen.open();
        screen.update(SessionMessage::DeviceResolved {
            facing: Facing::Back,
            device: Some(CameraDevice {
                id: "b".into(),
                name: "Back".into(),
                facing: Facing::Back,
                has_flash: false,
            }),
        });
        screen.update(SessionMessage::Camera(CameraEvent::CodesScanned(vec![
            ScannedCode::new(CodeKind::Qr, "hello"),
        ])));

        assert_eq!(
            screen.view(),
            ScreenView::Result(&SessionOutput::Code("hello".to_string()))
        );
    }
}
