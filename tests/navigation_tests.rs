// SPDX-License-Identifier: GPL-3.0-only

//! Startup and navigation with the permission gate in front

use camera_showcase::app::{
    AppState, CaptureScreen, NavigationShell, PermissionGate, PermissionState, Route, ScreenView,
    SessionDriver, SessionMessage, ShellView,
};
use camera_showcase::backends::camera::CameraBackendManager;
use camera_showcase::backends::virtual_camera::scene::PermissionScript;
use camera_showcase::backends::virtual_camera::{Scene, VirtualCamera};
use camera_showcase::config::Config;
use camera_showcase::constants::messages;
use std::path::Path;
use std::sync::Arc;

/// Virtual camera with the given permission script
fn camera(permission: PermissionScript, photo_dir: &Path) -> CameraBackendManager {
    let scene = Scene {
        permission,
        frame_interval_ms: 1,
        ..Default::default()
    };
    CameraBackendManager::new(Arc::new(VirtualCamera::new(
        scene,
        photo_dir.to_path_buf(),
    )))
}

#[tokio::test]
async fn test_denied_permission_shows_placeholder_screens() {
    let dir = tempfile::tempdir().unwrap();
    let camera = camera(
        PermissionScript {
            granted: false,
            grant_on_request: false,
            request_fails: false,
        },
        dir.path(),
    );
    let mut shell = NavigationShell::new();
    assert_eq!(shell.view(), ShellView::Loading);
    assert!(!shell.navigate(Route::TakingPhoto));

    let outcome = PermissionGate::new().run(&camera).await;
    assert!(!outcome.state.granted);
    assert!(outcome.notice.is_none());

    assert!(shell.finish_initialization(outcome.state));
    assert_eq!(shell.state(), AppState::Ready(outcome.state));

    let config = Config::default();
    for route in Route::DESTINATIONS {
        assert!(shell.navigate(route));
        let mut screen = CaptureScreen::for_route(route, outcome.state, &config).unwrap();
        assert_eq!(screen.view(), ScreenView::NoPermission);

        // The camera cannot be opened without access
        let mut driver = SessionDriver::new(camera.clone());
        assert!(driver.dispatch(&mut screen, SessionMessage::Open).is_empty());
        assert!(!screen.session().is_visible());

        assert_eq!(shell.back(), Some(route));
        assert_eq!(shell.current_route(), Route::Home);
    }
}

#[tokio::test]
async fn test_granted_on_request_announces_permission() {
    let dir = tempfile::tempdir().unwrap();
    let camera = camera(PermissionScript::default(), dir.path());
    let mut gate = PermissionGate::new();

    let outcome = gate.run(&camera).await;
    assert!(outcome.state.granted);
    assert_eq!(
        outcome.notice.map(|n| n.text),
        Some(messages::PERMISSION_GRANTED.to_string())
    );

    // A second run reuses the first answer
    let again = gate.run(&camera).await;
    assert!(again.state.granted);
    assert_eq!(gate.outcome().map(|o| o.state), Some(outcome.state));
}

#[tokio::test]
async fn test_failed_request_counts_as_denied() {
    let dir = tempfile::tempdir().unwrap();
    let camera = camera(
        PermissionScript {
            granted: false,
            grant_on_request: true,
            request_fails: true,
        },
        dir.path(),
    );
    let outcome = PermissionGate::new().run(&camera).await;
    assert!(!outcome.state.granted);

    let mut shell = NavigationShell::new();
    shell.finish_initialization(outcome.state);
    assert!(!shell.finish_initialization(PermissionState::granted()));
    assert_eq!(shell.permission(), Some(outcome.state));
}
