// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo
//! - Scanning a code
//! - Face-triggered capture
//! - Printing and writing the configuration
//!
//! Headless commands run the permission gate and then drive a single
//! capture session to completion, standing in for the user where the flow
//! needs a button press.

use camera_showcase::app::{
    CaptureScreen, HeadlessActions, Notice, PermissionGate, Route, SessionDriver, SessionOutput,
};
use camera_showcase::backends::camera::CameraBackendManager;
use camera_showcase::backends::camera::types::{FaceDelivery, Facing};
use camera_showcase::backends::create_camera;
use camera_showcase::config::Config;
use camera_showcase::errors::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;

/// Options shared by every command
pub struct Context {
    pub scene: Option<PathBuf>,
    pub photo_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl Context {
    fn load_config(&self) -> Config {
        match &self.config {
            Some(path) => Config::load_or_default(path),
            None => Config::load(),
        }
    }

    fn camera(&self, config: &Config) -> Result<CameraBackendManager, AppError> {
        create_camera(config, self.scene.clone(), self.photo_dir.clone())
    }
}

/// Run the interactive terminal UI
pub fn run_terminal(context: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = context.load_config();
    let camera = context.camera(&config)?;
    camera_showcase::terminal::run(config, camera)
}

/// List all available cameras
pub fn list_cameras(context: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = context.load_config();
    let camera = context.camera(&config)?;

    let cameras = camera.enumerate_cameras().unwrap_or_default();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", camera.backend_name());
    println!();
    for device in &cameras {
        println!("  [{}] {}", device.id, device.name);
        println!(
            "      Facing: {}, flash: {}",
            device.facing,
            if device.has_flash { "yes" } else { "no" }
        );
    }
    println!();
    println!(
        "Camera permission: {}",
        if camera.has_permission() {
            "granted"
        } else {
            "not granted"
        }
    );

    Ok(())
}

/// Take a photo with the requested facing
pub fn take_photo(
    context: &Context,
    facing: Option<Facing>,
    output: Option<PathBuf>,
    timeout: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = context.load_config();
    if let Some(facing) = facing {
        config.photo_facing = facing;
    }

    // An output directory replaces the photo directory; a file path is
    // applied by renaming once the photo exists
    let (photo_dir, target_file) = match output {
        Some(path) if path.is_dir() => (Some(path), None),
        Some(path) => (context.photo_dir.clone(), Some(path)),
        None => (context.photo_dir.clone(), None),
    };
    let camera = create_camera(&config, context.scene.clone(), photo_dir)?;

    println!("Capturing ({} camera)...", config.photo_facing);
    let actions = HeadlessActions {
        shutter: true,
        confirm: true,
    };
    let output = run_headless(&config, camera, Route::TakingPhoto, actions, timeout)?;

    let SessionOutput::Photo(image) = output else {
        return Err("Session finished without a photo".into());
    };
    let saved = image.path();

    if let Some(target) = target_file {
        move_photo(&saved, &target)?;
        println!("Photo saved: {}", target.display());
    } else {
        println!("Photo saved: {}", saved.display());
    }
    Ok(())
}

/// Scan until a code is decoded and print its value
pub fn scan_code(context: &Context, timeout: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = context.load_config();
    let camera = context.camera(&config)?;

    let kinds: Vec<String> = config.code_kinds.iter().map(|k| k.to_string()).collect();
    eprintln!("Scanning for {}... (press Ctrl+C to stop)", kinds.join(", "));

    let actions = HeadlessActions::default();
    match run_headless(&config, camera, Route::ScanningBarcode, actions, timeout)? {
        SessionOutput::Code(value) => {
            println!("{}", value);
            Ok(())
        }
        SessionOutput::Photo(_) => Err("Scanner returned a photo".into()),
    }
}

/// Wait for a face and take a photo when one appears
pub fn detect_face(
    context: &Context,
    delivery: Option<FaceDelivery>,
    timeout: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = context.load_config();
    if let Some(delivery) = delivery {
        config.face_delivery = delivery;
    }
    let camera = context.camera(&config)?;

    eprintln!("Waiting for a face... (press Ctrl+C to stop)");
    let actions = HeadlessActions::default();
    match run_headless(&config, camera, Route::DetectingFace, actions, timeout)? {
        SessionOutput::Photo(image) => {
            println!("Photo saved: {}", image.path().display());
            Ok(())
        }
        SessionOutput::Code(_) => Err("Face detection returned a code".into()),
    }
}

/// Print the effective config, optionally writing it back to disk
pub fn show_config(context: &Context, write: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = context.load_config();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if write {
        let path = context
            .config
            .clone()
            .or_else(Config::default_path)
            .ok_or_else(|| AppError::Config("no config directory available".to_string()))?;
        config.save_to(&path)?;
        eprintln!("Config written: {}", path.display());
    }
    Ok(())
}

/// Gate permission, then run one session on `route` to completion
fn run_headless(
    config: &Config,
    camera: CameraBackendManager,
    route: Route,
    actions: HeadlessActions,
    timeout: u64,
) -> Result<SessionOutput, Box<dyn std::error::Error>> {
    let interrupt = interrupt_signal()?;
    let rt = tokio::runtime::Runtime::new()?;

    let result: Result<SessionOutput, AppError> = rt.block_on(async {
        let outcome = PermissionGate::new().run(&camera).await;
        if let Some(notice) = &outcome.notice {
            print_notice(notice);
        }

        let Some(mut screen) = CaptureScreen::for_route(route, outcome.state, config) else {
            return Err(AppError::Other(format!("{:?} has no camera", route)));
        };
        let mut driver = SessionDriver::new(camera);

        tokio::select! {
            output = driver.run_to_completion(&mut screen, actions, print_notice) => output,
            _ = tokio::time::sleep(Duration::from_secs(timeout)) => {
                Err(AppError::NoResult(format!("nothing captured within {}s", timeout)))
            }
            _ = interrupt.notified() => {
                Err(AppError::NoResult("interrupted".to_string()))
            }
        }
    });

    info!(ok = result.is_ok(), "Headless session finished");
    Ok(result?)
}

/// Ctrl+C handler that wakes the session loop
fn interrupt_signal() -> Result<Arc<Notify>, ctrlc::Error> {
    let notify = Arc::new(Notify::new());
    let handler_notify = Arc::clone(&notify);
    ctrlc::set_handler(move || handler_notify.notify_one())?;
    Ok(notify)
}

fn print_notice(notice: &Notice) {
    eprintln!("{}", notice);
}

/// Move a saved photo to a user-chosen path, copying across filesystems
fn move_photo(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::rename(from, to).is_err() {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}
