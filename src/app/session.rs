// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state machine
//!
//! One session backs one camera modal. It is a pure state machine: every
//! user action and every asynchronous result enters through
//! [`CaptureSession::update`], which returns the commands the driver has to
//! execute. Nothing in here blocks or spawns.
//!
//! ```text
//!            Open                 device          shutter / face
//!   Closed ───────► AwaitingDevice ──────► Live ─────────────────► Capturing
//!     ▲                   ▲                 │ ▲                        │
//!     │                   └── ToggleFacing ─┘ └──── failure / Retry ───┤
//!     │                                                                │ success
//!     └──────────── Close / Confirm / completion ◄──── ResultPending ◄─┘
//! ```
//!
//! Asynchronous results carry the episode they were issued in. The episode
//! is bumped on every open and close, so a capture that finishes after its
//! modal was closed is dropped instead of resurrecting stale state.

use crate::app::detection::DetectionSource;
use crate::app::notice::Notice;
use crate::backends::camera::types::{
    BackendError, CameraDevice, CameraEvent, CameraFrame, CaptureErrorKind, Face, Facing,
    FlashMode, FrameInfo, ScannedCode, StreamAnalysis, TakePhotoOptions,
};
use crate::config::Config;
use crate::constants::{messages, session};
use crate::storage::CapturedImage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Modal hidden
    Closed,
    /// Visible, waiting for a device for the current facing
    AwaitingDevice,
    /// Live feed, detectors running when the source asks for them
    Live,
    /// A photo capture is in flight
    Capturing,
    /// A captured photo awaits Retry or Confirm
    ResultPending,
}

/// What a session hands back to its screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutput {
    Photo(CapturedImage),
    Code(String),
}

/// Inputs to the state machine
#[derive(Debug, Clone)]
pub enum SessionMessage {
    Open,
    Close,
    DeviceResolved {
        facing: Facing,
        device: Option<CameraDevice>,
    },
    ShutterPressed,
    ToggleFlash,
    ToggleFacing,
    CaptureFinished {
        episode: u64,
        result: Result<CapturedImage, BackendError>,
    },
    Camera(CameraEvent),
    Retry,
    Confirm,
    ClearResult {
        episode: u64,
    },
}

/// Side effects requested by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    ResolveDevice(Facing),
    StartStream {
        device: CameraDevice,
        analysis: StreamAnalysis,
    },
    StopStream,
    TakePhoto {
        episode: u64,
        device: CameraDevice,
        options: TakePhotoOptions,
    },
    Notify(Notice),
    Complete(SessionOutput),
    ScheduleClear {
        episode: u64,
        after: Duration,
    },
}

/// Session settings taken from the application config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Facing used when the modal opens
    pub initial_facing: Facing,
    pub shutter_sound: bool,
    /// Delay before a confirmed result is cleared from the closed modal
    pub result_clear_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_facing: Facing::Back,
            shutter_sound: false,
            result_clear_delay: session::RESULT_CLEAR_DELAY,
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_facing: config.photo_facing,
            shutter_sound: config.shutter_sound,
            result_clear_delay: config.result_clear_delay(),
        }
    }
}

/// State of one camera modal
#[derive(Debug)]
pub struct CaptureSession {
    source: DetectionSource,
    config: SessionConfig,
    phase: SessionPhase,
    visible: bool,
    flash: FlashMode,
    facing: Facing,
    device: Option<CameraDevice>,
    result: Option<SessionOutput>,
    detection_active: bool,
    faces_present: bool,
    /// Face regions from the latest detection, for overlays
    faces: Vec<Face>,
    preview: Option<Arc<CameraFrame>>,
    episode: u64,
}

impl CaptureSession {
    pub fn new(source: DetectionSource, config: SessionConfig) -> Self {
        Self {
            source,
            facing: config.initial_facing,
            config,
            phase: SessionPhase::Closed,
            visible: false,
            flash: FlashMode::Off,
            device: None,
            result: None,
            detection_active: false,
            faces_present: false,
            faces: Vec::new(),
            preview: None,
            episode: 0,
        }
    }

    pub fn source(&self) -> &DetectionSource {
        &self.source
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn flash(&self) -> FlashMode {
        self.flash
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn device(&self) -> Option<&CameraDevice> {
        self.device.as_ref()
    }

    pub fn result(&self) -> Option<&SessionOutput> {
        self.result.as_ref()
    }

    pub fn detection_active(&self) -> bool {
        self.detection_active
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Newest live frame, if the feed is running
    pub fn preview(&self) -> Option<&Arc<CameraFrame>> {
        self.preview.as_ref()
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    /// Flash can be toggled right now
    pub fn can_toggle_flash(&self) -> bool {
        self.phase == SessionPhase::Live && self.device.as_ref().is_some_and(|d| d.has_flash)
    }

    /// Main message handler
    pub fn update(&mut self, message: SessionMessage) -> Vec<SessionCommand> {
        match message {
            SessionMessage::Open => self.handle_open(),
            SessionMessage::Close => self.handle_close(false),
            SessionMessage::DeviceResolved { facing, device } => {
                self.handle_device_resolved(facing, device)
            }
            SessionMessage::ShutterPressed => self.handle_shutter(),
            SessionMessage::ToggleFlash => self.handle_toggle_flash(),
            SessionMessage::ToggleFacing => self.handle_toggle_facing(),
            SessionMessage::CaptureFinished { episode, result } => {
                self.handle_capture_finished(episode, result)
            }
            SessionMessage::Camera(event) => self.handle_camera_event(event),
            SessionMessage::Retry => self.handle_retry(),
            SessionMessage::Confirm => self.handle_confirm(),
            SessionMessage::ClearResult { episode } => {
                if episode == self.episode && !self.visible {
                    debug!(episode, "Clearing retained result");
                    self.result = None;
                }
                Vec::new()
            }
        }
    }

    fn handle_open(&mut self) -> Vec<SessionCommand> {
        if self.visible {
            return Vec::new();
        }
        self.episode += 1;
        self.visible = true;
        self.result = None;
        self.phase = SessionPhase::AwaitingDevice;
        info!(
            source = self.source.label(),
            facing = %self.facing,
            episode = self.episode,
            "Opening camera"
        );
        vec![SessionCommand::ResolveDevice(self.facing)]
    }

    /// Hide the modal and reset everything except a confirmed result
    fn handle_close(&mut self, keep_result: bool) -> Vec<SessionCommand> {
        if !self.visible {
            return Vec::new();
        }
        self.episode += 1;
        self.visible = false;
        self.phase = SessionPhase::Closed;
        self.flash = FlashMode::Off;
        self.facing = self.config.initial_facing;
        self.device = None;
        self.detection_active = false;
        self.faces_present = false;
        self.faces.clear();
        self.preview = None;
        if !keep_result {
            self.result = None;
        }
        debug!(episode = self.episode, "Camera closed");
        vec![SessionCommand::StopStream]
    }

    fn handle_device_resolved(
        &mut self,
        facing: Facing,
        device: Option<CameraDevice>,
    ) -> Vec<SessionCommand> {
        if self.phase != SessionPhase::AwaitingDevice || facing != self.facing {
            debug!(%facing, phase = ?self.phase, "Ignoring stale device resolution");
            return Vec::new();
        }
        let Some(device) = device else {
            info!(%facing, "No camera device available yet");
            return Vec::new();
        };

        info!(device = %device.name, has_flash = device.has_flash, "Camera device ready");
        if !device.has_flash {
            self.flash = FlashMode::Off;
        }
        self.phase = SessionPhase::Live;
        self.detection_active = self.source.is_passive();
        self.device = Some(device.clone());
        vec![SessionCommand::StartStream {
            device,
            analysis: self.source.analysis(),
        }]
    }

    fn handle_shutter(&mut self) -> Vec<SessionCommand> {
        if !self.source.has_shutter() || self.phase != SessionPhase::Live {
            return Vec::new();
        }
        self.begin_capture()
    }

    /// Live → Capturing, issuing the photo request
    fn begin_capture(&mut self) -> Vec<SessionCommand> {
        let Some(device) = self.device.clone() else {
            return Vec::new();
        };
        self.phase = SessionPhase::Capturing;
        let options = TakePhotoOptions {
            flash: self.flash,
            shutter_sound: self.config.shutter_sound,
        };
        info!(device = %device.name, flash = %self.flash, "Taking photo");
        vec![SessionCommand::TakePhoto {
            episode: self.episode,
            device,
            options,
        }]
    }

    fn handle_toggle_flash(&mut self) -> Vec<SessionCommand> {
        if self.can_toggle_flash() {
            self.flash = self.flash.toggled();
            debug!(flash = %self.flash, "Flash toggled");
        }
        Vec::new()
    }

    fn handle_toggle_facing(&mut self) -> Vec<SessionCommand> {
        if self.phase != SessionPhase::Live {
            return Vec::new();
        }
        self.facing = self.facing.toggled();
        self.phase = SessionPhase::AwaitingDevice;
        self.device = None;
        self.detection_active = false;
        self.faces_present = false;
        self.faces.clear();
        self.preview = None;
        debug!(facing = %self.facing, "Switching camera");
        vec![
            SessionCommand::StopStream,
            SessionCommand::ResolveDevice(self.facing),
        ]
    }

    fn handle_capture_finished(
        &mut self,
        episode: u64,
        result: Result<CapturedImage, BackendError>,
    ) -> Vec<SessionCommand> {
        if episode != self.episode || self.phase != SessionPhase::Capturing {
            debug!(
                episode,
                current = self.episode,
                "Dropping capture result from an earlier episode"
            );
            return Vec::new();
        }

        match result {
            Ok(image) => {
                info!(name = %image.name, "Photo captured");
                let output = SessionOutput::Photo(image);
                if self.source.confirms_result() {
                    self.phase = SessionPhase::ResultPending;
                    self.preview = None;
                    self.result = Some(output);
                    vec![SessionCommand::StopStream]
                } else {
                    let mut commands = vec![SessionCommand::Complete(output)];
                    commands.extend(self.handle_close(false));
                    commands
                }
            }
            Err(err) => {
                self.phase = SessionPhase::Live;
                match err.kind() {
                    CaptureErrorKind::FlashUnsupported => {
                        warn!(error = %err, "Flash rejected by device, disabling flash");
                        self.flash = FlashMode::Off;
                        vec![SessionCommand::Notify(Notice::warning(
                            messages::FLASH_DISABLED,
                        ))]
                    }
                    CaptureErrorKind::DeviceError | CaptureErrorKind::Unknown => {
                        warn!(error = %err, "Photo capture failed");
                        vec![SessionCommand::Notify(Notice::error(
                            messages::CAPTURE_FAILED,
                        ))]
                    }
                }
            }
        }
    }

    fn handle_camera_event(&mut self, event: CameraEvent) -> Vec<SessionCommand> {
        if !self.visible {
            return Vec::new();
        }
        match event {
            CameraEvent::Frame(frame) => {
                if matches!(self.phase, SessionPhase::Live | SessionPhase::Capturing) {
                    self.preview = Some(frame);
                }
                Vec::new()
            }
            CameraEvent::CodesScanned(codes) => self.handle_codes(&codes),
            CameraEvent::FacesDetected { faces, frame } => self.handle_faces(faces, frame),
            CameraEvent::Error(err) => {
                warn!(error = %err, "Camera reported an error");
                vec![SessionCommand::Notify(Notice::error(err.to_string()))]
            }
        }
    }

    fn handle_codes(&mut self, codes: &[ScannedCode]) -> Vec<SessionCommand> {
        if self.phase != SessionPhase::Live {
            return Vec::new();
        }
        let Some(value) = codes
            .iter()
            .filter(|c| self.source.accepts_code(c.kind))
            .find_map(|c| c.decoded())
        else {
            return Vec::new();
        };

        info!(value, "Code scanned");
        let mut commands = vec![SessionCommand::Complete(SessionOutput::Code(
            value.to_string(),
        ))];
        commands.extend(self.handle_close(false));
        commands
    }

    fn handle_faces(&mut self, faces: Vec<Face>, frame: Option<FrameInfo>) -> Vec<SessionCommand> {
        // Events from a stream that is being replaced must not count
        if !self.source.is_face_trigger()
            || !matches!(self.phase, SessionPhase::Live | SessionPhase::Capturing)
        {
            return Vec::new();
        }
        if let Some(frame) = frame {
            debug!(faces = faces.len(), %frame, "Faces detected");
        }

        let present = !faces.is_empty();
        let appeared = present && !self.faces_present;
        self.faces_present = present;
        self.faces = faces;

        if appeared && self.phase == SessionPhase::Live {
            info!("Face entered view, capturing");
            return self.begin_capture();
        }
        Vec::new()
    }

    fn handle_retry(&mut self) -> Vec<SessionCommand> {
        if self.phase != SessionPhase::ResultPending {
            return Vec::new();
        }
        self.result = None;
        self.phase = SessionPhase::Live;
        match self.device.clone() {
            Some(device) => vec![SessionCommand::StartStream {
                device,
                analysis: self.source.analysis(),
            }],
            None => Vec::new(),
        }
    }

    fn handle_confirm(&mut self) -> Vec<SessionCommand> {
        if self.phase != SessionPhase::ResultPending {
            return Vec::new();
        }
        let Some(output) = self.result.clone() else {
            return Vec::new();
        };

        let mut commands = vec![SessionCommand::Complete(output)];
        commands.extend(self.handle_close(true));
        commands.push(SessionCommand::ScheduleClear {
            episode: self.episode,
            after: self.config.result_clear_delay,
        });
        commands
    }
}
