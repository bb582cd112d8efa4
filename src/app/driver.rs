// SPDX-License-Identifier: GPL-3.0-only

//! Async executor for session commands
//!
//! The driver turns [`SessionCommand`]s into backend calls on the tokio
//! runtime and feeds their results back as [`SessionMessage`]s. Blocking
//! backend calls run on `spawn_blocking`; the open stream is forwarded by
//! one task that is aborted when the stream stops.
//!
//! The driver never touches session state itself. Callers pull messages
//! with [`SessionDriver::recv`] or [`SessionDriver::try_recv`], pass them to
//! the screen, and hand the resulting commands back to
//! [`SessionDriver::execute`].

use crate::app::notice::Notice;
use crate::app::screens::CaptureScreen;
use crate::app::session::{SessionCommand, SessionMessage, SessionOutput, SessionPhase};
use crate::backends::camera::CameraBackendManager;
use crate::backends::camera::types::{
    BackendError, CameraDevice, CameraEvent, Facing, StreamAnalysis, TakePhotoOptions,
};
use crate::errors::{AppError, AppResult};
use crate::storage::CapturedImage;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Capacity of the message channel back into the session
const MESSAGE_CHANNEL_CAPACITY: usize = 64;

/// Automatic user actions for runs without a UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadlessActions {
    /// Press the shutter once the live feed shows a frame
    pub shutter: bool,
    /// Confirm a pending photo as soon as it arrives
    pub confirm: bool,
}

/// Commands that surface to the front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    Notice(Notice),
    Completed(SessionOutput),
}

pub struct SessionDriver {
    camera: CameraBackendManager,
    sender: mpsc::Sender<SessionMessage>,
    receiver: mpsc::Receiver<SessionMessage>,
    stream_task: Option<JoinHandle<()>>,
}

impl SessionDriver {
    /// Create a driver; must be used inside a tokio runtime
    pub fn new(camera: CameraBackendManager) -> Self {
        let (sender, receiver) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        Self {
            camera,
            sender,
            receiver,
            stream_task: None,
        }
    }

    pub fn camera(&self) -> &CameraBackendManager {
        &self.camera
    }

    /// Execute commands, returning the ones meant for the front-end
    pub fn execute(&mut self, commands: Vec<SessionCommand>) -> Vec<DriverEvent> {
        let mut events = Vec::new();
        for command in commands {
            match command {
                SessionCommand::ResolveDevice(facing) => self.resolve_device(facing),
                SessionCommand::StartStream { device, analysis } => {
                    self.start_stream(device, analysis)
                }
                SessionCommand::StopStream => self.stop_stream(),
                SessionCommand::TakePhoto {
                    episode,
                    device,
                    options,
                } => self.take_photo(episode, device, options),
                SessionCommand::ScheduleClear { episode, after } => {
                    self.schedule_clear(episode, after)
                }
                SessionCommand::Notify(notice) => events.push(DriverEvent::Notice(notice)),
                SessionCommand::Complete(output) => events.push(DriverEvent::Completed(output)),
            }
        }
        events
    }

    /// Wait for the next asynchronous result
    pub async fn recv(&mut self) -> Option<SessionMessage> {
        self.receiver.recv().await
    }

    /// Next asynchronous result, if one is ready
    pub fn try_recv(&mut self) -> Option<SessionMessage> {
        self.receiver.try_recv().ok()
    }

    /// Forward a message to the screen and execute what it asks for
    pub fn dispatch(
        &mut self,
        screen: &mut CaptureScreen,
        message: SessionMessage,
    ) -> Vec<DriverEvent> {
        let commands = screen.update(message);
        self.execute(commands)
    }

    /// Open the screen's session and run it until it reports a result
    ///
    /// Notices are passed to `on_notice`; `actions` stand in for the user.
    pub async fn run_to_completion(
        &mut self,
        screen: &mut CaptureScreen,
        actions: HeadlessActions,
        mut on_notice: impl FnMut(&Notice),
    ) -> AppResult<SessionOutput> {
        if !screen.permission().granted {
            return Err(AppError::Camera(BackendError::PermissionDenied));
        }

        let mut pending = self.dispatch(screen, SessionMessage::Open);
        loop {
            for event in pending.drain(..) {
                match event {
                    DriverEvent::Notice(notice) => on_notice(&notice),
                    DriverEvent::Completed(output) => {
                        self.stop_stream();
                        return Ok(output);
                    }
                }
            }

            let session = screen.session();
            if actions.confirm && session.phase() == SessionPhase::ResultPending {
                pending = self.dispatch(screen, SessionMessage::Confirm);
                continue;
            }
            if actions.shutter
                && session.phase() == SessionPhase::Live
                && session.preview().is_some()
            {
                pending = self.dispatch(screen, SessionMessage::ShutterPressed);
                continue;
            }

            let Some(message) = self.recv().await else {
                return Err(AppError::NoResult("session channel closed".to_string()));
            };
            pending = self.dispatch(screen, message);
        }
    }

    fn resolve_device(&self, facing: Facing) {
        let camera = self.camera.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let device = match tokio::task::spawn_blocking(move || camera.device(facing)).await {
                Ok(device) => device,
                Err(e) => {
                    error!(error = %e, "Device lookup task failed");
                    None
                }
            };
            let _ = sender
                .send(SessionMessage::DeviceResolved { facing, device })
                .await;
        });
    }

    fn start_stream(&mut self, device: CameraDevice, analysis: StreamAnalysis) {
        self.stop_stream();

        let mut events = match self.camera.open_stream(&device, analysis) {
            Ok(events) => events,
            Err(e) => {
                warn!(device = %device.name, error = %e, "Failed to open camera stream");
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let _ = sender
                        .send(SessionMessage::Camera(CameraEvent::Error(e)))
                        .await;
                });
                return;
            }
        };

        let sender = self.sender.clone();
        self.stream_task = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if sender.send(SessionMessage::Camera(event)).await.is_err() {
                    break;
                }
            }
            debug!("Camera stream ended");
        }));
    }

    fn stop_stream(&mut self) {
        if let Some(task) = self.stream_task.take() {
            // Dropping the receiver inside the task ends the backend stream
            task.abort();
            debug!("Camera stream stopped");
        }
    }

    fn take_photo(&self, episode: u64, device: CameraDevice, options: TakePhotoOptions) {
        let camera = self.camera.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || camera.take_photo(&device, &options)).await;
            let result = match result {
                Ok(Ok(photo)) => Ok(CapturedImage::from_photo(&photo)),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(BackendError::Other(format!("Capture task failed: {}", e))),
            };
            let _ = sender
                .send(SessionMessage::CaptureFinished { episode, result })
                .await;
        });
    }

    fn schedule_clear(&self, episode: u64, after: Duration) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = sender.send(SessionMessage::ClearResult { episode }).await;
        });
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.stop_stream();
    }
}

impl std::fmt::Debug for SessionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDriver")
            .field("camera", &self.camera)
            .field("streaming", &self.stream_task.is_some())
            .finish()
    }
}
