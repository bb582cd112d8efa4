// SPDX-License-Identifier: GPL-3.0-only

//! Scripted virtual camera backend
//!
//! Implements [`CameraBackend`] from a [`Scene`], so the whole application
//! runs without camera hardware: in the terminal, headless from the CLI and
//! under test.
//!
//! # Architecture
//!
//! ```text
//!   Scene script
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Stream thread    │  ← one per open stream, loops the frame script
//! │ - frame source   │
//! │ - QrDetector     │
//! │ - face script    │
//! └──────────────────┘
//!        │  CameraEvent (bounded channel, frames dropped when full)
//!        ▼
//!   SessionDriver
//! ```

mod file_source;
pub mod scene;

pub use file_source::{load_image_as_frame, placeholder_frame};
pub use scene::Scene;

use crate::app::frame_processor::{FrameRegion, QrDetector};
use crate::backends::camera::CameraBackend;
use crate::backends::camera::types::{
    BackendError, BackendResult, CameraDevice, CameraEvent, CameraFrame, CodeKind, EventReceiver,
    EventSender, Face, FaceDelivery, Facing, PhotoFile, ScannedCode, StreamAnalysis,
    TakePhotoOptions,
};
use crate::constants::virtual_camera as vc;
use crate::pipelines::photo::PhotoPipeline;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Virtual camera backed by a scene script
pub struct VirtualCamera {
    scene: Arc<Scene>,
    /// Decoded images, one slot per frame script entry
    images: Arc<Vec<Option<Arc<CameraFrame>>>>,
    photo_dir: PathBuf,
    pipeline: PhotoPipeline,
    permission: AtomicBool,
    captures: AtomicU32,
    /// Most recent streamed frame, used as the photo source
    latest_frame: Arc<Mutex<Option<Arc<CameraFrame>>>>,
}

impl VirtualCamera {
    /// Create a virtual camera
    ///
    /// Scene images are decoded up front; an image that fails to load is
    /// replaced by the generated placeholder with a warning.
    pub fn new(scene: Scene, photo_dir: PathBuf) -> Self {
        let images: Vec<Option<Arc<CameraFrame>>> = scene
            .frames
            .iter()
            .map(|entry| {
                let path = entry.image.as_ref()?;
                match load_image_as_frame(path, 0) {
                    Ok(frame) => Some(Arc::new(frame)),
                    Err(e) => {
                        warn!(error = %e, "Scene image unavailable, using placeholder");
                        None
                    }
                }
            })
            .collect();

        info!(
            devices = scene.devices.len(),
            granted = scene.permission.granted,
            photo_dir = %photo_dir.display(),
            "Virtual camera ready"
        );

        Self {
            permission: AtomicBool::new(scene.permission.granted),
            scene: Arc::new(scene),
            images: Arc::new(images),
            photo_dir,
            pipeline: PhotoPipeline::new(),
            captures: AtomicU32::new(0),
            latest_frame: Arc::new(Mutex::new(None)),
        }
    }

    /// Use `pipeline` for captured photos instead of the default JPEG one
    pub fn with_pipeline(mut self, pipeline: PhotoPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn frame_interval(&self) -> Duration {
        match self.scene.frame_interval_ms {
            0 => vc::FRAME_INTERVAL,
            ms => Duration::from_millis(ms),
        }
    }

    /// Frame used when a photo is taken before any frame was streamed
    fn still_frame(&self) -> Arc<CameraFrame> {
        if let Ok(latest) = self.latest_frame.lock()
            && let Some(frame) = latest.as_ref()
        {
            return Arc::clone(frame);
        }
        render_frame(&self.scene, &self.images, 0)
    }
}

impl CameraBackend for VirtualCamera {
    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn request_permission(&self) -> BackendResult<bool> {
        let script = &self.scene.permission;
        if script.request_fails {
            return Err(BackendError::Other(
                "Permission request could not be shown".to_string(),
            ));
        }
        if script.grant_on_request {
            self.permission.store(true, Ordering::SeqCst);
        }
        Ok(self.has_permission())
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.scene.devices.iter().map(|d| d.to_device()).collect()
    }

    fn device(&self, facing: Facing) -> Option<CameraDevice> {
        if !self.has_permission() {
            return None;
        }
        self.scene.device_for(facing).map(|d| d.to_device())
    }

    fn take_photo(
        &self,
        device: &CameraDevice,
        options: &TakePhotoOptions,
    ) -> BackendResult<PhotoFile> {
        if !self.has_permission() {
            return Err(BackendError::PermissionDenied);
        }
        let script = self
            .scene
            .device_by_id(&device.id)
            .ok_or_else(|| BackendError::DeviceNotFound(device.id.clone()))?;

        if options.flash.is_on() && script.flash_fault {
            return Err(BackendError::FlashUnsupported);
        }
        if options.flash.is_on() && !script.has_flash {
            debug!(device = %script.name, "No flash unit, ignoring flash request");
        }

        let attempt = self.captures.fetch_add(1, Ordering::SeqCst);
        if attempt < self.scene.capture_failures {
            return Err(BackendError::Device("Sensor readout failed".to_string()));
        }

        let frame = self.still_frame();
        self.pipeline.capture_and_save(&frame, &self.photo_dir)
    }

    fn open_stream(
        &self,
        device: &CameraDevice,
        analysis: StreamAnalysis,
    ) -> BackendResult<EventReceiver> {
        if !self.has_permission() {
            return Err(BackendError::PermissionDenied);
        }
        if self.scene.device_by_id(&device.id).is_none() {
            return Err(BackendError::DeviceNotFound(device.id.clone()));
        }

        let (sender, receiver) = futures::channel::mpsc::channel(vc::EVENT_CHANNEL_CAPACITY);
        let stream = StreamWorker {
            scene: Arc::clone(&self.scene),
            images: Arc::clone(&self.images),
            latest_frame: Arc::clone(&self.latest_frame),
            analysis,
            interval: self.frame_interval(),
            detector: QrDetector::new(),
            sender,
        };

        std::thread::Builder::new()
            .name(format!("virtual-camera-{}", device.id))
            .spawn(move || stream.run())
            .map_err(|e| BackendError::Other(format!("Failed to start stream: {}", e)))?;

        Ok(receiver)
    }

    fn name(&self) -> &str {
        "virtual"
    }
}

/// State owned by one stream thread
struct StreamWorker {
    scene: Arc<Scene>,
    images: Arc<Vec<Option<Arc<CameraFrame>>>>,
    latest_frame: Arc<Mutex<Option<Arc<CameraFrame>>>>,
    analysis: StreamAnalysis,
    interval: Duration,
    detector: QrDetector,
    sender: EventSender,
}

impl StreamWorker {
    fn run(mut self) {
        debug!(analysis = ?self.analysis, "Virtual camera stream started");
        let mut sequence: u64 = 0;

        loop {
            let tick = Instant::now();
            let frame = render_frame(&self.scene, &self.images, sequence);
            if let Ok(mut latest) = self.latest_frame.lock() {
                *latest = Some(Arc::clone(&frame));
            }

            let mut events = vec![CameraEvent::Frame(Arc::clone(&frame))];
            events.extend(self.analyse(&frame));
            events.extend(
                self.scene
                    .errors
                    .iter()
                    .filter(|e| e.after_frames == sequence)
                    .map(|e| CameraEvent::Error(BackendError::Device(e.message.clone()))),
            );

            for event in events {
                if !self.send(event) {
                    debug!(frames = sequence, "Virtual camera stream closed");
                    return;
                }
            }

            sequence += 1;
            if let Some(remaining) = self.interval.checked_sub(tick.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// Run the requested detectors on one frame
    fn analyse(&self, frame: &CameraFrame) -> Vec<CameraEvent> {
        let Some((index, entry)) = self.scene.entry_at(frame.sequence) else {
            return Vec::new();
        };
        let mut events = Vec::new();

        if !self.analysis.codes.is_empty() {
            let mut codes: Vec<ScannedCode> = Vec::new();
            if self.analysis.codes.contains(&CodeKind::Qr) && self.images[index].is_some() {
                codes.extend(
                    self.detector
                        .detect(frame)
                        .into_iter()
                        .map(|d| ScannedCode::new(CodeKind::Qr, d.content)),
                );
            }
            codes.extend(
                entry
                    .codes
                    .iter()
                    .filter(|c| self.analysis.codes.contains(&c.kind))
                    .map(|c| c.to_code()),
            );
            if !codes.is_empty() {
                events.push(CameraEvent::CodesScanned(codes));
            }
        }

        if let Some(delivery) = self.analysis.faces {
            let faces = synthetic_faces(frame.width, frame.height, entry.faces);
            let frame_info = match delivery {
                FaceDelivery::FrameProcessor => None,
                FaceDelivery::Callback => Some(frame.info()),
            };
            events.push(CameraEvent::FacesDetected {
                faces,
                frame: frame_info,
            });
        }

        events
    }

    /// Returns false once the receiver is gone
    fn send(&mut self, event: CameraEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(e) if e.is_disconnected() => false,
            Err(_) => {
                // Channel full: drop this event, the next frame supersedes it
                true
            }
        }
    }
}

/// Frame for a stream position, from the scene image or the placeholder
fn render_frame(
    scene: &Scene,
    images: &[Option<Arc<CameraFrame>>],
    sequence: u64,
) -> Arc<CameraFrame> {
    let entry = scene.entry_at(sequence);
    if let Some((index, _)) = entry
        && let Some(Some(image)) = images.get(index)
    {
        let mut frame = CameraFrame::clone(image);
        frame.sequence = sequence;
        frame.captured_at = Instant::now();
        return Arc::new(frame);
    }
    let faces = entry.map(|(_, e)| e.faces).unwrap_or(0);
    Arc::new(placeholder_frame(
        vc::PLACEHOLDER_WIDTH,
        vc::PLACEHOLDER_HEIGHT,
        sequence,
        faces,
    ))
}

fn synthetic_faces(width: u32, height: u32, count: u32) -> Vec<Face> {
    file_source::face_discs(width, height, count)
        .into_iter()
        .map(|(cx, cy, r)| Face {
            bounds: FrameRegion::from_pixels(
                cx.saturating_sub(r),
                cy.saturating_sub(r),
                r * 2,
                r * 2,
                width,
                height,
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::qr_detector::qr_code_frame;
    use crate::backends::camera::types::FlashMode;
    use crate::backends::virtual_camera::scene::{CodeScript, FrameScript, PermissionScript};
    use futures::StreamExt;

    fn granted_scene() -> Scene {
        Scene {
            permission: PermissionScript {
                granted: true,
                ..Default::default()
            },
            frame_interval_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_device_without_permission() {
        let dir = tempfile::tempdir().unwrap();
        let camera = VirtualCamera::new(Scene::default(), dir.path().to_path_buf());
        assert!(!camera.has_permission());
        assert!(camera.device(Facing::Back).is_none());
        assert_eq!(camera.request_permission(), Ok(true));
        assert!(camera.device(Facing::Back).is_some());
    }

    #[test]
    fn test_denied_request_keeps_devices_hidden() {
        let mut scene = Scene::default();
        scene.permission.grant_on_request = false;
        let dir = tempfile::tempdir().unwrap();
        let camera = VirtualCamera::new(scene, dir.path().to_path_buf());
        assert_eq!(camera.request_permission(), Ok(false));
        assert!(camera.device(Facing::Front).is_none());
        // Enumeration is independent of access
        assert_eq!(camera.enumerate_cameras().len(), 2);
    }

    #[test]
    fn test_flash_ignored_without_flash_unit() {
        let dir = tempfile::tempdir().unwrap();
        let camera = VirtualCamera::new(granted_scene(), dir.path().to_path_buf());
        let front = camera.device(Facing::Front).unwrap();
        assert!(!front.has_flash);

        let options = TakePhotoOptions {
            flash: FlashMode::On,
            shutter_sound: false,
        };
        let photo = camera.take_photo(&front, &options).unwrap();
        assert!(photo.path.exists());
    }

    #[test]
    fn test_flash_fault_reports_flash_unsupported() {
        let mut scene = granted_scene();
        scene.devices[0].flash_fault = true;
        let dir = tempfile::tempdir().unwrap();
        let camera = VirtualCamera::new(scene, dir.path().to_path_buf());
        let back = camera.device(Facing::Back).unwrap();

        let with_flash = TakePhotoOptions {
            flash: FlashMode::On,
            shutter_sound: false,
        };
        assert_eq!(
            camera.take_photo(&back, &with_flash),
            Err(BackendError::FlashUnsupported)
        );
    }

    #[test]
    fn test_scripted_capture_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = granted_scene();
        scene.capture_failures = 1;
        let camera = VirtualCamera::new(scene, dir.path().to_path_buf());
        let back = camera.device(Facing::Back).unwrap();

        let first = camera.take_photo(&back, &TakePhotoOptions::default());
        assert!(matches!(first, Err(BackendError::Device(_))));
        assert!(camera.take_photo(&back, &TakePhotoOptions::default()).is_ok());
    }

    #[tokio::test]
    async fn test_stream_reports_scripted_codes_and_faces() {
        let mut scene = granted_scene();
        scene.frames = vec![FrameScript {
            codes: vec![CodeScript {
                kind: CodeKind::Ean13,
                value: "4006381333931".to_string(),
            }],
            faces: 2,
            repeat: 1,
            ..Default::default()
        }];
        let dir = tempfile::tempdir().unwrap();
        let camera = VirtualCamera::new(scene, dir.path().to_path_buf());
        let back = camera.device(Facing::Back).unwrap();
        let analysis = StreamAnalysis {
            codes: vec![CodeKind::Ean13],
            faces: Some(FaceDelivery::Callback),
        };
        let mut events = camera.open_stream(&back, analysis).unwrap();

        let mut saw_code = false;
        let mut saw_faces = false;
        while let Some(event) = events.next().await {
            match event {
                CameraEvent::CodesScanned(codes) => {
                    assert_eq!(codes[0].decoded(), Some("4006381333931"));
                    saw_code = true;
                }
                CameraEvent::FacesDetected { faces, frame } => {
                    assert_eq!(faces.len(), 2);
                    assert!(frame.is_some());
                    saw_faces = true;
                }
                _ => {}
            }
            if saw_code && saw_faces {
                break;
            }
        }
        assert!(saw_code && saw_faces);
    }

    #[tokio::test]
    async fn test_stream_decodes_qr_code_in_scene_image() {
        let dir = tempfile::tempdir().unwrap();
        let frame = qr_code_frame("https://example.com/scene", 6);
        let image_path = dir.path().join("qr.png");
        image::RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .unwrap()
            .save(&image_path)
            .unwrap();

        let mut scene = granted_scene();
        scene.frames = vec![FrameScript {
            image: Some(image_path),
            ..Default::default()
        }];
        let camera = VirtualCamera::new(scene, dir.path().to_path_buf());
        let back = camera.device(Facing::Back).unwrap();
        let analysis = StreamAnalysis {
            codes: vec![CodeKind::Qr],
            faces: None,
        };
        let mut events = camera.open_stream(&back, analysis).unwrap();

        let codes = loop {
            match events.next().await {
                Some(CameraEvent::CodesScanned(codes)) => break codes,
                Some(_) => continue,
                None => panic!("stream ended without a code"),
            }
        };
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].kind, CodeKind::Qr);
        assert_eq!(codes[0].decoded(), Some("https://example.com/scene"));
    }

    #[tokio::test]
    async fn test_stream_filters_unrequested_code_kinds() {
        let mut scene = granted_scene();
        scene.frames = vec![FrameScript {
            codes: vec![CodeScript {
                kind: CodeKind::Ean13,
                value: "4006381333931".to_string(),
            }],
            ..Default::default()
        }];
        let dir = tempfile::tempdir().unwrap();
        let camera = VirtualCamera::new(scene, dir.path().to_path_buf());
        let back = camera.device(Facing::Back).unwrap();
        let analysis = StreamAnalysis {
            codes: vec![CodeKind::Qr],
            faces: None,
        };
        let events = camera.open_stream(&back, analysis).unwrap();
        let first: Vec<CameraEvent> = events.take(10).collect().await;
        assert!(
            first
                .iter()
                .all(|e| matches!(e, CameraEvent::Frame(_)))
        );
    }
}
