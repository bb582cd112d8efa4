// SPDX-License-Identifier: GPL-3.0-only

//! Scene scripts for the virtual camera
//!
//! A scene describes everything the virtual camera reports: permission
//! behaviour, the devices it exposes, the frames it streams and the faults
//! it injects. Scenes are JSON files; relative image paths resolve against
//! the scene file's directory.
//!
//! ```json
//! {
//!   "permission": { "granted": false, "grant_on_request": true },
//!   "devices": [
//!     { "id": "back0", "name": "Back Camera", "facing": "back", "has_flash": true }
//!   ],
//!   "frames": [
//!     { "repeat": 30 },
//!     { "image": "qr.png", "faces": 1, "repeat": 30 }
//!   ]
//! }
//! ```

use crate::backends::camera::types::{CameraDevice, CodeKind, Facing, ScannedCode};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Permission behaviour of the virtual platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionScript {
    /// Access already granted at start
    pub granted: bool,
    /// Answer given when access is requested
    pub grant_on_request: bool,
    /// The request itself errors out
    pub request_fails: bool,
}

impl Default for PermissionScript {
    fn default() -> Self {
        Self {
            granted: false,
            grant_on_request: true,
            request_fails: false,
        }
    }
}

/// One exposed camera device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceScript {
    pub id: String,
    pub name: String,
    pub facing: Facing,
    #[serde(default)]
    pub has_flash: bool,
    /// Device claims a flash but the driver rejects flash captures
    #[serde(default)]
    pub flash_fault: bool,
}

impl DeviceScript {
    pub fn to_device(&self) -> CameraDevice {
        CameraDevice {
            id: self.id.clone(),
            name: self.name.clone(),
            facing: self.facing,
            has_flash: self.has_flash,
        }
    }
}

/// A code reported by the scanner without image decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeScript {
    pub kind: CodeKind,
    pub value: String,
}

impl CodeScript {
    pub fn to_code(&self) -> ScannedCode {
        ScannedCode::new(self.kind, self.value.clone())
    }
}

/// One entry of the frame script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameScript {
    /// Image shown for this entry (generated gradient when unset)
    pub image: Option<PathBuf>,
    /// Codes reported in addition to anything decoded from the image
    pub codes: Vec<CodeScript>,
    /// Number of faces the detector reports
    pub faces: u32,
    /// How many consecutive frames this entry lasts
    pub repeat: u32,
}

impl Default for FrameScript {
    fn default() -> Self {
        Self {
            image: None,
            codes: Vec::new(),
            faces: 0,
            repeat: 1,
        }
    }
}

/// A runtime error raised by the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorScript {
    /// Stream frame count after which the error fires
    pub after_frames: u64,
    pub message: String,
}

/// Complete virtual camera scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub permission: PermissionScript,
    pub devices: Vec<DeviceScript>,
    /// Frame script, looped while a stream is open
    pub frames: Vec<FrameScript>,
    /// Interval between frames (falls back to ~30 fps when zero)
    pub frame_interval_ms: u64,
    /// Number of leading captures that fail with a device error
    pub capture_failures: u32,
    /// Runtime errors raised by every stream
    pub errors: Vec<ErrorScript>,
}

impl Default for Scene {
    /// Back camera with flash, front camera without, a quiet stretch and
    /// then a stretch where a face and a QR code are in view
    fn default() -> Self {
        Self {
            permission: PermissionScript::default(),
            devices: vec![
                DeviceScript {
                    id: "virtual-back".to_string(),
                    name: "Virtual Back Camera".to_string(),
                    facing: Facing::Back,
                    has_flash: true,
                    flash_fault: false,
                },
                DeviceScript {
                    id: "virtual-front".to_string(),
                    name: "Virtual Front Camera".to_string(),
                    facing: Facing::Front,
                    has_flash: false,
                    flash_fault: false,
                },
            ],
            frames: vec![
                FrameScript {
                    repeat: 90,
                    ..Default::default()
                },
                FrameScript {
                    codes: vec![CodeScript {
                        kind: CodeKind::Qr,
                        value: "https://example.com/camera-showcase".to_string(),
                    }],
                    faces: 1,
                    repeat: 60,
                    ..Default::default()
                },
            ],
            frame_interval_ms: crate::constants::virtual_camera::FRAME_INTERVAL.as_millis() as u64,
            capture_failures: 0,
            errors: Vec::new(),
        }
    }
}

impl Scene {
    /// Load a scene file, resolving relative image paths against its directory
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Scene(format!("{}: {}", path.display(), e)))?;
        let mut scene: Scene = serde_json::from_str(&contents)
            .map_err(|e| AppError::Scene(format!("{}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            scene.resolve_paths(base);
        }
        scene.validate()?;

        info!(
            path = %path.display(),
            devices = scene.devices.len(),
            frames = scene.frames.len(),
            "Loaded virtual camera scene"
        );
        Ok(scene)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for frame in &mut self.frames {
            if let Some(image) = &frame.image
                && image.is_relative()
            {
                frame.image = Some(base.join(image));
            }
        }
    }

    fn validate(&self) -> AppResult<()> {
        let mut ids: Vec<&str> = self.devices.iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(AppError::Scene("duplicate device id".to_string()));
        }
        Ok(())
    }

    /// First device facing the given direction
    pub fn device_for(&self, facing: Facing) -> Option<&DeviceScript> {
        self.devices.iter().find(|d| d.facing == facing)
    }

    pub fn device_by_id(&self, id: &str) -> Option<&DeviceScript> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Total frames in one pass of the script
    pub fn script_len(&self) -> u64 {
        self.frames.iter().map(|f| f.repeat.max(1) as u64).sum()
    }

    /// Script entry shown at the given stream position (the script loops)
    pub fn entry_at(&self, sequence: u64) -> Option<(usize, &FrameScript)> {
        let len = self.script_len();
        if len == 0 {
            return None;
        }
        let mut position = sequence % len;
        for (index, entry) in self.frames.iter().enumerate() {
            let span = entry.repeat.max(1) as u64;
            if position < span {
                return Some((index, entry));
            }
            position -= span;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_at_loops_over_script() {
        let scene = Scene {
            frames: vec![
                FrameScript {
                    repeat: 2,
                    ..Default::default()
                },
                FrameScript {
                    faces: 1,
                    repeat: 1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(scene.script_len(), 3);
        assert_eq!(scene.entry_at(0).unwrap().0, 0);
        assert_eq!(scene.entry_at(1).unwrap().0, 0);
        assert_eq!(scene.entry_at(2).unwrap().1.faces, 1);
        assert_eq!(scene.entry_at(3).unwrap().0, 0);
    }

    #[test]
    fn test_empty_script_has_no_entries() {
        let scene = Scene {
            frames: Vec::new(),
            ..Default::default()
        };
        assert!(scene.entry_at(5).is_none());
    }

    #[test]
    fn test_parse_minimal_scene() {
        let json = r#"{
            "permission": { "granted": true },
            "devices": [{ "id": "b", "name": "B", "facing": "back", "flash_fault": true }],
            "frames": [{ "codes": [{ "kind": "ean-13", "value": "4006381333931" }] }]
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert!(scene.permission.granted);
        assert!(scene.permission.grant_on_request);
        let back = scene.device_for(Facing::Back).unwrap();
        assert!(back.flash_fault);
        assert!(!back.has_flash);
        assert_eq!(scene.frames[0].repeat, 1);
        assert_eq!(scene.frames[0].codes[0].kind, CodeKind::Ean13);
        assert!(scene.device_for(Facing::Front).is_none());
    }

    #[test]
    fn test_load_resolves_relative_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, r#"{ "frames": [{ "image": "shot.png" }] }"#).unwrap();

        let scene = Scene::load(&path).unwrap();
        assert_eq!(
            scene.frames[0].image.as_deref(),
            Some(dir.path().join("shot.png").as_path())
        );
    }

    #[test]
    fn test_duplicate_device_ids_rejected() {
        let mut scene = Scene::default();
        scene.devices[1].id = scene.devices[0].id.clone();
        assert!(scene.validate().is_err());
    }
}
