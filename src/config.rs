// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::types::{CodeKind, FaceDelivery, Facing};
use crate::constants::{self, APP_ID};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{EncodingFormat, EncodingQuality};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Virtual camera scene file (built-in scene when unset)
    pub scene_path: Option<PathBuf>,
    /// Where photos are written (`<Pictures>/camera-showcase` when unset)
    pub photo_directory: Option<PathBuf>,
    /// Initial facing of the photo modal
    pub photo_facing: Facing,
    /// Encoding of saved photos
    pub photo_format: EncodingFormat,
    pub photo_quality: EncodingQuality,
    /// Delay before a confirmed result is cleared from the closed modal
    pub result_clear_delay_ms: u64,
    /// How long transient notices stay visible
    pub notice_duration_ms: u64,
    /// Play the shutter sound on capture
    pub shutter_sound: bool,
    /// Face detection delivery path for the face screen
    pub face_delivery: FaceDelivery,
    /// Code kinds the scanner looks for
    pub code_kinds: Vec<CodeKind>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scene_path: None,
            photo_directory: None,
            photo_facing: Facing::Back,
            photo_format: EncodingFormat::Jpeg,
            photo_quality: EncodingQuality::High,
            result_clear_delay_ms: constants::session::RESULT_CLEAR_DELAY.as_millis() as u64,
            notice_duration_ms: constants::notice::DISPLAY_DURATION.as_millis() as u64,
            shutter_sound: false,
            face_delivery: FaceDelivery::FrameProcessor,
            code_kinds: vec![CodeKind::Qr, CodeKind::Ean13],
        }
    }
}

impl Config {
    /// Default config file location (`<config_dir>/camera-showcase/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join(CONFIG_FILE_NAME))
    }

    /// Load the config from the default location
    ///
    /// A missing file yields defaults silently; an unreadable or invalid one
    /// yields defaults with a warning.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`, falling back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`, reporting any error
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&contents)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn result_clear_delay(&self) -> Duration {
        Duration::from_millis(self.result_clear_delay_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    /// Resolved photo output directory
    pub fn photo_dir(&self) -> PathBuf {
        crate::storage::photo_directory(self.photo_directory.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"photo_facing":"front"}"#).unwrap();
        assert_eq!(config.photo_facing, Facing::Front);
        assert_eq!(config.result_clear_delay_ms, 1000);
        assert_eq!(config.code_kinds, vec![CodeKind::Qr, CodeKind::Ean13]);
    }

    #[test]
    fn test_code_kinds_use_wire_names() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains(r#""code_kinds":["qr","ean-13"]"#));
        assert!(json.contains(r#""face_delivery":"frame-processor""#));
    }

    #[test]
    fn test_photo_encoding_settings() {
        let config: Config =
            serde_json::from_str(r#"{"photo_format":"png","photo_quality":"low"}"#).unwrap();
        assert_eq!(config.photo_format, EncodingFormat::Png);
        assert_eq!(config.photo_quality, EncodingQuality::Low);

        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains(r#""photo_format":"jpeg","photo_quality":"high""#));
    }
}
