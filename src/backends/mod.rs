// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera access
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        App Layer (sessions, driver)          │
//! └────────────────────┬────────────────────────┘
//!                      │ CameraBackendManager
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  CameraBackend   │◄─┤ Virtual Camera  │  │
//! │  │     (trait)      │  │ (scene script)  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Backend trait, shared types and the manager handle
//! - [`virtual_camera`]: Scripted backend used by every front-end and test

pub mod camera;
pub mod virtual_camera;

use crate::backends::camera::CameraBackendManager;
use crate::backends::virtual_camera::{Scene, VirtualCamera};
use crate::config::Config;
use crate::errors::AppResult;
use crate::pipelines::photo::PhotoPipeline;
use std::path::PathBuf;
use std::sync::Arc;

/// Build the camera backend described by the config
///
/// `scene_override` and `photo_dir_override` come from command-line flags
/// and win over the config file.
pub fn create_camera(
    config: &Config,
    scene_override: Option<PathBuf>,
    photo_dir_override: Option<PathBuf>,
) -> AppResult<CameraBackendManager> {
    let scene = match scene_override.or_else(|| config.scene_path.clone()) {
        Some(path) => Scene::load(&path)?,
        None => Scene::default(),
    };
    let photo_dir = photo_dir_override.unwrap_or_else(|| config.photo_dir());
    let pipeline = PhotoPipeline::with_config(config.photo_format, config.photo_quality);
    let camera = VirtualCamera::new(scene, photo_dir).with_pipeline(pipeline);
    Ok(CameraBackendManager::new(Arc::new(camera)))
}
