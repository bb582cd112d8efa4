// SPDX-License-Identifier: GPL-3.0-only

//! Photo pipeline
//!
//! ```text
//! Camera Frame → Encoding → Disk I/O → PhotoFile
//! ```
//!
//! The pipeline is synchronous; backends call it from their own blocking
//! context (`take_photo` is always driven through `spawn_blocking`).

pub mod encoding;

pub use encoding::{EncodingFormat, EncodingQuality, PhotoEncoder};

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame, PhotoFile};
use crate::storage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Encode → save workflow for captured frames
#[derive(Debug, Clone, Default)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    /// Create a new photo pipeline with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with custom encoder settings
    pub fn with_config(format: EncodingFormat, quality: EncodingQuality) -> Self {
        let mut encoder = PhotoEncoder::new();
        encoder.set_format(format);
        encoder.set_quality(quality);
        Self { encoder }
    }

    /// Encode the frame and write it into `output_dir`
    ///
    /// The directory is created if needed. The file name carries a
    /// millisecond timestamp so rapid captures never overwrite each other.
    pub fn capture_and_save(
        &self,
        frame: &CameraFrame,
        output_dir: &Path,
    ) -> BackendResult<PhotoFile> {
        let encoded = self.encoder.encode(frame).map_err(BackendError::Other)?;

        std::fs::create_dir_all(output_dir)?;
        let filepath = unique_path(output_dir, encoded.format.extension());
        std::fs::write(&filepath, &encoded.data)?;

        info!(
            path = %filepath.display(),
            width = encoded.width,
            height = encoded.height,
            "Photo saved"
        );

        Ok(PhotoFile { path: filepath })
    }
}

fn unique_path(dir: &Path, extension: &str) -> PathBuf {
    let base = storage::photo_file_stem(chrono::Local::now());
    let mut candidate = dir.join(format!("{}.{}", base, extension));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", base, counter, extension));
        counter += 1;
    }
    candidate
}
