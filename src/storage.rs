// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for captured photos

use crate::backends::camera::types::PhotoFile;
use crate::pipelines::photo::EncodingFormat;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Application directory name under the user's pictures folder
const PHOTO_SUBDIRECTORY: &str = "camera-showcase";

/// A captured photo as handed to screens
///
/// Replaced wholesale on every capture, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// `file://` URI of the photo
    pub uri: String,
    /// File name component of the path
    pub name: String,
    /// MIME type of the encoded data
    pub mime_type: String,
}

impl CapturedImage {
    /// Describe a photo file written by the backend
    pub fn from_photo(photo: &PhotoFile) -> Self {
        Self::from_path(&photo.path)
    }

    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(EncodingFormat::from_extension)
            .unwrap_or_default()
            .mime_type();

        Self {
            uri: format!("file://{}", path.display()),
            name,
            mime_type: mime_type.to_string(),
        }
    }

    /// Filesystem path behind the `file://` URI
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }
}

/// Get the photo save directory (`<Pictures>/camera-showcase`)
pub fn default_photo_directory() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PHOTO_SUBDIRECTORY)
}

/// Resolve the photo directory, honouring a configured override
pub fn photo_directory(configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(default_photo_directory)
}

/// File stem for a photo taken at `timestamp` (`IMG_YYYYmmdd_HHMMSS_mmm`)
pub fn photo_file_stem(timestamp: DateTime<Local>) -> String {
    format!("IMG_{}", timestamp.format("%Y%m%d_%H%M%S_%3f"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_captured_image_from_path() {
        let image = CapturedImage::from_path(Path::new("/tmp/shots/IMG_1.jpg"));
        assert_eq!(image.uri, "file:///tmp/shots/IMG_1.jpg");
        assert_eq!(image.name, "IMG_1.jpg");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.path(), PathBuf::from("/tmp/shots/IMG_1.jpg"));
    }

    #[test]
    fn test_png_mime_type() {
        let image = CapturedImage::from_path(Path::new("a/b.PNG"));
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_photo_file_stem() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(photo_file_stem(ts), "IMG_20240309_140507_000");
    }

    #[test]
    fn test_configured_directory_wins() {
        let dir = photo_directory(Some(Path::new("/srv/photos")));
        assert_eq!(dir, PathBuf::from("/srv/photos"));
        assert!(photo_directory(None).ends_with(PHOTO_SUBDIRECTORY));
    }
}
