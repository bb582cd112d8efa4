// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use camera_showcase::Config;
use camera_showcase::backends::camera::types::{CodeKind, FaceDelivery, Facing};
use camera_showcase::errors::AppError;
use camera_showcase::pipelines::photo::{EncodingFormat, EncodingQuality};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.photo_facing, Facing::Back);
    assert_eq!(config.result_clear_delay(), Duration::from_secs(1));
    assert!(
        !config.shutter_sound,
        "Shutter sound should be off by default"
    );
}

#[test]
fn test_config_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    // Parent directories are created on save
    let path = dir.path().join("camera-showcase").join("config.json");
    let config = Config {
        photo_facing: Facing::Front,
        face_delivery: FaceDelivery::Callback,
        code_kinds: vec![CodeKind::Ean13],
        notice_duration_ms: 500,
        ..Default::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.notice_duration(), Duration::from_millis(500));
}

#[test]
fn test_invalid_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_from(&path).is_err());
    assert_eq!(Config::load_or_default(&path), Config::default());
}

#[test]
fn test_missing_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    assert_eq!(Config::load_or_default(&path), Config::default());
}

#[test]
fn test_save_into_file_path_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let result = Config::default().save_to(&blocker.join("config.json"));
    assert!(matches!(result, Err(AppError::Storage(_))));
}

#[test]
fn test_photo_encoding_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = Config {
        photo_format: EncodingFormat::Png,
        photo_quality: EncodingQuality::Medium,
        ..Default::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.photo_format, EncodingFormat::Png);
    assert_eq!(loaded.photo_quality, EncodingQuality::Medium);
}
