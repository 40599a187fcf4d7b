// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use simple_camera::backends::camera::{CameraSetup, LensFacing};
use simple_camera::Config;
use simple_camera::errors::ConfigError;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("simple-camera-test-{}", std::process::id()))
        .join(name)
}

#[test]
fn test_config_default() {
    let config = Config::default();

    // Portrait phone window by default
    assert_eq!(config.window_width, 1080);
    assert_eq!(config.window_height, 1920);
    assert!(config.camera_setup.is_none());
    assert_eq!(config.log_filter, "warn");
}

#[test]
fn test_config_missing_keys_take_defaults() {
    let config: Config = serde_json::from_str(r#"{ "window_width": 800 }"#).unwrap();
    assert_eq!(config.window_width, 800);
    assert_eq!(config.window_height, 1920);
}

#[test]
fn test_config_save_and_load() {
    let path = temp_path("config.json");
    let config = Config {
        window_width: 640,
        window_height: 480,
        camera_setup: Some(PathBuf::from("/tmp/cameras.json")),
        log_filter: "debug".to_string(),
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_config_load_missing_file_fails() {
    assert!(Config::load_from(&temp_path("does-not-exist.json")).is_err());
}

#[test]
fn test_config_load_or_default_without_file() {
    let config = Config::load_or_default(&temp_path("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_or_default_reports_bad_file() {
    let path = temp_path("broken.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    // The caller decides how to report it once logging is up
    assert!(matches!(
        Config::load_or_default(&path),
        Err(ConfigError::Parse(_))
    ));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_default_camera_setup_has_back_and_front() {
    let setup = CameraSetup::default();
    let facings: Vec<_> = setup.cameras.iter().map(|c| c.facing).collect();
    assert!(facings.contains(&Some(LensFacing::Back)));
    assert!(facings.contains(&Some(LensFacing::Front)));
    assert!(!setup.fail_manager_creation);
    assert!(!setup.fail_open);
    assert!(!setup.fail_stream_start);
}

#[test]
fn test_camera_setup_load_from_file() {
    let path = temp_path("setup.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        r#"{ "cameras": [ { "id": "7", "facing": "back" } ], "fail_open": true }"#,
    )
    .unwrap();

    let setup = CameraSetup::load(&path).unwrap();
    assert_eq!(setup.cameras.len(), 1);
    assert_eq!(setup.cameras[0].id.as_str(), "7");
    assert!(setup.fail_open);

    let _ = std::fs::remove_file(&path);
}
