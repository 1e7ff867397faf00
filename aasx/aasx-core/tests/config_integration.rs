//! Integration tests for the configuration system
//!
//! These tests verify:
//! - File I/O operations
//! - Override handling
//! - Error handling on invalid files

use aasx_core::config::{ENV_LOG_LEVEL, ENV_REMOTE_PAGE_SIZE, EditorConfig};
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to set up a temporary configuration location
fn setup_temp_env() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("editor.toml");
    (temp_dir, config_path)
}

#[tokio::test]
async fn test_save_then_load() {
    let (_temp_dir, config_path) = setup_temp_env();

    let mut config = EditorConfig::default();
    config.general.log_level = "debug".to_string();
    config.ids.submodel = "urn:acme:sm:XXXX-XXXX".to_string();
    config.clone.repair_self_references = true;
    config.save_to_path(&config_path).await.unwrap();

    assert!(config_path.exists());
    assert!(!config_path.with_extension("toml.tmp").exists());

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[ids]"));
    assert!(content.contains("urn:acme:sm:XXXX-XXXX"));

    let loaded = EditorConfig::from_toml_str(&content).unwrap();
    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_save_refuses_invalid_config() {
    let (_temp_dir, config_path) = setup_temp_env();

    let mut config = EditorConfig::default();
    config.remote.timeout_secs = 0;
    assert!(config.save_to_path(&config_path).await.is_err());
    assert!(!config_path.exists());
}

#[tokio::test]
async fn test_load_missing_file() {
    let (_temp_dir, config_path) = setup_temp_env();
    let err = EditorConfig::load_from_path(&config_path).await.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[tokio::test]
async fn test_load_invalid_toml() {
    let (_temp_dir, config_path) = setup_temp_env();
    std::fs::write(&config_path, "[general\nlog_level = ").unwrap();
    let err = EditorConfig::load_from_path(&config_path).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_overrides_apply_after_file_values() {
    let mut config = EditorConfig::from_toml_str(
        r#"
        [general]
        log_level = "warn"

        [remote]
        page_size = 10
        "#,
    )
    .unwrap();

    config
        .merge_overrides(|key| match key {
            k if k == ENV_LOG_LEVEL => Some("trace".to_string()),
            k if k == ENV_REMOTE_PAGE_SIZE => Some(" 250 ".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.general.log_level, "trace");
    assert_eq!(config.remote.page_size, 250);
    assert!(config.validate().is_ok());
}
