//! Integration tests for Settings layered loading.
//!
//! These tests run without a global config (temp directories only), so they
//! exercise local config merging on top of compiled defaults.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use orgdraft::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
data_dir = "/srv/orgdraft"

[projection]
strict_squads = true
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.data_dir, PathBuf::from("/srv/orgdraft"));
    assert!(settings.projection.strict_squads);
    assert!(settings.projection_options().strict_squads);
    assert_eq!(settings.store_path(), PathBuf::from("/srv/orgdraft/org.json"));
}

#[test]
fn given_local_config_with_tilde_when_load_then_expands_home() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "data_dir = \"~/orgs\"\n").unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    let home = std::env::var("HOME").expect("HOME should be set");
    assert_eq!(settings.data_dir, PathBuf::from(home).join("orgs"));
}

#[test]
fn given_malformed_local_config_when_load_then_returns_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "data_dir = [unterminated\n").unwrap();

    let result = Settings::load(Some(dir.path()));

    assert!(matches!(
        result,
        Err(orgdraft::application::ApplicationError::Config { .. })
    ));
}

#[test]
fn given_settings_when_rendered_as_toml_then_round_trips_through_loader() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        data_dir: PathBuf::from("/data/org"),
        projection: Default::default(),
    };

    // Act
    fs::write(local_config_path(dir.path()), settings.to_toml().unwrap()).unwrap();
    let loaded = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(loaded.data_dir, settings.data_dir);
}
