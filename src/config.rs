//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgdraft/orgdraft.toml`
//! 3. Local config: `./.orgdraft.toml` (working directory)
//! 4. Environment variables: `ORGDRAFT_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::ProjectionOptions;

/// Preview projection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Reject unknown squad ids instead of dropping them
    pub strict_squads: bool,
}

impl From<&ProjectionConfig> for ProjectionOptions {
    fn from(config: &ProjectionConfig) -> Self {
        Self {
            strict_squads: config.strict_squads,
        }
    }
}

/// Raw projection config for intermediate parsing (`None` = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawProjectionConfig {
    pub strict_squads: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub projection: RawProjectionConfig,
}

/// Unified configuration for orgdraft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the store and session files (default: ~/.orgdraft)
    pub data_dir: PathBuf,
    /// Preview projection settings
    pub projection: ProjectionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: dirs_default_data_dir(),
            projection: ProjectionConfig::default(),
        }
    }
}

/// Get the default data directory (~/.orgdraft).
fn dirs_default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".orgdraft"))
        .unwrap_or_else(|| PathBuf::from("~/.orgdraft"))
}

/// Get the XDG config directory for orgdraft.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgdraft").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgdraft.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".orgdraft.toml")
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Path of the JSON store document.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("org.json")
    }

    /// Path of the session file (active draft).
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.toml")
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions::from(&self.projection)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            projection: ProjectionConfig {
                strict_squads: overlay
                    .projection
                    .strict_squads
                    .unwrap_or(self.projection.strict_squads),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory searched for `.orgdraft.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/orgdraft/orgdraft.toml`
    /// 3. Local config: `<local_dir>/.orgdraft.toml`
    /// 4. Environment variables: `ORGDRAFT_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply ORGDRAFT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ORGDRAFT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_bool("projection.strict_squads") {
            settings.projection.strict_squads = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# orgdraft configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/orgdraft/orgdraft.toml
#   Local:  ./.orgdraft.toml
#   Env:    ORGDRAFT_* environment variables (e.g. ORGDRAFT_PROJECTION__STRICT_SQUADS=true)

# Directory holding org.json (store) and session.toml (active draft)
# data_dir = "~/.orgdraft"

[projection]
# Reject squad ids missing from the catalog instead of dropping them
# strict_squads = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_tilde_in_data_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/.orgdraft"),
            projection: ProjectionConfig::default(),
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.data_dir.to_string_lossy();
        assert!(dir.starts_with(&home), "data_dir should start with home: {dir}");
        assert!(!dir.contains('~'), "data_dir should not contain tilde: {dir}");
    }

    #[test]
    fn given_overlay_with_strict_squads_when_merging_then_overlay_wins() {
        let base = Settings {
            data_dir: PathBuf::from("/base"),
            projection: ProjectionConfig::default(),
        };
        let overlay = RawSettings {
            data_dir: None,
            projection: RawProjectionConfig {
                strict_squads: Some(true),
            },
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.data_dir, PathBuf::from("/base"));
        assert!(result.projection.strict_squads);
    }

    #[test]
    fn given_empty_overlay_when_merging_then_keeps_base() {
        let base = Settings {
            data_dir: PathBuf::from("/base"),
            projection: ProjectionConfig {
                strict_squads: true,
            },
        };

        let result = base.merge_with(&RawSettings::default());

        assert_eq!(result, base);
    }

    #[test]
    fn given_settings_when_deriving_paths_then_uses_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("/data"),
            projection: ProjectionConfig::default(),
        };

        assert_eq!(settings.store_path(), PathBuf::from("/data/org.json"));
        assert_eq!(settings.session_path(), PathBuf::from("/data/session.toml"));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.data_dir.is_none());
        assert!(raw.projection.strict_squads.is_none());
    }
}
