//! Editor configuration.
//!
//! Configuration is a TOML document with four sections:
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [ids]
//! submodel = "https://example.com/ids/sm/DDDD_DDDD_DDDD_DDDD"
//! max_attempts = 16
//!
//! [clone]
//! recursive = true
//! generate_new_ids = true
//!
//! [remote]
//! timeout_secs = 30
//! offer_mirror_delete = true
//! ```
//!
//! Values can be overridden through `AASX_*` variables, see
//! [`EditorConfig::merge_overrides`].
//!
//! # Example
//!
//! ```no_run
//! use aasx_core::config::EditorConfig;
//! use std::path::Path;
//!
//! # async fn example() -> aasx_core::Result<()> {
//! let mut config = EditorConfig::load_from_path(Path::new("editor.toml")).await?;
//! config.remote.timeout_secs = 10;
//! config.save_to_path(Path::new("editor.toml")).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AasxError, Result};
use crate::idgen::IdTemplates;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "AASX_";

pub const ENV_LOG_LEVEL: &str = "AASX_LOG_LEVEL";
pub const ENV_REMOTE_TIMEOUT_SECS: &str = "AASX_REMOTE_TIMEOUT_SECS";
pub const ENV_REMOTE_PAGE_SIZE: &str = "AASX_REMOTE_PAGE_SIZE";
pub const ENV_ID_MAX_ATTEMPTS: &str = "AASX_ID_MAX_ATTEMPTS";
pub const ENV_CLONE_GENERATE_NEW_IDS: &str = "AASX_CLONE_GENERATE_NEW_IDS";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub general: GeneralConfig,
    pub ids: IdTemplates,
    pub clone: CloneDefaults,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Defaults for clone and paste operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneDefaults {
    pub recursive: bool,
    pub generate_new_ids: bool,
    pub copy_supplementary_files: bool,
    pub repair_self_references: bool,
}

impl Default for CloneDefaults {
    fn default() -> Self {
        Self {
            recursive: true,
            generate_new_ids: true,
            copy_supplementary_files: true,
            repair_self_references: false,
        }
    }
}

/// Remote repository mirroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub timeout_secs: u64,
    pub page_size: usize,
    pub offer_mirror_delete: bool,
    pub offer_mirror_rename: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            page_size: 100,
            offer_mirror_delete: true,
            offer_mirror_rename: true,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EditorConfig {
    /// Load configuration from a TOML file, apply process environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AasxError::config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&content)?;
        config.merge_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AasxError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration atomically: write a temp file, then rename.
    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AasxError::config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AasxError::config(format!("Failed to serialize config: {}", e)))?;

        let temp_path = path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| AasxError::config(format!("Failed to write config file: {}", e)))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| AasxError::config(format!("Failed to rename config file: {}", e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(AasxError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        for (name, template) in [
            ("shell", &self.ids.shell),
            ("submodel", &self.ids.submodel),
            ("concept_description", &self.ids.concept_description),
            ("asset", &self.ids.asset),
        ] {
            if template.trim().is_empty() {
                return Err(AasxError::config(format!(
                    "Id template '{}' must not be empty",
                    name
                )));
            }
        }

        if self.ids.max_attempts == 0 {
            return Err(AasxError::config("max_attempts must be greater than 0"));
        }

        if self.remote.timeout_secs == 0 {
            return Err(AasxError::config("timeout_secs must be greater than 0"));
        }

        if self.remote.page_size == 0 {
            return Err(AasxError::config("page_size must be greater than 0"));
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Merge overrides looked up by variable name.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean override cannot be parsed
    pub fn merge_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Merging {}* overrides", ENV_PREFIX);

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            debug!("Overriding log_level: {}", log_level);
            self.general.log_level = log_level;
        }

        if let Some(timeout) = lookup(ENV_REMOTE_TIMEOUT_SECS) {
            self.remote.timeout_secs = parse_override(ENV_REMOTE_TIMEOUT_SECS, &timeout)?;
            debug!("Overriding remote timeout: {}s", self.remote.timeout_secs);
        }

        if let Some(page_size) = lookup(ENV_REMOTE_PAGE_SIZE) {
            self.remote.page_size = parse_override(ENV_REMOTE_PAGE_SIZE, &page_size)?;
            debug!("Overriding remote page size: {}", self.remote.page_size);
        }

        if let Some(attempts) = lookup(ENV_ID_MAX_ATTEMPTS) {
            self.ids.max_attempts = parse_override(ENV_ID_MAX_ATTEMPTS, &attempts)?;
            debug!("Overriding id max_attempts: {}", self.ids.max_attempts);
        }

        if let Some(flag) = lookup(ENV_CLONE_GENERATE_NEW_IDS) {
            self.clone.generate_new_ids = parse_override(ENV_CLONE_GENERATE_NEW_IDS, &flag)?;
            debug!("Overriding clone generate_new_ids: {}", self.clone.generate_new_ids);
        }

        Ok(())
    }
}

fn parse_override<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AasxError::config(format!("Invalid value for {}: {}", key, e)))
}
