//! Configuration file support for snapflow.
//!
//! Settings live at `~/.config/snapflow/config.toml`. They provide the default
//! job (kind, after-capture and after-upload actions, save location) plus the
//! commands used for the editor and uploader. A missing file means defaults.

pub mod types;

pub use types::{EditorConfig, UploadConfig};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::jobs::{
    JobSettings,
    settings::{default_filename_template, default_save_directory},
};

/// Root configuration.
///
/// # Example TOML
/// ```toml
/// [job]
/// job = "rectangle-region"
///
/// [job.after_capture]
/// save_to_file = true
/// copy_image_to_clipboard = true
///
/// [job.save]
/// directory = "~/Pictures/Screenshots"
/// filename_template = "shot_%Y%m%d_{counter:4}"
///
/// [editor]
/// command = "swappy -f"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Job run when no overrides are given
    #[serde(default)]
    pub job: JobSettings,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

impl Config {
    /// Replaces blank values with their defaults, logging each fix.
    fn validate(&mut self) {
        if self.job.save.directory.as_os_str().is_empty() {
            log::warn!("Empty save directory, falling back to default");
            self.job.save.directory = default_save_directory();
        }

        if self.job.save.filename_template.trim().is_empty() {
            log::warn!("Empty filename_template, falling back to default");
            self.job.save.filename_template = default_filename_template();
        }

        for (name, command) in [
            ("editor", &mut self.editor.command),
            ("upload", &mut self.upload.command),
        ] {
            if command.as_deref().is_some_and(|c| c.trim().is_empty()) {
                log::warn!("Empty {} command, disabling it", name);
                *command = None;
            }
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("snapflow");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads the configuration file, or returns defaults if there is none.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Loads configuration from `config_path`, falling back to defaults if
    /// the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Writes the configuration as TOML, creating the parent directory.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = self.to_toml()?;
        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// JSON schema of the config file, for editor tooling.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}
