//! Per-run job configuration.

use std::path::PathBuf;

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which capture a job performs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Capture every monitor.
    #[default]
    FullScreen,
    /// Let the user select a rectangle.
    RectangleRegion,
    /// Capture the focused window.
    ActiveWindow,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::FullScreen => write!(f, "full-screen"),
            JobKind::RectangleRegion => write!(f, "rectangle-region"),
            JobKind::ActiveWindow => write!(f, "active-window"),
        }
    }
}

/// Actions applied once an image has been captured.
///
/// Every flag is evaluated on its own; any combination is valid. The
/// capture stage runs save, clipboard and editor in that order.
/// `upload_image` is read by the upload stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AfterCaptureFlags {
    pub save_to_file: bool,
    pub copy_image_to_clipboard: bool,
    pub open_in_editor: bool,
    pub upload_image: bool,
}

impl AfterCaptureFlags {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Actions applied to an upload result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AfterUploadFlags {
    pub copy_url_to_clipboard: bool,
    pub show_notification: bool,
}

/// Where and under what name captures are saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SaveSettings {
    /// Directory to save captures to (`~/` is expanded).
    pub directory: PathBuf,
    /// Filename template without extension. Supports chrono format
    /// specifiers plus `{width}`, `{height}`, `{counter}` and `{counter:N}`.
    pub filename_template: String,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            directory: default_save_directory(),
            filename_template: default_filename_template(),
        }
    }
}

pub fn default_save_directory() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join("Snapflow")
}

pub fn default_filename_template() -> String {
    "capture_%Y-%m-%d_%H%M%S".to_string()
}

/// Settings for one job run. Read-only once the job starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct JobSettings {
    pub job: JobKind,
    pub after_capture: AfterCaptureFlags,
    pub after_upload: AfterUploadFlags,
    pub save: SaveSettings,
}

impl JobSettings {
    pub fn new(job: JobKind) -> Self {
        Self {
            job,
            ..Self::default()
        }
    }

    pub fn with_after_capture(mut self, flags: AfterCaptureFlags) -> Self {
        self.after_capture = flags;
        self
    }

    pub fn with_after_upload(mut self, flags: AfterUploadFlags) -> Self {
        self.after_upload = flags;
        self
    }

    pub fn with_save(mut self, save: SaveSettings) -> Self {
        self.save = save;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_means_capture_only() {
        let settings: JobSettings = toml::from_str("").unwrap();
        assert_eq!(settings.job, JobKind::FullScreen);
        assert!(settings.after_capture.is_empty());
        assert!(!settings.after_upload.copy_url_to_clipboard);
    }

    #[test]
    fn flags_parse_independently() {
        let settings: JobSettings = toml::from_str(
            r#"
            job = "rectangle-region"

            [after_capture]
            open_in_editor = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.job, JobKind::RectangleRegion);
        assert!(settings.after_capture.open_in_editor);
        assert!(!settings.after_capture.save_to_file);
        assert!(!settings.after_capture.is_empty());
    }
}
