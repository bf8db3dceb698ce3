use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::{
    capture::{CaptureError, CapturedImage, DiskSaver, PortalCaptureService, WaylandClipboard},
    config::Config,
    editor::CommandEditor,
    notification::DesktopNotifier,
    upload::CommandUploader,
};

use super::{
    context::{UploadResult, UploadSource},
    settings::SaveSettings,
    types::JobError,
};

/// Screen capture backend.
///
/// `Ok(None)` is the normal "nothing captured" outcome (for example the
/// user dismissed a region selection). Errors are for infrastructure faults.
#[async_trait]
pub trait CaptureService: Send + Sync {
    async fn capture_full_screen(&self) -> Result<Option<CapturedImage>, CaptureError>;
    async fn capture_region(&self) -> Result<Option<CapturedImage>, CaptureError>;
    async fn capture_active_window(&self) -> Result<Option<CapturedImage>, CaptureError>;
}

/// Request to show the image editor. Fire-and-forget: the editor's
/// lifetime is not tracked.
pub trait UiBridge: Send + Sync {
    fn show_editor(&self, image: CapturedImage) -> Result<(), JobError>;
}

pub trait ClipboardBridge: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), JobError>;
    fn set_image(&self, image: &CapturedImage) -> Result<(), JobError>;
}

/// Values available to filename templates.
#[derive(Debug, Clone, Copy)]
pub struct NameContext {
    pub width: u32,
    pub height: u32,
    pub timestamp: DateTime<Local>,
}

/// Resolves a filename template to a file stem (no extension).
pub trait FileNamer: Send + Sync {
    fn resolve(&self, pattern: &str, context: &NameContext) -> String;
}

pub trait ImageSaver: Send + Sync {
    fn save(&self, image: &CapturedImage, settings: &SaveSettings) -> Result<PathBuf, JobError>;
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, source: UploadSource<'_>) -> Result<UploadResult, JobError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &str, body: &str) -> Result<(), JobError>;
}

/// Bundle of collaborators used by a job. Each component can be mocked in tests.
#[derive(Clone)]
pub struct JobDependencies {
    pub capture: Arc<dyn CaptureService>,
    pub saver: Arc<dyn ImageSaver>,
    pub clipboard: Arc<dyn ClipboardBridge>,
    pub ui: Arc<dyn UiBridge>,
    /// `None` turns the upload stage into a no-op.
    pub uploader: Option<Arc<dyn Uploader>>,
    pub notifier: Arc<dyn Notifier>,
}

impl JobDependencies {
    /// Desktop collaborators with the editor and uploader commands taken
    /// from `config`.
    pub fn from_config(config: &Config) -> Self {
        let uploader = config
            .upload
            .command
            .as_deref()
            .filter(|command| !command.trim().is_empty())
            .map(|command| Arc::new(CommandUploader::new(command)) as Arc<dyn Uploader>);

        Self {
            ui: Arc::new(CommandEditor::new(config.editor.command.clone())),
            uploader,
            ..Self::default()
        }
    }
}

impl Default for JobDependencies {
    fn default() -> Self {
        Self {
            capture: Arc::new(PortalCaptureService),
            saver: Arc::new(DiskSaver::default()),
            clipboard: Arc::new(WaylandClipboard),
            ui: Arc::new(CommandEditor::default()),
            uploader: None,
            notifier: Arc::new(DesktopNotifier),
        }
    }
}
