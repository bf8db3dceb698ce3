//! The two fixed pipeline stages.
//!
//! Each stage evaluates its flags in a fixed order and applies the matching
//! side effect. There is no per-action containment: the first error aborts
//! the remaining actions of that stage and is returned to the job, and
//! actions that already ran are not undone.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;
use tokio_util::sync::CancellationToken;

use super::{
    context::JobContext,
    dependencies::{ClipboardBridge, ImageSaver, JobDependencies, Notifier, UiBridge, Uploader},
    settings::{AfterCaptureFlags, AfterUploadFlags, JobSettings, SaveSettings},
    types::JobError,
};

/// A pipeline stage applying flag-gated side effects to a job context.
#[async_trait]
pub trait StageProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(
        &self,
        context: &mut JobContext,
        cancel: &CancellationToken,
    ) -> Result<(), JobError>;
}

/// Runs blocking collaborator calls off the async workers.
async fn blocking<T, F>(label: &'static str, f: F) -> Result<T, JobError>
where
    F: FnOnce() -> Result<T, JobError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| JobError::Task(format!("{} task failed: {}", label, e)))?
}

/// Capture-phase actions: save to file, copy to clipboard, open in editor.
pub struct CaptureStageProcessor {
    flags: AfterCaptureFlags,
    save: SaveSettings,
    saver: Arc<dyn ImageSaver>,
    clipboard: Arc<dyn ClipboardBridge>,
    ui: Arc<dyn UiBridge>,
}

impl CaptureStageProcessor {
    pub fn new(settings: &JobSettings, dependencies: &JobDependencies) -> Self {
        Self {
            flags: settings.after_capture,
            save: settings.save.clone(),
            saver: Arc::clone(&dependencies.saver),
            clipboard: Arc::clone(&dependencies.clipboard),
            ui: Arc::clone(&dependencies.ui),
        }
    }
}

#[async_trait]
impl StageProcessor for CaptureStageProcessor {
    fn name(&self) -> &'static str {
        "capture"
    }

    async fn process(
        &self,
        context: &mut JobContext,
        _cancel: &CancellationToken,
    ) -> Result<(), JobError> {
        let Some(image) = context.image.as_ref() else {
            log::debug!("No image captured, skipping after-capture actions");
            return Ok(());
        };

        if self.flags.save_to_file {
            let saver = Arc::clone(&self.saver);
            let (image, save) = (image.clone(), self.save.clone());
            let path = blocking("save", move || saver.save(&image, &save)).await?;
            log::info!("Image saved: {}", path.display());
            context.file_path = Some(path);
        }

        if self.flags.copy_image_to_clipboard {
            let clipboard = Arc::clone(&self.clipboard);
            let image = image.clone();
            blocking("clipboard", move || clipboard.set_image(&image)).await?;
            log::info!("Image copied to clipboard");
        }

        if self.flags.open_in_editor {
            // The context keeps its image; the editor gets its own copy.
            let ui = Arc::clone(&self.ui);
            let image = image.clone();
            blocking("editor", move || ui.show_editor(image)).await?;
            log::debug!("Editor requested");
        }

        Ok(())
    }
}

/// Upload-phase actions: upload, then copy the URL and notify.
pub struct UploadStageProcessor {
    upload_image: bool,
    flags: AfterUploadFlags,
    uploader: Option<Arc<dyn Uploader>>,
    clipboard: Arc<dyn ClipboardBridge>,
    notifier: Arc<dyn Notifier>,
}

impl UploadStageProcessor {
    pub fn new(settings: &JobSettings, dependencies: &JobDependencies) -> Self {
        Self {
            upload_image: settings.after_capture.upload_image,
            flags: settings.after_upload,
            uploader: dependencies.uploader.clone(),
            clipboard: Arc::clone(&dependencies.clipboard),
            notifier: Arc::clone(&dependencies.notifier),
        }
    }
}

#[async_trait]
impl StageProcessor for UploadStageProcessor {
    fn name(&self) -> &'static str {
        "upload"
    }

    async fn process(
        &self,
        context: &mut JobContext,
        cancel: &CancellationToken,
    ) -> Result<(), JobError> {
        if !self.upload_image {
            return Ok(());
        }
        let Some(uploader) = &self.uploader else {
            log::warn!("Upload requested but no uploader is configured");
            return Ok(());
        };
        let Some(source) = context.upload_source() else {
            log::debug!("Nothing to upload");
            return Ok(());
        };
        // The upload is the one network-bound action; skip it once a stop is pending.
        if cancel.is_cancelled() {
            log::info!("Stop requested, skipping upload");
            return Ok(());
        }

        let result = uploader.upload(source).await?;
        log::info!("Uploaded: {}", result.url);
        let url = result.url.clone();
        context.upload = Some(result);

        if self.flags.copy_url_to_clipboard {
            let clipboard = Arc::clone(&self.clipboard);
            let text = url.clone();
            blocking("clipboard", move || clipboard.set_text(&text)).await?;
            log::info!("URL copied to clipboard");
        }

        if self.flags.show_notification {
            self.notifier.notify("Upload complete", &url).await?;
        }

        Ok(())
    }
}
