use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::capture::CapturedImage;

/// What an uploader produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub url: String,
}

impl UploadResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Data handed to an uploader: the saved file when there is one, otherwise
/// the in-memory capture.
#[derive(Debug, Clone, Copy)]
pub enum UploadSource<'a> {
    File(&'a Path),
    Image(&'a CapturedImage),
}

/// Mutable state of one job run.
///
/// Owned by its [`Job`](super::Job); only the job's own stages write to it.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub image: Option<CapturedImage>,
    pub file_path: Option<PathBuf>,
    pub upload: Option<UploadResult>,
    pub started_at: DateTime<Local>,
}

impl JobContext {
    pub fn new() -> Self {
        Self {
            image: None,
            file_path: None,
            upload: None,
            started_at: Local::now(),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Prefer the saved file, fall back to the captured image.
    pub fn upload_source(&self) -> Option<UploadSource<'_>> {
        match (&self.file_path, &self.image) {
            (Some(path), _) => Some(UploadSource::File(path)),
            (None, Some(image)) => Some(UploadSource::Image(image)),
            (None, None) => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.upload.as_ref().map(|upload| upload.url.as_str())
    }
}

impl Default for JobContext {
    fn default() -> Self {
        Self::new()
    }
}
