//! The job pipeline.
//!
//! A [`Job`] captures an image and then runs two fixed stages over its
//! [`JobContext`]: the capture stage (save, clipboard, editor) and the upload
//! stage (upload, copy URL, notify). Every action is gated by a flag in
//! [`JobSettings`]. The [`JobRegistry`] starts jobs, keeps them for listing,
//! stops them in bulk and re-broadcasts their completion.

pub mod context;
pub mod dependencies;
pub mod processors;
pub mod settings;
pub mod types;

mod job;
mod registry;

pub use context::{JobContext, UploadResult, UploadSource};
pub use dependencies::{
    CaptureService, ClipboardBridge, FileNamer, ImageSaver, JobDependencies, NameContext,
    Notifier, UiBridge, Uploader,
};
pub use job::Job;
pub use processors::{CaptureStageProcessor, StageProcessor, UploadStageProcessor};
pub use registry::JobRegistry;
pub use settings::{AfterCaptureFlags, AfterUploadFlags, JobKind, JobSettings, SaveSettings};
pub use types::{JobError, JobEvent, JobId, JobInfo, JobStatus};
