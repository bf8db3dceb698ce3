//! Capture-and-share job pipeline.
//!
//! A job captures the screen (full screen, region or active window) and then
//! applies the actions enabled in its [`JobSettings`]: save to disk, copy to
//! the clipboard, open in an editor, upload and share the URL. Jobs are
//! started, listed and cancelled through a [`JobRegistry`].

pub mod capture;
pub mod config;
pub mod editor;
pub mod jobs;
pub mod notification;
pub mod upload;
pub mod util;

pub use config::Config;
pub use jobs::{Job, JobDependencies, JobKind, JobRegistry, JobSettings, JobStatus};
