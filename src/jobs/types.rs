//! Status, event and error types for jobs.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use thiserror::Error;

use super::settings::JobKind;

/// Registry-assigned job identifier, increasing in start order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a job.
///
/// `Queued → Preparing → Working → (Stopping →) Completed | Failed | Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Preparing,
    Working,
    /// Cancellation requested; the job has not reached a checkpoint yet.
    Stopping,
    Completed,
    Failed,
    Stopped,
}

impl JobStatus {
    /// Running states, the ones `request_stop` acts on.
    pub fn is_working(self) -> bool {
        matches!(
            self,
            JobStatus::Preparing | JobStatus::Working | JobStatus::Stopping
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Stopped
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Queued => "queued",
            JobStatus::Preparing => "preparing",
            JobStatus::Working => "working",
            JobStatus::Stopping => "stopping",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Notifications published by a job to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    /// Fired once per transition.
    StatusChanged(JobStatus),
    /// Fired exactly once, after the terminal status is set.
    Completed(JobStatus),
}

/// Errors raised by the stage processors. Any of these fails the job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to save image: {0}")]
    Save(#[from] std::io::Error),

    #[error("Clipboard operation failed: {0}")]
    Clipboard(String),

    #[error("Editor request failed: {0}")]
    Editor(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Point-in-time view of a job for listings.
#[derive(Debug, Clone)]
pub struct JobInfo {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub started_at: DateTime<Local>,
    pub file_path: Option<PathBuf>,
    pub url: Option<String>,
}
