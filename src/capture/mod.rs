//! Desktop collaborators for the job pipeline.
//!
//! This module provides the default implementations the job pipeline talks to:
//! - Full screen, region and active window capture
//! - Clipboard integration
//! - File saving with templated names

pub mod clipboard;
pub mod file;
pub mod portal;
pub mod types;

mod sources;

pub use clipboard::WaylandClipboard;
pub use file::{DiskSaver, PatternNamer};
pub use sources::PortalCaptureService;
pub use types::{CaptureError, CapturedImage};
