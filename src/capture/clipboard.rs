//! Wayland clipboard integration for images and URLs.

use std::process::{Command, Stdio};

use wl_clipboard_rs::copy::{MimeType, Options, Source};

use super::types::CapturedImage;
use crate::jobs::{ClipboardBridge, JobError};

const PNG_MIME: &str = "image/png";
const TEXT_MIME: &str = "text/plain;charset=utf-8";

/// Clipboard bridge backed by `wl-copy`, falling back to wl-clipboard-rs.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaylandClipboard;

impl ClipboardBridge for WaylandClipboard {
    fn set_text(&self, text: &str) -> Result<(), JobError> {
        copy_bytes(text.as_bytes(), TEXT_MIME)
    }

    fn set_image(&self, image: &CapturedImage) -> Result<(), JobError> {
        copy_bytes(&image.data, PNG_MIME)
    }
}

/// Copy bytes of the given MIME type to the Wayland clipboard.
///
/// Prefers the wl-copy CLI (from the wl-clipboard package) because it keeps
/// serving the selection after this process exits.
fn copy_bytes(data: &[u8], mime: &str) -> Result<(), JobError> {
    log::debug!("Copying {} bytes of {} to clipboard", data.len(), mime);

    let cmd_err = match copy_via_command(data, mime) {
        Ok(()) => {
            log::debug!("Copied to clipboard via wl-copy");
            return Ok(());
        }
        Err(e) => e,
    };

    log::warn!(
        "wl-copy command path failed ({}). Falling back to wl-clipboard-rs",
        cmd_err
    );
    copy_via_library(data, mime).map_err(|lib_err| {
        JobError::Clipboard(format!(
            "wl-copy failed: {} ; wl-clipboard-rs failed: {}",
            cmd_err, lib_err
        ))
    })
}

fn copy_via_library(data: &[u8], mime: &str) -> Result<(), String> {
    use wl_clipboard_rs::copy::ServeRequests;

    let mut opts = Options::new();
    // Serve one paste then exit
    opts.serve_requests(ServeRequests::Only(1));

    opts.copy(
        Source::Bytes(data.into()),
        MimeType::Specific(mime.to_string()),
    )
    .map_err(|e| format!("wl-clipboard-rs error: {}", e))
}

fn copy_via_command(data: &[u8], mime: &str) -> Result<(), String> {
    use std::io::Write;

    let mut child = Command::new("wl-copy")
        .arg("--type")
        .arg(mime)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn wl-copy (is it installed?): {}", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(data)
            .map_err(|e| format!("Failed to write to wl-copy stdin: {}", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for wl-copy: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("wl-copy exited with {}: {}", output.status, stderr.trim()));
    }

    Ok(())
}
