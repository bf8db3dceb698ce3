use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use crate::capture::types::CaptureError;

// Some portals flush the file asynchronously after answering; poll for up to 3s.
const MAX_ATTEMPTS: usize = 60;
const ATTEMPT_DELAY: Duration = Duration::from_millis(50);

/// Read the portal's screenshot from a `file://` URI, then delete the temp file.
pub fn read_image_from_uri(uri: &str) -> Result<Vec<u8>, CaptureError> {
    let path = uri_to_path(uri)?;
    log::debug!("Reading screenshot from: {}", path.display());

    let data = wait_for_contents(&path)?;
    log::debug!("Read {} bytes from portal screenshot", data.len());

    if let Err(e) = fs::remove_file(&path) {
        log::warn!(
            "Failed to remove portal temp file {}: {}",
            path.display(),
            e
        );
    }

    Ok(data)
}

/// Percent-decodes the URI (spaces, non-ASCII) into a local path.
fn uri_to_path(uri: &str) -> Result<PathBuf, CaptureError> {
    let url = url::Url::parse(uri)
        .map_err(|e| CaptureError::InvalidResponse(format!("Invalid file URI '{}': {}", uri, e)))?;

    url.to_file_path().map_err(|_| {
        CaptureError::InvalidResponse(format!("Cannot convert URI to path: {}", uri))
    })
}

fn wait_for_contents(path: &Path) -> Result<Vec<u8>, CaptureError> {
    for attempt in 1..=MAX_ATTEMPTS {
        match fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => return Ok(bytes),
            Ok(_) => log::trace!(
                "Portal screenshot {} still empty (attempt {}/{})",
                path.display(),
                attempt,
                MAX_ATTEMPTS
            ),
            Err(e) => log::trace!(
                "Portal screenshot {} not ready (attempt {}/{}): {}",
                path.display(),
                attempt,
                MAX_ATTEMPTS,
                e
            ),
        }
        if attempt < MAX_ATTEMPTS {
            thread::sleep(ATTEMPT_DELAY);
        }
    }

    Err(CaptureError::ImageError(format!(
        "Portal screenshot file {} not ready after {} attempts",
        path.display(),
        MAX_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_and_removes_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("capture file.png");
        std::fs::write(&file_path, b"portal-bytes").unwrap();
        let uri = url::Url::from_file_path(&file_path).unwrap().to_string();

        let data = read_image_from_uri(&uri).expect("read succeeds");
        assert_eq!(data, b"portal-bytes");
        assert!(!file_path.exists(), "portal temp file should be deleted");
    }

    #[test]
    fn rejects_non_file_uri() {
        let err = read_image_from_uri("https://example.com/shot.png").unwrap_err();
        assert!(matches!(err, CaptureError::InvalidResponse(_)));
    }
}
