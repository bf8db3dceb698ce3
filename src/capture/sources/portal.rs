use crate::capture::{portal, types::CaptureError};

use super::reader::read_image_from_uri;

/// Capture using xdg-desktop-portal and return image bytes without blocking the Tokio runtime.
///
/// `None` means the user dismissed the portal dialog.
pub async fn capture_via_portal_bytes(interactive: bool) -> Result<Option<Vec<u8>>, CaptureError> {
    let Some(uri) = portal::capture_via_portal(interactive).await? else {
        return Ok(None);
    };
    log::debug!("Portal returned URI: {}", uri);

    tokio::task::spawn_blocking(move || read_image_from_uri(&uri))
        .await
        .map_err(|e| CaptureError::ImageError(format!("Portal reader task failed: {}", e)))?
        .map(Some)
}
