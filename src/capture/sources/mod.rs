//! Default capture backend: Hyprland/wlroots tools first, xdg-desktop-portal as fallback.

use async_trait::async_trait;

use crate::capture::types::{CaptureError, CapturedImage};
use crate::jobs::CaptureService;

mod hyprland;
mod portal;
pub(crate) mod reader;

/// Captures through compositor tooling where available and the desktop
/// portal otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortalCaptureService;

#[async_trait]
impl CaptureService for PortalCaptureService {
    async fn capture_full_screen(&self) -> Result<Option<CapturedImage>, CaptureError> {
        let data = portal::capture_via_portal_bytes(false).await?;
        data.map(CapturedImage::from_png).transpose()
    }

    async fn capture_region(&self) -> Result<Option<CapturedImage>, CaptureError> {
        let data = match hyprland::capture_selection_slurp().await {
            Ok(data) => data,
            Err(e) => {
                log::warn!(
                    "Region capture via slurp failed: {}. Falling back to portal.",
                    e
                );
                portal::capture_via_portal_bytes(true).await?
            }
        };
        data.map(CapturedImage::from_png).transpose()
    }

    async fn capture_active_window(&self) -> Result<Option<CapturedImage>, CaptureError> {
        let data = match hyprland::capture_active_window_hyprland().await {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!(
                    "Active window capture via Hyprland failed: {}. Falling back to portal.",
                    e
                );
                portal::capture_via_portal_bytes(true).await?
            }
        };
        data.map(CapturedImage::from_png).transpose()
    }
}
