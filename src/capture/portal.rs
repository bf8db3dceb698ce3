//! xdg-desktop-portal integration for screenshot capture.

use super::types::CaptureError;
use futures::StreamExt;
use std::collections::HashMap;
use zbus::zvariant::OwnedValue;
use zbus::{Connection, proxy};

/// D-Bus proxy for the xdg-desktop-portal Screenshot interface.
#[proxy(
    interface = "org.freedesktop.portal.Screenshot",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop"
)]
trait Screenshot {
    /// Take a screenshot.
    ///
    /// # Arguments
    /// * `parent_window` - Identifier for the parent window (empty string for none)
    /// * `options` - Options for the screenshot
    ///
    /// # Returns
    /// Response containing the URI to the screenshot file
    async fn screenshot(
        &self,
        parent_window: &str,
        options: HashMap<String, zbus::zvariant::Value<'_>>,
    ) -> zbus::Result<zbus::zvariant::OwnedObjectPath>;
}

/// D-Bus proxy for org.freedesktop.portal.Request interface.
/// This is used to receive the Response signal from the portal.
#[proxy(
    interface = "org.freedesktop.portal.Request",
    default_service = "org.freedesktop.portal.Desktop"
)]
trait Request {
    /// Response signal emitted when the request is completed.
    ///
    /// # Signal Arguments
    /// * `response` - Response code (0 = success, 1 = cancelled, 2 = other error)
    /// * `results` - Dictionary containing the results (e.g., "uri" key)
    #[zbus(signal)]
    fn response(&self, response: u32, results: HashMap<String, OwnedValue>) -> zbus::Result<()>;
}

/// Capture a screenshot using xdg-desktop-portal.
///
/// With `interactive` set the portal lets the user pick a region or window
/// before capturing. The portal may also prompt for permission.
///
/// Returns the URI of the screenshot file, or `None` when the user dismissed
/// the portal dialog.
pub async fn capture_via_portal(interactive: bool) -> Result<Option<String>, CaptureError> {
    log::debug!(
        "Initiating portal screenshot capture (interactive={})",
        interactive
    );

    let connection = Connection::session()
        .await
        .map_err(CaptureError::DBusError)?;

    let proxy = ScreenshotProxy::new(&connection)
        .await
        .map_err(CaptureError::DBusError)?;

    let options = build_portal_options(interactive);
    log::debug!("Calling portal screenshot with options: {:?}", options);

    // The call returns a Request object path; the result arrives as a signal on it
    let request_path = proxy.screenshot("", options).await.map_err(|e| {
        log::error!("Portal screenshot call failed: {}", e);
        if e.to_string().contains("denied") {
            CaptureError::PermissionDenied
        } else {
            CaptureError::DBusError(e)
        }
    })?;

    log::debug!("Screenshot request created: {:?}", request_path);

    let request_proxy = RequestProxy::builder(&connection)
        .path(request_path.clone())
        .map_err(CaptureError::DBusError)?
        .build()
        .await
        .map_err(CaptureError::DBusError)?;

    let mut response_stream = request_proxy
        .receive_response()
        .await
        .map_err(CaptureError::DBusError)?;

    let response_signal = response_stream
        .next()
        .await
        .ok_or_else(|| CaptureError::InvalidResponse("No Response signal received".to_string()))?;

    let args = response_signal.args().map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse response args: {}", e))
    })?;

    log::debug!(
        "Response signal received: code={}, results={:?}",
        args.response,
        args.results
    );

    // 0 = success, 1 = cancelled, 2 = other error
    match args.response {
        0 => {
            let uri_value = args.results.get("uri").ok_or_else(|| {
                CaptureError::InvalidResponse("No 'uri' field in response".to_string())
            })?;

            let uri_str: &str = uri_value.downcast_ref().map_err(|e| {
                CaptureError::InvalidResponse(format!("URI is not a string: {}", e))
            })?;

            log::info!("Portal screenshot captured: {}", uri_str);
            Ok(Some(uri_str.to_string()))
        }
        1 => {
            log::info!("Portal screenshot dismissed by user");
            Ok(None)
        }
        code => Err(CaptureError::InvalidResponse(format!(
            "Portal returned error code {}",
            code
        ))),
    }
}

fn build_portal_options(interactive: bool) -> HashMap<String, zbus::zvariant::Value<'static>> {
    let mut options = HashMap::new();
    options.insert("modal".to_string(), false.into());
    options.insert("interactive".to_string(), interactive.into());
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_options_are_not_interactive() {
        let options = build_portal_options(false);
        assert_eq!(
            options.get("interactive"),
            Some(&zbus::zvariant::Value::from(false))
        );
        assert_eq!(
            options.get("modal"),
            Some(&zbus::zvariant::Value::from(false))
        );
    }

    #[test]
    fn region_options_are_interactive() {
        let options = build_portal_options(true);
        assert_eq!(
            options.get("interactive"),
            Some(&zbus::zvariant::Value::from(true))
        );
    }
}
