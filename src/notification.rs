//! Desktop notifications via freedesktop D-Bus.

use std::collections::HashMap;

use async_trait::async_trait;
use zbus::{Connection, proxy};

use crate::jobs::{JobError, Notifier};

const APP_NAME: &str = "Snapflow";
const ICON: &str = "camera-photo";
const EXPIRE_TIMEOUT_MS: i32 = 5000;

/// D-Bus interface for freedesktop Notifications.
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Returns the notification ID.
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Sends notifications to the session's notification daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, summary: &str, body: &str) -> Result<(), JobError> {
        send_notification(summary, body)
            .await
            .map_err(|e| JobError::Notification(e.to_string()))
    }
}

async fn send_notification(summary: &str, body: &str) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    let proxy = NotificationsProxy::new(&connection).await?;

    let id = proxy
        .notify(
            APP_NAME,
            0,
            ICON,
            summary,
            body,
            vec![],
            HashMap::new(),
            EXPIRE_TIMEOUT_MS,
        )
        .await?;
    log::debug!("Sent notification {} ({})", id, summary);
    Ok(())
}
