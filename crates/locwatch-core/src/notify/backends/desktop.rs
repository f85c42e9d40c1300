//! Desktop notification backend using notify-send (libnotify).

use async_trait::async_trait;
use locwatch_protocol::{Notification, NotificationKind};

use crate::notify::errors::NotifyError;
use crate::notify::traits::Notifier;

const TITLE: &str = "Code locations";

pub struct DesktopNotifier;

impl DesktopNotifier {
    fn urgency(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::Warning => "critical",
            NotificationKind::Info | NotificationKind::Success => "normal",
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn is_available(&self) -> bool {
        cfg!(target_os = "linux") && which::which("notify-send").is_ok()
    }

    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        if !self.is_available() {
            return Err(NotifyError::ToolNotFound {
                tool: "notify-send".to_string(),
            });
        }

        let urgency = Self::urgency(notification.kind);
        let body = notification.text.clone();

        let output = tokio::task::spawn_blocking(move || {
            std::process::Command::new("notify-send")
                .arg("--urgency")
                .arg(urgency)
                .arg(TITLE)
                .arg(body)
                .output()
        })
        .await
        .map_err(|e| NotifyError::SendFailed {
            message: format!("notify-send task failed: {}", e),
        })?
        .map_err(|e| NotifyError::SendFailed {
            message: format!("notify-send exec failed: {}", e),
        })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(NotifyError::SendFailed {
                message: format!("notify-send exit {}: {}", output.status, stderr.trim()),
            })
        }
    }
}
