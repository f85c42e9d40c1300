//! Notification sink that only writes structured log lines.

use async_trait::async_trait;
use locwatch_protocol::{Notification, NotificationKind};
use tracing::{info, warn};

use crate::notify::errors::NotifyError;
use crate::notify::traits::Notifier;

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        let subject = notification.subject.as_deref().unwrap_or("");
        match notification.kind {
            NotificationKind::Warning => warn!(
                event = "core.notify.published",
                kind = %notification.kind,
                subject = subject,
                text = %notification.text,
            ),
            NotificationKind::Info | NotificationKind::Success => info!(
                event = "core.notify.published",
                kind = %notification.kind,
                subject = subject,
                text = %notification.text,
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert_eq!(notifier.name(), "log");
        assert!(notifier.is_available());
        assert!(
            notifier
                .publish(&Notification::warning("1 code location failed to load"))
                .await
                .is_ok()
        );
    }
}
