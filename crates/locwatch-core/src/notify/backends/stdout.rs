//! Notification sink printing one line per notification to stdout.

use async_trait::async_trait;
use locwatch_protocol::{Notification, NotificationKind};

use crate::notify::errors::NotifyError;
use crate::notify::traits::Notifier;

pub struct StdoutNotifier;

impl StdoutNotifier {
    /// Render a notification as a single terminal line.
    pub fn format(notification: &Notification) -> String {
        let marker = match notification.kind {
            NotificationKind::Info => "•",
            NotificationKind::Success => "✓",
            NotificationKind::Warning => "!",
        };
        format!("{} {}", marker, notification)
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        println!("{}", Self::format(notification));
        Ok(())
    }
}
