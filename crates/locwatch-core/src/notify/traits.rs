use async_trait::async_trait;
use locwatch_protocol::Notification;

use super::errors::NotifyError;

/// A sink for user-facing notifications.
///
/// Publishing is fire-and-forget from the engine's point of view: the
/// registry logs failures and never propagates them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Backend identifier used in logs, e.g. "log" or "desktop".
    fn name(&self) -> &'static str;

    /// Whether this backend can deliver on the current machine.
    fn is_available(&self) -> bool {
        true
    }

    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}
