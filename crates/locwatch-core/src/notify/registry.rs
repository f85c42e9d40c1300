//! Fan-out over the configured notification backends.

use std::sync::Arc;

use locwatch_protocol::Notification;
use tracing::{debug, info, warn};

use super::backends::{DesktopNotifier, LogNotifier, StdoutNotifier};
use super::traits::Notifier;

/// Every backend a notification is delivered to.
///
/// Delivery is best effort: a failing backend is logged and skipped.
#[derive(Clone, Default)]
pub struct NotifierRegistry {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log sink, plus stdout and desktop when requested.
    ///
    /// The desktop backend is only registered when it reports itself available.
    pub fn standard(stdout: bool, desktop: bool) -> Self {
        let mut registry = Self::new().with(Arc::new(LogNotifier));
        if stdout {
            registry = registry.with(Arc::new(StdoutNotifier));
        }
        if desktop {
            let backend = DesktopNotifier;
            if backend.is_available() {
                registry = registry.with(Arc::new(backend));
            } else {
                debug!(
                    event = "core.notify.backend_skipped",
                    backend = backend.name(),
                    reason = "not available",
                );
            }
        }
        registry
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Deliver to every backend. Returns how many succeeded.
    pub async fn publish(&self, notification: &Notification) -> usize {
        info!(
            event = "core.notify.send_started",
            kind = %notification.kind,
            text = %notification.text,
        );

        let mut delivered = 0;
        for notifier in &self.notifiers {
            match notifier.publish(notification).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        event = "core.notify.send_failed",
                        backend = notifier.name(),
                        error = %e,
                    );
                }
            }
        }

        info!(
            event = "core.notify.send_completed",
            delivered = delivered,
            backends = self.notifiers.len(),
        );
        delivered
    }
}
