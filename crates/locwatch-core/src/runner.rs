//! Executes engine effects.
//!
//! Refetches go through the shared [`VersionedCache`], so a location requested
//! by several effects (or several ticks) at the same version loads once.
//! Every effect runs in its own task; [`EffectRunner::dispatch`] never blocks
//! the poll loop.

use std::sync::Arc;

use futures::future::join_all;
use locwatch_cache::{KvStore, QUERY_CACHE_NAMESPACE, VersionedCache};
use locwatch_protocol::{LocationDetail, Notification, Snapshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{Effect, RefetchKind, RefetchTarget};
use crate::notify::{NotifierRegistry, pluralize_locations};
use crate::sources::{DetailFetcher, FetchError};
use crate::view::ViewContext;
use crate::workspace::Workspace;

pub const LOCATION_CACHE_KEY_PREFIX: &str = "LocationWorkspace";

/// Whether a load may be answered from the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    CacheFirst,
    Bypass,
}

/// Cache key for one location's detail.
pub fn location_cache_key(name: &str) -> String {
    format!("{}:{}", LOCATION_CACHE_KEY_PREFIX, name)
}

/// Outcome of loading a set of locations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkspaceLoadReport {
    pub loaded: Vec<String>,
    /// Locations whose detail is an error payload or whose fetch failed.
    pub failed: Vec<String>,
}

impl WorkspaceLoadReport {
    pub fn total(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }
}

#[derive(Clone)]
pub struct EffectRunner {
    cache: VersionedCache<LocationDetail, FetchError>,
    fetcher: Arc<dyn DetailFetcher>,
    notifiers: NotifierRegistry,
    view: Arc<dyn ViewContext>,
    workspace: Workspace,
}

impl EffectRunner {
    pub fn new(
        store: Arc<dyn KvStore>,
        fetcher: Arc<dyn DetailFetcher>,
        notifiers: NotifierRegistry,
        view: Arc<dyn ViewContext>,
    ) -> Self {
        Self {
            cache: VersionedCache::new(store, QUERY_CACHE_NAMESPACE),
            fetcher,
            notifiers,
            view,
            workspace: Workspace::new(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn cache(&self) -> &VersionedCache<LocationDetail, FetchError> {
        &self.cache
    }

    /// Spawn one task per effect and return their handles.
    ///
    /// Callers may drop the handles; tests join them to observe completion.
    pub fn dispatch(&self, effects: Vec<Effect>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for effect in effects {
            match effect {
                Effect::ShowSpinner => {
                    debug!(event = "core.runner.spinner_shown");
                }
                Effect::HideSpinner => {
                    debug!(event = "core.runner.spinner_hidden");
                }
                Effect::Forget { names } => {
                    self.workspace.forget(&names);
                }
                Effect::Notify(notification) => {
                    let notifiers = self.notifiers.clone();
                    handles.push(tokio::spawn(async move {
                        notifiers.publish(&notification).await;
                    }));
                }
                Effect::Refetch { kind, targets } => {
                    let runner = self.clone();
                    handles.push(tokio::spawn(async move {
                        runner.refetch(kind, targets).await;
                    }));
                }
                Effect::RefetchWorkspace { targets } => {
                    let runner = self.clone();
                    handles.push(tokio::spawn(async move {
                        runner.refetch_workspace(targets).await;
                    }));
                }
            }
        }
        handles
    }

    /// Load every location of `snapshot` without notifying.
    ///
    /// Used for the initial workspace load after the first poll.
    pub async fn load_workspace(&self, snapshot: &Snapshot) -> WorkspaceLoadReport {
        self.workspace.track(snapshot);
        let targets: Vec<RefetchTarget> = snapshot
            .iter()
            .map(|e| RefetchTarget::new(&e.name, e.update_timestamp))
            .collect();
        let report = self.load_all(&targets, Lookup::CacheFirst).await;
        info!(
            event = "core.runner.workspace_load_completed",
            loaded = report.loaded.len(),
            failed = report.failed.len(),
        );
        report
    }

    async fn refetch(&self, kind: RefetchKind, targets: Vec<RefetchTarget>) {
        info!(
            event = "core.runner.refetch_started",
            kind = ?kind,
            targets = targets.len(),
        );

        match (kind, targets.as_slice()) {
            (RefetchKind::Updated, [_, _, ..]) => {
                let report = self.load_all(&targets, Lookup::CacheFirst).await;
                self.publish(batch_summary(&report)).await;
            }
            _ => {
                // Per-location results, published as each one lands.
                let each = targets.iter().map(|target| async move {
                    let ok = self.load_one(target, Lookup::CacheFirst).await;
                    self.publish(self.location_result(&target.name, ok)).await;
                });
                join_all(each).await;
            }
        }
    }

    /// Reload every location from the source. A stored record at the same
    /// version may predate the end of loading, so the cache is not consulted.
    async fn refetch_workspace(&self, targets: Vec<RefetchTarget>) {
        let report = self.load_all(&targets, Lookup::Bypass).await;
        info!(
            event = "core.runner.workspace_refetch_completed",
            loaded = report.loaded.len(),
            failed = report.failed.len(),
        );
        let notification = if report.failed.is_empty() {
            Notification::success("Definitions reloaded")
        } else {
            Notification::warning(format!(
                "{} failed to load",
                pluralize_locations(report.failed.len())
            ))
        };
        self.publish(notification).await;
    }

    async fn load_all(&self, targets: &[RefetchTarget], lookup: Lookup) -> WorkspaceLoadReport {
        let results = join_all(targets.iter().map(|t| self.load_one(t, lookup))).await;
        let mut report = WorkspaceLoadReport::default();
        for (target, ok) in targets.iter().zip(results) {
            if ok {
                report.loaded.push(target.name.clone());
            } else {
                report.failed.push(target.name.clone());
            }
        }
        report
    }

    /// Fetch one location through the cache and apply it. Returns whether the
    /// location loaded without errors.
    async fn load_one(&self, target: &RefetchTarget, lookup: Lookup) -> bool {
        let fetcher = Arc::clone(&self.fetcher);
        let name = target.name.clone();
        let key = location_cache_key(&target.name);
        let loader = move || async move { fetcher.fetch_location(&name).await };
        let result = match lookup {
            Lookup::CacheFirst => self.cache.fetch_or_load(&key, target.version, loader).await,
            Lookup::Bypass => self.cache.reload(&key, target.version, loader).await,
        };

        match result {
            Ok(detail) => {
                let loaded = !detail.is_error();
                self.workspace.apply(&target.name, target.version, detail);
                loaded
            }
            Err(e) => {
                warn!(
                    event = "core.runner.location_fetch_failed",
                    location = %target.name,
                    error = %e,
                );
                false
            }
        }
    }

    fn location_result(&self, name: &str, loaded: bool) -> Notification {
        let notification = if loaded {
            Notification::success(format!("Location {} reloaded", name))
        } else {
            Notification::warning(format!("Location {} failed to load with errors", name))
        };
        notification.with_subject(name)
    }

    async fn publish(&self, notification: Notification) {
        let notification = notification.with_view_action(self.view.is_viewing_overview());
        self.notifiers.publish(&notification).await;
    }
}

/// One notification for a batch of reloads. Failed locations are named.
fn batch_summary(report: &WorkspaceLoadReport) -> Notification {
    let total = pluralize_locations(report.total());
    match report.failed.as_slice() {
        [] => Notification::success(format!("{} reloaded", total)),
        failed => {
            let notification = Notification::warning(format!(
                "{} of {} failed to load: {}",
                failed.len(),
                total,
                failed.join(", ")
            ));
            match failed {
                [only] => notification.with_subject(only),
                _ => notification,
            }
        }
    }
}
