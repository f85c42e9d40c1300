//! Reconciliation state machine.
//!
//! The engine owns the last observed [`Snapshot`] and the `busy` flag. Each
//! poll result goes through [`ReconciliationEngine::on_poll`], which returns the
//! effects to execute. The engine performs no I/O itself; the
//! [`EffectRunner`](crate::runner::EffectRunner) does.
//!
//! Calls must be serialized. The [`Poller`](crate::poller::Poller) guarantees
//! this by owning the engine and taking `&mut self`.

use std::sync::Arc;

use locwatch_protocol::{Notification, Snapshot, StatusEntry};
use tracing::{debug, info, warn};

use crate::diff::diff;
use crate::notify::pluralize_locations;
use crate::sources::PollError;
use crate::view::ViewContext;

/// One location to refetch, at the version the current snapshot reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefetchTarget {
    pub name: String,
    pub version: i64,
}

impl RefetchTarget {
    pub fn new(name: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// Why a per-location refetch batch was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchKind {
    Added,
    Updated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowSpinner,
    HideSpinner,
    Notify(Notification),
    /// Refetch these locations and report each result (or one summary).
    Refetch {
        kind: RefetchKind,
        targets: Vec<RefetchTarget>,
    },
    /// Reload every current location and publish one summary.
    RefetchWorkspace { targets: Vec<RefetchTarget> },
    /// Drop state held for locations that left the snapshot.
    Forget { names: Vec<String> },
}

pub struct ReconciliationEngine {
    last_snapshot: Option<Snapshot>,
    busy: bool,
    view: Arc<dyn ViewContext>,
}

impl ReconciliationEngine {
    pub fn new(view: Arc<dyn ViewContext>) -> Self {
        Self {
            last_snapshot: None,
            busy: false,
            view,
        }
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn is_first_observation(&self) -> bool {
        self.last_snapshot.is_none()
    }

    /// Handle one poll result. A failed poll changes nothing.
    pub fn on_poll(&mut self, poll: Result<Snapshot, PollError>) -> Vec<Effect> {
        match poll {
            Ok(snapshot) => self.on_snapshot(snapshot),
            Err(e) => {
                warn!(
                    event = "core.engine.poll_failed",
                    error = %e,
                );
                Vec::new()
            }
        }
    }

    pub fn on_snapshot(&mut self, current: Snapshot) -> Vec<Effect> {
        let Some(previous) = self.last_snapshot.take() else {
            return self.first_observation(current);
        };

        let changes = diff(&previous, &current);
        let previously_loading = previous.any_loading();
        let currently_loading: Vec<String> =
            current.loading().iter().map(|e| e.name.clone()).collect();
        let overview = self.view.is_viewing_overview();
        let mut effects = Vec::new();

        if !changes.removed.is_empty() {
            effects.push(Effect::Forget {
                names: changes.removed.iter().map(|e| e.name.clone()).collect(),
            });
        }

        // Anomalous entries are treated as distinct, newly seen entities.
        for entry in &changes.anomalous {
            warn!(
                event = "core.engine.timestamp_decreased",
                id = %entry.id,
                name = %entry.name,
                update_timestamp = entry.update_timestamp,
            );
        }
        let added: Vec<&StatusEntry> = changes
            .added
            .iter()
            .chain(changes.anomalous.iter())
            .collect();
        if !added.is_empty() {
            let mut notification =
                Notification::info(format!("{} added", pluralize_locations(added.len())))
                    .with_view_action(overview);
            if let [only] = added.as_slice() {
                notification = notification.with_subject(&only.name);
            }
            effects.push(Effect::Notify(notification));
            effects.push(Effect::Refetch {
                kind: RefetchKind::Added,
                targets: added
                    .iter()
                    .map(|e| RefetchTarget::new(&e.name, e.update_timestamp))
                    .collect(),
            });
        }

        // Locations still loading are picked up by a later update or by the
        // workspace refetch once loading finishes.
        let updated: Vec<RefetchTarget> = changes
            .updated
            .iter()
            .filter_map(|old| {
                let new = current.get(&old.id)?;
                if new.is_loading() {
                    debug!(
                        event = "core.engine.refetch_deferred",
                        id = %old.id,
                        name = %old.name,
                    );
                    return None;
                }
                Some(RefetchTarget::new(&old.name, new.update_timestamp))
            })
            .collect();
        if !updated.is_empty() {
            effects.push(Effect::Refetch {
                kind: RefetchKind::Updated,
                targets: updated,
            });
        }

        match (previously_loading, !currently_loading.is_empty()) {
            (false, true) => {
                self.busy = true;
                effects.push(Effect::ShowSpinner);
                let notification = match currently_loading.as_slice() {
                    [only] => Notification::info(format!("Updating {}", only)).with_subject(only),
                    many => Notification::info(format!(
                        "Updating {}",
                        pluralize_locations(many.len())
                    )),
                };
                effects.push(Effect::Notify(notification.with_view_action(overview)));
            }
            (true, false) => {
                self.busy = false;
                effects.push(Effect::HideSpinner);
                effects.push(Effect::RefetchWorkspace {
                    targets: current
                        .iter()
                        .map(|e| RefetchTarget::new(&e.name, e.update_timestamp))
                        .collect(),
                });
            }
            _ => {}
        }

        info!(
            event = "core.engine.tick_completed",
            added = changes.added.len(),
            removed = changes.removed.len(),
            updated = changes.updated.len(),
            anomalous = changes.anomalous.len(),
            loading = currently_loading.len(),
            busy = self.busy,
            effects = effects.len(),
        );

        // A load-status flip with an unchanged timestamp still counts as a
        // change, otherwise the finished transition would repeat every tick.
        let replace = !changes.is_empty() || load_status_changed(&previous, &current);
        self.last_snapshot = Some(if replace { current } else { previous });

        effects
    }

    fn first_observation(&mut self, current: Snapshot) -> Vec<Effect> {
        let loading = current.any_loading();
        debug!(
            event = "core.engine.first_observation",
            entries = current.len(),
            loading = loading,
        );
        self.last_snapshot = Some(current);
        if loading {
            self.busy = true;
            vec![Effect::ShowSpinner]
        } else {
            Vec::new()
        }
    }
}

fn load_status_changed(previous: &Snapshot, current: &Snapshot) -> bool {
    let previous_by_id = previous.by_id();
    current.iter().any(|entry| {
        previous_by_id
            .get(entry.id.as_str())
            .is_some_and(|old| old.load_status != entry.load_status)
    })
}
