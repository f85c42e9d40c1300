//! Shared workspace state: the latest loaded detail per location.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use locwatch_protocol::{LocationDetail, RepoOption, Snapshot, StatusIndicator};
use tracing::debug;

#[derive(Debug, Clone)]
struct LoadedLocation {
    version: i64,
    detail: LocationDetail,
}

#[derive(Debug, Default)]
struct WorkspaceState {
    /// Location names in the most recent snapshot.
    tracked: BTreeSet<String>,
    loaded: BTreeMap<String, LoadedLocation>,
}

/// Cheaply cloneable handle to the workspace.
///
/// Details are applied monotonically: a result older than the one already
/// recorded for that location is discarded.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    inner: Arc<RwLock<WorkspaceState>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, WorkspaceState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, WorkspaceState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Record which locations exist and drop details for the rest.
    pub fn track(&self, snapshot: &Snapshot) {
        let mut state = self.write();
        state.tracked = snapshot.iter().map(|e| e.name.clone()).collect();
        let WorkspaceState { tracked, loaded } = &mut *state;
        loaded.retain(|name, _| tracked.contains(name));
    }

    /// Store `detail` unless a newer version is already recorded.
    pub fn apply(&self, name: &str, version: i64, detail: LocationDetail) -> bool {
        let mut state = self.write();
        if let Some(existing) = state.loaded.get(name)
            && existing.version > version
        {
            debug!(
                event = "core.workspace.stale_detail_discarded",
                location = name,
                version = version,
                recorded = existing.version,
            );
            return false;
        }
        state
            .loaded
            .insert(name.to_string(), LoadedLocation { version, detail });
        true
    }

    pub fn forget(&self, names: &[String]) {
        let mut state = self.write();
        for name in names {
            state.tracked.remove(name);
            state.loaded.remove(name);
        }
    }

    pub fn version_of(&self, name: &str) -> Option<i64> {
        self.read().loaded.get(name).map(|l| l.version)
    }

    pub fn detail(&self, name: &str) -> Option<LocationDetail> {
        self.read().loaded.get(name).map(|l| l.detail.clone())
    }

    /// Loaded details ordered by location name.
    pub fn details(&self) -> Vec<LocationDetail> {
        self.read()
            .loaded
            .values()
            .map(|l| l.detail.clone())
            .collect()
    }

    /// True until every tracked location has a detail.
    pub fn loading(&self) -> bool {
        let state = self.read();
        state
            .tracked
            .iter()
            .any(|name| !state.loaded.contains_key(name))
    }

    pub fn failed_count(&self) -> usize {
        self.read()
            .loaded
            .values()
            .filter(|l| l.detail.is_error())
            .count()
    }

    /// Every repository of every loaded location, sorted by `location:repository`.
    pub fn all_repos(&self) -> Vec<RepoOption> {
        let state = self.read();
        let mut repos: Vec<RepoOption> = state
            .loaded
            .iter()
            .flat_map(|(location, l)| {
                l.detail
                    .repositories()
                    .iter()
                    .map(move |r| RepoOption::new(&r.name, location))
            })
            .collect();
        repos.sort_by_cached_key(|r| format!("{}:{}", r.location, r.repository));
        repos
    }
}

/// What to show next to the navigation entry.
///
/// The spinner wins while busy. Otherwise any failed location yields a warning.
pub fn status_indicator(busy: bool, workspace: &Workspace) -> Option<StatusIndicator> {
    if busy {
        return Some(StatusIndicator::Spinner {
            content: "Loading definitions…".to_string(),
        });
    }

    match workspace.failed_count() {
        0 => None,
        1 => Some(StatusIndicator::Warning {
            content: "1 code location failed to load".to_string(),
        }),
        n => Some(StatusIndicator::Warning {
            content: format!("{} code locations failed to load", n),
        }),
    }
}
