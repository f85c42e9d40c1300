//! locwatch-core: reconciliation engine for code location status polling
//!
//! Polls a status source, diffs each snapshot against the previous one, and
//! turns the differences into effects: spinner changes, notifications, and
//! cache-backed refetches of location details.
//!
//! # Main Entry Points
//!
//! - [`diff`] - Pure snapshot differ
//! - [`engine`] - Reconciliation state machine
//! - [`runner`] - Executes engine effects against the cache and notifiers
//! - [`poller`] - Timer loop that owns the engine
//! - [`visibility`] - Persisted hidden-repository set

pub mod diff;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod notify;
pub mod poller;
pub mod runner;
pub mod sources;
pub mod view;
pub mod visibility;
pub mod workspace;

pub use locwatch_protocol::{
    LoadStatus, LocationDetail, Notification, NotificationKind, RepoAddress, RepoOption,
    Snapshot, StatusEntry, StatusIndicator, ViewAction,
};

pub use diff::{DiffResult, diff};
pub use engine::{Effect, ReconciliationEngine, RefetchKind, RefetchTarget};
pub use errors::{LocwatchError, LocwatchResult};
pub use notify::{Notifier, NotifierRegistry, NotifyError};
pub use poller::{PollReport, Poller, PresentationStatus, wait_for_shutdown_signal};
pub use runner::{EffectRunner, LOCATION_CACHE_KEY_PREFIX, WorkspaceLoadReport, location_cache_key};
pub use sources::{DetailFetcher, DirectorySource, FetchError, PollError, StatusSource};
pub use view::{RouteView, StaticView, ViewContext};
pub use visibility::{VisibilityError, VisibilityKey, VisibilityStore};
pub use workspace::{Workspace, status_indicator};

pub use logging::init_logging;
