//! Shared wire and domain types for locwatch.
//!
//! Everything that crosses a crate boundary (status polls, location details,
//! notifications, presentation status) is defined here so the cache, core and
//! CLI crates agree on one shape.

mod notification;
mod types;

pub use notification::{Notification, NotificationKind, StatusIndicator, ViewAction};
pub use types::{
    LoadStatus, LocationDetail, LocationLoad, RepoAddress, RepoAddressParseError, RepoOption,
    RepositorySummary, Snapshot, StatusEntry, StatusResponse,
};
