//! Status and detail collaborators.
//!
//! [`StatusSource`] produces one [`Snapshot`] per poll and [`DetailFetcher`]
//! loads the full detail of one location. Both are object safe so the poller
//! and runner can hold them behind `Arc<dyn _>`.

pub mod directory;
pub mod errors;

pub use directory::DirectorySource;
pub use errors::{FetchError, PollError};

use async_trait::async_trait;
use locwatch_protocol::{LocationDetail, Snapshot};

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current status of every tracked location.
    ///
    /// A server-side error envelope is returned as `Err(PollError::Server)`.
    async fn poll_status(&self) -> Result<Snapshot, PollError>;
}

/// Loads one location's detail. Must be idempotent; calls may be coalesced.
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_location(&self, name: &str) -> Result<LocationDetail, FetchError>;
}
