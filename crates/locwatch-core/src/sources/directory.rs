//! Directory-backed status source.
//!
//! Layout:
//! - `<dir>/status.json` holds a [`StatusResponse`]
//! - `<dir>/locations/<name>.json` holds a [`LocationDetail`]
//!
//! Whatever writes those files plays the role of the server.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use locwatch_paths::sanitize_component;
use locwatch_protocol::{LocationDetail, Snapshot, StatusResponse};
use tokio::fs;
use tracing::debug;

use super::errors::{FetchError, PollError};
use super::{DetailFetcher, StatusSource};

#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn status_file(&self) -> PathBuf {
        self.dir.join("status.json")
    }

    pub fn location_file(&self, name: &str) -> PathBuf {
        self.dir
            .join("locations")
            .join(format!("{}.json", sanitize_component(name)))
    }
}

#[async_trait]
impl StatusSource for DirectorySource {
    async fn poll_status(&self) -> Result<Snapshot, PollError> {
        let path = self.status_file();
        let content = fs::read(&path)
            .await
            .map_err(|e| PollError::Unreachable {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let response: StatusResponse =
            serde_json::from_slice(&content).map_err(|e| PollError::Malformed {
                message: format!("'{}': {}", path.display(), e),
            })?;

        match response {
            StatusResponse::Entries { entries } => {
                debug!(
                    event = "core.source.poll_completed",
                    entries = entries.len(),
                );
                Ok(entries)
            }
            StatusResponse::Error { message } => Err(PollError::Server { message }),
        }
    }
}

#[async_trait]
impl DetailFetcher for DirectorySource {
    async fn fetch_location(&self, name: &str) -> Result<LocationDetail, FetchError> {
        let path = self.location_file(name);
        let content = match fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => {
                return Err(FetchError::Transport {
                    name: name.to_string(),
                    message: e.to_string(),
                });
            }
        };

        serde_json::from_slice(&content).map_err(|e| FetchError::Malformed {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}
