//! File-backed store.
//!
//! One JSON file per record at `<root>/<namespace>/<key>.json`. The payload is
//! base64 encoded inside a small envelope carrying the expiry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use locwatch_paths::LocwatchPaths;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::store::KvStore;

#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    data: String,
}

pub struct FileStore {
    root: PathBuf,
    temp_counter: AtomicU64,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            temp_counter: AtomicU64::new(0),
        }
    }

    /// Store rooted at `~/.locwatch/store`.
    pub fn from_paths(paths: &LocwatchPaths) -> Self {
        Self::new(paths.store_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, namespace: &str, key: &str) -> PathBuf {
        LocwatchPaths::store_record_file(&self.root, namespace, key)
    }

    fn temp_path(&self, record: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = record
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.{}.tmp", std::process::id(), n));
        record.with_file_name(name)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl KvStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.record_path(namespace, key);
        let content = match fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };

        let corrupt = |message: String| StoreError::Corrupt {
            namespace: namespace.to_string(),
            key: key.to_string(),
            message,
        };
        let record: FileRecord =
            serde_json::from_slice(&content).map_err(|e| corrupt(e.to_string()))?;

        if let Some(expires_at) = record.expires_at
            && Utc::now() >= expires_at
        {
            debug!(
                event = "cache.store.record_expired",
                namespace = namespace,
                key = key,
            );
            if let Err(e) = fs::remove_file(&path).await {
                warn!(
                    event = "cache.store.expired_remove_failed",
                    path = %path.display(),
                    error = %e,
                );
            }
            return Ok(None);
        }

        BASE64
            .decode(record.data)
            .map(Some)
            .map_err(|e| corrupt(e.to_string()))
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let path = self.record_path(namespace, key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error(dir, e))?;
        }

        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        let record = FileRecord {
            expires_at,
            data: BASE64.encode(value),
        };
        let content = serde_json::to_vec(&record).map_err(|e| StoreError::Corrupt {
            namespace: namespace.to_string(),
            key: key.to_string(),
            message: e.to_string(),
        })?;

        // Write then rename so readers never observe a partial record.
        let temp = self.temp_path(&path);
        if let Err(e) = fs::write(&temp, &content).await {
            let _ = fs::remove_file(&temp).await;
            return Err(io_error(&temp, e));
        }
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(io_error(&path, e));
        }
        Ok(())
    }
}
