use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::store::KvStore;

struct MemoryRecord {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-process store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(String, String), MemoryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), MemoryRecord>>, StoreError>
    {
        self.records.lock().map_err(|e| StoreError::Unavailable {
            message: format!("memory store lock poisoned: {}", e),
        })
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut records = self.lock()?;
        let id = (namespace.to_string(), key.to_string());
        let expired = match records.get(&id) {
            None => return Ok(None),
            Some(record) => record.expires_at.is_some_and(|at| Instant::now() >= at),
        };
        if expired {
            records.remove(&id);
            return Ok(None);
        }
        Ok(records.get(&id).map(|r| r.data.clone()))
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.lock()?.insert(
            (namespace.to_string(), key.to_string()),
            MemoryRecord {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("ns", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set("ns", "k", b"v".to_vec(), None).await.unwrap();
        assert_eq!(store.get("ns", "k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = MemoryStore::new();
        store.set("a", "k", b"1".to_vec(), None).await.unwrap();
        assert!(store.get("b", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let store = MemoryStore::new();
        store
            .set("ns", "k", b"v".to_vec(), Some(Duration::ZERO))
            .await
            .unwrap();
        assert!(store.get("ns", "k").await.unwrap().is_none());
    }
}
