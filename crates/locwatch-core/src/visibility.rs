//! Persisted set of hidden repositories.
//!
//! The hidden set is a JSON array of `name:location` keys stored under
//! namespace `visibility`, key `<base_path>:hidden-repo-keys`. The base path
//! keeps deployments sharing one store apart.

use std::collections::BTreeSet;
use std::sync::Arc;

use locwatch_cache::{KvStore, StoreError};
use locwatch_protocol::{RepoAddress, RepoOption};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::LocwatchError;

pub const VISIBILITY_NAMESPACE: &str = "visibility";
const HIDDEN_REPO_KEYS: &str = "hidden-repo-keys";

#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    #[error("Failed to read hidden repositories: {source}")]
    Read {
        #[source]
        source: StoreError,
    },

    #[error("Failed to save hidden repositories: {source}")]
    Write {
        #[source]
        source: StoreError,
    },

    #[error("Failed to encode hidden repositories: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl LocwatchError for VisibilityError {
    fn error_code(&self) -> &'static str {
        match self {
            VisibilityError::Read { .. } => "VISIBILITY_READ_FAILED",
            VisibilityError::Write { .. } => "VISIBILITY_WRITE_FAILED",
            VisibilityError::Encode { .. } => "VISIBILITY_ENCODE_FAILED",
        }
    }
}

/// Anything that can be hidden by key.
pub trait VisibilityKey {
    fn visibility_key(&self) -> String;
}

impl VisibilityKey for RepoOption {
    fn visibility_key(&self) -> String {
        self.key()
    }
}

impl VisibilityKey for RepoAddress {
    fn visibility_key(&self) -> String {
        self.key()
    }
}

pub struct VisibilityStore {
    store: Arc<dyn KvStore>,
    key: String,
    // Serializes read-modify-write so concurrent toggles cannot lose updates.
    write_lock: Mutex<()>,
}

impl VisibilityStore {
    pub fn new(store: Arc<dyn KvStore>, base_path: &str) -> Self {
        Self {
            store,
            key: format!("{}:{}", base_path, HIDDEN_REPO_KEYS),
            write_lock: Mutex::new(()),
        }
    }

    /// Store key holding the hidden set.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// The persisted hidden set. A value that is not a JSON array of strings
    /// reads as empty.
    pub async fn hidden_keys(&self) -> Result<BTreeSet<String>, VisibilityError> {
        let bytes = self
            .store
            .get(VISIBILITY_NAMESPACE, &self.key)
            .await
            .map_err(|source| VisibilityError::Read { source })?;

        let Some(bytes) = bytes else {
            return Ok(BTreeSet::new());
        };
        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(keys) => Ok(keys.into_iter().collect()),
            Err(e) => {
                warn!(
                    event = "core.visibility.hidden_keys_invalid",
                    key = %self.key,
                    error = %e,
                );
                Ok(BTreeSet::new())
            }
        }
    }

    /// Flip membership of every key in one atomic update.
    pub async fn toggle_visible(
        &self,
        keys: &[String],
    ) -> Result<BTreeSet<String>, VisibilityError> {
        self.update("toggle", |hidden| {
            for key in keys {
                if !hidden.remove(key) {
                    hidden.insert(key.clone());
                }
            }
        })
        .await
    }

    /// Remove every key from the hidden set.
    pub async fn set_visible(
        &self,
        keys: &[String],
    ) -> Result<BTreeSet<String>, VisibilityError> {
        self.update("show", |hidden| {
            for key in keys {
                hidden.remove(key);
            }
        })
        .await
    }

    /// Add every key to the hidden set.
    pub async fn set_hidden(
        &self,
        keys: &[String],
    ) -> Result<BTreeSet<String>, VisibilityError> {
        self.update("hide", |hidden| {
            hidden.extend(keys.iter().cloned());
        })
        .await
    }

    /// Entities whose key is not hidden. A single entity is always visible.
    ///
    /// A hidden set that cannot be read is treated as empty.
    pub async fn visible_entities<T>(&self, all: &[T]) -> Vec<T>
    where
        T: VisibilityKey + Clone,
    {
        if all.len() == 1 {
            return all.to_vec();
        }
        let hidden = match self.hidden_keys().await {
            Ok(hidden) => hidden,
            Err(e) => {
                warn!(
                    event = "core.visibility.read_failed",
                    error = %e,
                );
                BTreeSet::new()
            }
        };
        filter_visible(all, &hidden)
    }

    async fn update<F>(
        &self,
        op: &'static str,
        mutate: F,
    ) -> Result<BTreeSet<String>, VisibilityError>
    where
        F: FnOnce(&mut BTreeSet<String>),
    {
        let _guard = self.write_lock.lock().await;

        let mut hidden = self.hidden_keys().await?;
        mutate(&mut hidden);

        let bytes =
            serde_json::to_vec(&hidden).map_err(|source| VisibilityError::Encode { source })?;
        self.store
            .set(VISIBILITY_NAMESPACE, &self.key, bytes, None)
            .await
            .map_err(|source| VisibilityError::Write { source })?;

        info!(
            event = "core.visibility.update_completed",
            op = op,
            hidden = hidden.len(),
        );
        Ok(hidden)
    }
}

/// Pure filter used by [`VisibilityStore::visible_entities`].
pub fn filter_visible<T>(all: &[T], hidden: &BTreeSet<String>) -> Vec<T>
where
    T: VisibilityKey + Clone,
{
    if all.len() == 1 {
        return all.to_vec();
    }
    all.iter()
        .filter(|entity| !hidden.contains(&entity.visibility_key()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use locwatch_cache::MemoryStore;

    fn store() -> (Arc<MemoryStore>, VisibilityStore) {
        let backing = Arc::new(MemoryStore::new());
        let visibility = VisibilityStore::new(backing.clone(), "/dagit");
        (backing, visibility)
    }

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_storage_key_is_scoped_by_base_path() {
        let (_, visibility) = store();
        assert_eq!(visibility.storage_key(), "/dagit:hidden-repo-keys");
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_original() {
        let (_, visibility) = store();
        visibility.set_hidden(&keys(&["b:loc"])).await.unwrap();
        let original = visibility.hidden_keys().await.unwrap();

        visibility.toggle_visible(&keys(&["a:loc"])).await.unwrap();
        assert!(visibility.hidden_keys().await.unwrap().contains("a:loc"));

        visibility.toggle_visible(&keys(&["a:loc"])).await.unwrap();
        assert_eq!(visibility.hidden_keys().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_toggle_flips_each_key() {
        let (_, visibility) = store();
        visibility.set_hidden(&keys(&["a:loc"])).await.unwrap();

        let hidden = visibility
            .toggle_visible(&keys(&["a:loc", "b:loc"]))
            .await
            .unwrap();
        assert_eq!(hidden.into_iter().collect::<Vec<_>>(), keys(&["b:loc"]));
    }

    #[tokio::test]
    async fn test_set_visible_and_set_hidden() {
        let (_, visibility) = store();
        visibility
            .set_hidden(&keys(&["a:loc", "b:loc"]))
            .await
            .unwrap();
        // Union: hiding an already hidden key is a no-op
        let hidden = visibility.set_hidden(&keys(&["a:loc"])).await.unwrap();
        assert_eq!(hidden.len(), 2);

        let hidden = visibility
            .set_visible(&keys(&["a:loc", "missing:loc"]))
            .await
            .unwrap();
        assert_eq!(hidden.into_iter().collect::<Vec<_>>(), keys(&["b:loc"]));
    }

    #[tokio::test]
    async fn test_visible_entities_filters_hidden() {
        let (_, visibility) = store();
        visibility.set_hidden(&keys(&["a:loc"])).await.unwrap();

        let all = vec![RepoOption::new("a", "loc"), RepoOption::new("b", "loc")];
        let visible = visibility.visible_entities(&all).await;
        assert_eq!(visible, vec![RepoOption::new("b", "loc")]);
    }

    #[tokio::test]
    async fn test_single_entity_is_always_visible() {
        let (_, visibility) = store();
        visibility.set_hidden(&keys(&["a:loc"])).await.unwrap();

        let all = vec![RepoOption::new("a", "loc")];
        assert_eq!(visibility.visible_entities(&all).await, all);
    }

    #[tokio::test]
    async fn test_non_array_value_reads_as_empty() {
        let (backing, visibility) = store();
        backing
            .set(
                VISIBILITY_NAMESPACE,
                "/dagit:hidden-repo-keys",
                br#"{"a:loc": true}"#.to_vec(),
                None,
            )
            .await
            .unwrap();

        assert!(visibility.hidden_keys().await.unwrap().is_empty());
        // And a write replaces it with a proper array
        visibility.set_hidden(&keys(&["a:loc"])).await.unwrap();
        let raw = backing
            .get(VISIBILITY_NAMESPACE, "/dagit:hidden-repo-keys")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw, br#"["a:loc"]"#.to_vec());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_do_not_lose_updates() {
        let (_, visibility) = store();
        let visibility = Arc::new(visibility);

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let visibility = Arc::clone(&visibility);
                tokio::spawn(async move {
                    visibility
                        .toggle_visible(&[format!("repo{}:loc", i)])
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(visibility.hidden_keys().await.unwrap().len(), 10);
    }

    #[test]
    fn test_filter_visible_ignores_stale_keys() {
        let hidden: BTreeSet<String> = ["gone:loc".to_string()].into_iter().collect();
        let all = vec![RepoAddress::new("a", "loc"), RepoAddress::new("b", "loc")];
        assert_eq!(filter_visible(&all, &hidden), all);
    }
}
