//! Keyed, versioned query cache with single-flight loading.
//!
//! A record is `{data, version}` serialized as JSON into a [`KvStore`]
//! namespace. Reads only hit when the stored version equals the requested one.
//! Concurrent misses for the same `(key, version)` share one loader call through
//! an in-flight table owned by the cache instance.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::CacheError;
use crate::store::KvStore;

/// Store namespace used for location detail queries.
pub const QUERY_CACHE_NAMESPACE: &str = "query-cache";

/// Persisted form of one cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<T> {
    pub data: T,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    CacheFirst,
    Bypass,
}

type InFlightLoad<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type InFlightTable<T, E> = Arc<Mutex<HashMap<(String, i64), InFlightLoad<T, E>>>>;

pub struct VersionedCache<T, E> {
    store: Arc<dyn KvStore>,
    namespace: String,
    in_flight: InFlightTable<T, E>,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Clone for VersionedCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace.clone(),
            in_flight: Arc::clone(&self.in_flight),
            _marker: PhantomData,
        }
    }
}

impl<T, E> VersionedCache<T, E>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    E: Clone + std::fmt::Display + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            _marker: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of loads currently registered as in flight.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Cached value for `key` if its stored version equals `version`.
    ///
    /// Store and decode failures are logged and treated as a miss.
    pub async fn get(&self, key: &str, version: i64) -> Option<T> {
        match read_record::<T>(self.store.as_ref(), &self.namespace, key).await {
            Ok(Some(record)) if record.version == version => Some(record.data),
            Ok(Some(record)) => {
                debug!(
                    event = "cache.get.version_mismatch",
                    key = key,
                    stored = record.version,
                    requested = version,
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    event = "cache.get.read_failed",
                    namespace = %self.namespace,
                    key = key,
                    error = %e,
                );
                None
            }
        }
    }

    /// Persist `value` under `key` with no expiry.
    pub async fn set(&self, key: &str, value: &T, version: i64) -> Result<(), CacheError> {
        write_record(self.store.as_ref(), &self.namespace, key, value, version).await
    }

    /// Return the cached value or run `loader`, coalescing concurrent misses.
    ///
    /// Every caller attached to the same load receives a clone of the same
    /// result. A failed load is not written and its registration is released,
    /// so the next call retries.
    pub async fn fetch_or_load<F, Fut>(&self, key: &str, version: i64, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.load(key, version, loader, Lookup::CacheFirst).await
    }

    /// Run `loader` without consulting the stored record, then write the result.
    ///
    /// Joins a load already in flight for the same `(key, version)`, since that
    /// one reads from the source too.
    pub async fn reload<F, Fut>(&self, key: &str, version: i64, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.load(key, version, loader, Lookup::Bypass).await
    }

    async fn load<F, Fut>(
        &self,
        key: &str,
        version: i64,
        loader: F,
        lookup: Lookup,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if lookup == Lookup::CacheFirst
            && let Some(hit) = self.get(key, version).await
        {
            debug!(event = "cache.fetch.hit", key = key, version = version);
            return Ok(hit);
        }

        let load = {
            let mut table = self.in_flight.lock().await;
            let id = (key.to_string(), version);
            if let Some(existing) = table.get(&id) {
                debug!(event = "cache.fetch.joined", key = key, version = version);
                existing.clone()
            } else {
                // A load may have written and released between the first read
                // and taking the lock. Loads release under this lock after
                // writing, so a read here sees their record.
                if lookup == Lookup::CacheFirst
                    && let Some(hit) = self.get(key, version).await
                {
                    debug!(event = "cache.fetch.hit", key = key, version = version);
                    return Ok(hit);
                }
                let load = self.start_load(key.to_string(), version, loader);
                table.insert(id, load.clone());
                load
            }
        };

        load.await
    }

    fn start_load<F, Fut>(&self, key: String, version: i64, loader: F) -> InFlightLoad<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let namespace = self.namespace.clone();
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            info!(
                event = "cache.fetch.load_started",
                key = %key,
                version = version,
            );
            let result = loader().await;

            match &result {
                Ok(value) => {
                    if let Err(e) =
                        write_record(store.as_ref(), &namespace, &key, value, version).await
                    {
                        warn!(
                            event = "cache.fetch.store_failed",
                            key = %key,
                            error = %e,
                        );
                    }
                    info!(
                        event = "cache.fetch.load_completed",
                        key = %key,
                        version = version,
                    );
                }
                Err(e) => {
                    warn!(
                        event = "cache.fetch.load_failed",
                        key = %key,
                        version = version,
                        error = %e,
                    );
                }
            }

            // Release after the write so late callers see the stored record.
            in_flight.lock().await.remove(&(key, version));

            result
        }
        .boxed()
        .shared()
    }
}

async fn read_record<T: DeserializeOwned>(
    store: &dyn KvStore,
    namespace: &str,
    key: &str,
) -> Result<Option<CacheRecord<T>>, CacheError> {
    let Some(bytes) = store.get(namespace, key).await? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| CacheError::Decode {
            key: key.to_string(),
            source,
        })
}

async fn write_record<T: Serialize>(
    store: &dyn KvStore,
    namespace: &str,
    key: &str,
    value: &T,
    version: i64,
) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(&CacheRecord {
        data: value,
        version,
    })
    .map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(namespace, key, bytes, None).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn cache() -> VersionedCache<String, String> {
        VersionedCache::new(Arc::new(MemoryStore::new()), QUERY_CACHE_NAMESPACE)
    }

    struct BrokenStore;

    #[async_trait]
    impl KvStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _: &str, _: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Unavailable {
                message: "down".to_string(),
            })
        }

        async fn set(
            &self,
            _: &str,
            _: &str,
            _: Vec<u8>,
            _: Option<Duration>,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                message: "down".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_get_hits_on_matching_version() {
        let cache = cache();
        cache.set("k", &"v1".to_string(), 1).await.unwrap();
        assert_eq!(cache.get("k", 1).await, Some("v1".to_string()));
    }

    #[tokio::test]
    async fn test_get_misses_on_version_mismatch() {
        let cache = cache();
        cache.set("k", &"v1".to_string(), 1).await.unwrap();
        assert_eq!(cache.get("k", 2).await, None);
    }

    #[tokio::test]
    async fn test_record_wire_format() {
        let store = Arc::new(MemoryStore::new());
        let cache: VersionedCache<String, String> =
            VersionedCache::new(store.clone(), QUERY_CACHE_NAMESPACE);
        cache.set("k", &"payload".to_string(), 7).await.unwrap();

        let bytes = store.get(QUERY_CACHE_NAMESPACE, "k").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["data"], "payload");
        assert_eq!(json["version"], 7);
    }

    #[tokio::test]
    async fn test_undecodable_record_is_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(QUERY_CACHE_NAMESPACE, "k", b"garbage".to_vec(), None)
            .await
            .unwrap();
        let cache: VersionedCache<String, String> =
            VersionedCache::new(store, QUERY_CACHE_NAMESPACE);
        assert_eq!(cache.get("k", 1).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_invoke_loader_once() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let requests = (0..8).map(|_| {
            let calls = Arc::clone(&calls);
            cache.fetch_or_load("k", 3, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, String>("loaded".to_string())
            })
        });
        let results = futures::future::join_all(requests).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r.as_deref() == Ok("loaded")));
        assert_eq!(cache.in_flight().await, 0);
        assert_eq!(cache.get("k", 3).await, Some("loaded".to_string()));
    }

    #[tokio::test]
    async fn test_hit_skips_loader() {
        let cache = cache();
        cache.set("k", &"cached".to_string(), 1).await.unwrap();

        let result = cache
            .fetch_or_load("k", 1, || async { Err::<String, _>("should not run".to_string()) })
            .await;
        assert_eq!(result, Ok("cached".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_propagates_to_all_waiters_and_releases() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let requests = (0..3).map(|_| {
            let calls = Arc::clone(&calls);
            cache.fetch_or_load("k", 1, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<String, _>("boom".to_string())
            })
        });
        let results = futures::future::join_all(requests).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r == &Err("boom".to_string())));
        assert_eq!(cache.in_flight().await, 0);
        // Nothing cached on failure
        assert_eq!(cache.get("k", 1).await, None);

        // Registration released, so the next call loads again
        let retry = cache
            .fetch_or_load("k", 1, || async { Ok::<_, String>("ok".to_string()) })
            .await;
        assert_eq!(retry, Ok("ok".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_versions_do_not_coalesce() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let load = |version: i64| {
            let calls = Arc::clone(&calls);
            cache.fetch_or_load("k", version, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, String>(format!("v{}", version))
            })
        };
        let (a, b) = futures::join!(load(1), load(2));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(a, Ok("v1".to_string()));
        assert_eq!(b, Ok("v2".to_string()));
    }

    /// Reads observe the store immediately but return only after a delay.
    struct LaggingStore {
        inner: MemoryStore,
        lag: Duration,
    }

    #[async_trait]
    impl KvStore for LaggingStore {
        fn name(&self) -> &'static str {
            "lagging"
        }

        async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            let value = self.inner.get(namespace, key).await;
            tokio::time::sleep(self.lag).await;
            value
        }

        async fn set(
            &self,
            namespace: &str,
            key: &str,
            value: Vec<u8>,
            ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            self.inner.set(namespace, key, value, ttl).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_racing_a_finished_load_does_not_load_again() {
        let cache: VersionedCache<String, String> = VersionedCache::new(
            Arc::new(LaggingStore {
                inner: MemoryStore::new(),
                lag: Duration::from_millis(20),
            }),
            QUERY_CACHE_NAMESPACE,
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let load = || {
            let calls = Arc::clone(&calls);
            cache.fetch_or_load("k", 1, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, String>("loaded".to_string())
            })
        };

        // The first load writes and releases at ~50ms. The second caller's
        // first read starts at 45ms, before the write, and returns after it.
        let (first, second) = futures::join!(load(), async {
            tokio::time::sleep(Duration::from_millis(45)).await;
            load().await
        });

        assert_eq!(first, Ok("loaded".to_string()));
        assert_eq!(second, Ok("loaded".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reload_ignores_matching_record_and_overwrites_it() {
        let cache = cache();
        cache.set("k", &"stale".to_string(), 3).await.unwrap();

        let result = cache
            .reload("k", 3, || async { Ok::<_, String>("fresh".to_string()) })
            .await;

        assert_eq!(result, Ok("fresh".to_string()));
        assert_eq!(cache.get("k", 3).await, Some("fresh".to_string()));
        assert_eq!(cache.in_flight().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_joins_load_in_flight() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = || {
            let calls = Arc::clone(&calls);
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, String>("loaded".to_string())
            }
        };

        let (a, b) = futures::join!(
            cache.fetch_or_load("k", 1, loader()),
            cache.reload("k", 1, loader())
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_store_failure_falls_through_to_loader() {
        let cache: VersionedCache<String, String> =
            VersionedCache::new(Arc::new(BrokenStore), QUERY_CACHE_NAMESPACE);

        let result = cache
            .fetch_or_load("k", 1, || async { Ok::<_, String>("fresh".to_string()) })
            .await;
        assert_eq!(result, Ok("fresh".to_string()));
        assert_eq!(cache.in_flight().await, 0);
    }
}
