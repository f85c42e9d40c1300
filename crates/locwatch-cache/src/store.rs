use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Persistent key/value store shared by the query cache and visibility prefs.
///
/// Keys are scoped by `namespace`. A `ttl` of `None` means the record never expires.
/// An expired record reads back as missing.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;
}
