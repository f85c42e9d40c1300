//! # locwatch-cache
//!
//! Persistent key/value stores and [`VersionedCache`], a keyed, versioned query
//! cache that coalesces concurrent loads of the same key into one.

pub mod errors;
pub mod file;
pub mod memory;
pub mod store;
pub mod versioned;

pub use errors::{CacheError, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::KvStore;
pub use versioned::{CacheRecord, QUERY_CACHE_NAMESPACE, VersionedCache};
