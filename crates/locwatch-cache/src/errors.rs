use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store IO error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt store record '{namespace}/{key}': {message}")]
    Corrupt {
        namespace: String,
        key: String,
        message: String,
    },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to encode cache record for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode cache record for '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
