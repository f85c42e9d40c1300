//! # locwatch-config
//!
//! TOML configuration types, loading, and validation for locwatch.
//!
//! Depends only on `locwatch-paths`.

mod loading;
mod validation;

pub mod errors;
pub mod types;

pub use errors::ConfigError;
pub use loading::{load_config_file, load_hierarchy, load_hierarchy_from, merge_configs};
pub use types::{
    CacheConfig, DEFAULT_POLL_INTERVAL_MS, LocwatchConfig, NotifyConfig, PollConfig,
    SourceConfig, VisibilityConfig,
};
pub use validation::{MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS, validate_config};

impl LocwatchConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
