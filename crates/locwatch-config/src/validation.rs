//! Configuration validation logic.

use crate::errors::ConfigError;
use crate::types::LocwatchConfig;

pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const MAX_POLL_INTERVAL_MS: u64 = 3_600_000;

/// Validate a LocwatchConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - `poll.interval_ms`, if set, must lie in `100..=3_600_000`
/// - `source.dir` and `cache.dir`, if set, must not be empty
pub fn validate_config(config: &LocwatchConfig) -> Result<(), ConfigError> {
    if let Some(interval) = config.poll.interval_ms
        && !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&interval)
    {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "poll.interval_ms must be between {} and {}, got {}",
                MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, interval
            ),
        });
    }

    if let Some(ref dir) = config.source.dir
        && dir.as_os_str().is_empty()
    {
        return Err(ConfigError::InvalidConfiguration {
            message: "source.dir cannot be empty".to_string(),
        });
    }

    if let Some(ref dir) = config.cache.dir
        && dir.as_os_str().is_empty()
    {
        return Err(ConfigError::InvalidConfiguration {
            message: "cache.dir cannot be empty".to_string(),
        });
    }

    Ok(())
}
