//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.locwatch/config.toml` (global user preferences)
//! 3. **Project config** - `./.locwatch/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags, applied by the binary (highest priority)

use std::fs;
use std::path::Path;

use locwatch_paths::LocwatchPaths;
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::{
    CacheConfig, LocwatchConfig, NotifyConfig, PollConfig, SourceConfig, VisibilityConfig,
};
use crate::validation::validate_config;

/// Load configuration from the user and project config files.
///
/// # Errors
///
/// Returns an error if a present file fails to parse or the merged result
/// fails validation. Missing config files are not errors.
pub fn load_hierarchy() -> Result<LocwatchConfig, ConfigError> {
    let user_config = match LocwatchPaths::resolve() {
        Ok(paths) => Some(paths.user_config()),
        Err(e) => {
            debug!(event = "config.user_config.skipped", reason = %e);
            None
        }
    };
    let project_root = std::env::current_dir()?;
    load_hierarchy_from(user_config.as_deref(), &project_root)
}

/// Load the hierarchy from explicit locations.
pub fn load_hierarchy_from(
    user_config: Option<&Path>,
    project_root: &Path,
) -> Result<LocwatchConfig, ConfigError> {
    let mut config = LocwatchConfig::default();

    if let Some(path) = user_config
        && let Some(user) = load_optional(path)?
    {
        config = merge_configs(config, user);
    }

    let project_path = LocwatchPaths::project_config(project_root);
    if let Some(project) = load_optional(&project_path)? {
        config = merge_configs(config, project);
    }

    validate_config(&config)?;

    Ok(config)
}

/// File not found is expected; anything else fails the load.
fn load_optional(path: &Path) -> Result<Option<LocwatchConfig>, ConfigError> {
    match load_config_file(path) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::IoError { source }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!(event = "config.file.not_found", path = %path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<LocwatchConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| std::io::Error::new(e.kind(), format!("'{}': {}", path.display(), e)))?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        message: format!("'{}': {}", path.display(), e),
    })
}

/// Merge two configurations, with `override_config` taking precedence.
///
/// Optional fields take the override only when present. Booleans are OR'd.
pub fn merge_configs(base: LocwatchConfig, override_config: LocwatchConfig) -> LocwatchConfig {
    LocwatchConfig {
        poll: PollConfig {
            interval_ms: override_config.poll.interval_ms.or(base.poll.interval_ms),
        },
        source: SourceConfig {
            dir: override_config.source.dir.or(base.source.dir),
        },
        cache: CacheConfig {
            dir: override_config.cache.dir.or(base.cache.dir),
        },
        visibility: VisibilityConfig {
            base_path: override_config
                .visibility
                .base_path
                .or(base.visibility.base_path),
        },
        notify: NotifyConfig {
            desktop: override_config.notify.desktop || base.notify.desktop,
        },
    }
}
