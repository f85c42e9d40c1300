use std::error::Error;

/// Base trait for all application errors
pub trait LocwatchError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type LocwatchResult<T> = Result<T, Box<dyn LocwatchError>>;

impl LocwatchError for locwatch_paths::PathError {
    fn error_code(&self) -> &'static str {
        match self {
            locwatch_paths::PathError::HomeNotFound => "HOME_NOT_FOUND",
        }
    }

    fn is_user_error(&self) -> bool {
        true
    }
}

impl LocwatchError for locwatch_config::ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            locwatch_config::ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            locwatch_config::ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            locwatch_config::ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            locwatch_config::ConfigError::ConfigParseError { .. }
                | locwatch_config::ConfigError::InvalidConfiguration { .. }
        )
    }
}

impl LocwatchError for locwatch_cache::StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            locwatch_cache::StoreError::Io { .. } => "STORE_IO_ERROR",
            locwatch_cache::StoreError::Corrupt { .. } => "STORE_CORRUPT_RECORD",
            locwatch_cache::StoreError::Unavailable { .. } => "STORE_UNAVAILABLE",
        }
    }
}

impl LocwatchError for locwatch_cache::CacheError {
    fn error_code(&self) -> &'static str {
        match self {
            locwatch_cache::CacheError::Encode { .. } => "CACHE_ENCODE_FAILED",
            locwatch_cache::CacheError::Decode { .. } => "CACHE_DECODE_FAILED",
            locwatch_cache::CacheError::Store(inner) => inner.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_codes() {
        let error = locwatch_config::ConfigError::InvalidConfiguration {
            message: "bad interval".to_string(),
        };
        assert_eq!(error.error_code(), "INVALID_CONFIGURATION");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_store_error_is_system_error() {
        let error = locwatch_cache::StoreError::Unavailable {
            message: "disk gone".to_string(),
        };
        assert_eq!(error.error_code(), "STORE_UNAVAILABLE");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_cache_error_delegates_store_code() {
        let error = locwatch_cache::CacheError::Store(locwatch_cache::StoreError::Unavailable {
            message: "down".to_string(),
        });
        assert_eq!(error.error_code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_boxed_result_carries_code() {
        fn fails() -> LocwatchResult<()> {
            Err(Box::new(locwatch_paths::PathError::HomeNotFound))
        }
        let error = fails().unwrap_err();
        assert_eq!(error.error_code(), "HOME_NOT_FOUND");
    }
}
