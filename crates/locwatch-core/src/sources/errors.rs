use std::path::PathBuf;

use crate::errors::LocwatchError;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Status source unreachable at '{path}': {message}")]
    Unreachable { path: PathBuf, message: String },

    #[error("Malformed status response: {message}")]
    Malformed { message: String },

    #[error("Status endpoint reported an error: {message}")]
    Server { message: String },
}

/// Per-location fetch failure. `Clone` so one failed load can be handed to
/// every caller coalesced onto it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Location '{name}' not found")]
    NotFound { name: String },

    #[error("Failed to fetch location '{name}': {message}")]
    Transport { name: String, message: String },

    #[error("Malformed detail for location '{name}': {message}")]
    Malformed { name: String, message: String },
}

impl FetchError {
    pub fn location(&self) -> &str {
        match self {
            FetchError::NotFound { name }
            | FetchError::Transport { name, .. }
            | FetchError::Malformed { name, .. } => name,
        }
    }
}

impl LocwatchError for PollError {
    fn error_code(&self) -> &'static str {
        match self {
            PollError::Unreachable { .. } => "POLL_UNREACHABLE",
            PollError::Malformed { .. } => "POLL_MALFORMED",
            PollError::Server { .. } => "POLL_SERVER_ERROR",
        }
    }
}

impl LocwatchError for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::NotFound { .. } => "LOCATION_NOT_FOUND",
            FetchError::Transport { .. } => "LOCATION_FETCH_FAILED",
            FetchError::Malformed { .. } => "LOCATION_MALFORMED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_location() {
        let error = FetchError::Transport {
            name: "etl".to_string(),
            message: "connection reset".to_string(),
        };
        assert_eq!(error.location(), "etl");
        assert_eq!(error.error_code(), "LOCATION_FETCH_FAILED");
        assert_eq!(
            error.to_string(),
            "Failed to fetch location 'etl': connection reset"
        );
    }

    #[test]
    fn test_poll_error_display() {
        let error = PollError::Server {
            message: "PythonError".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Status endpoint reported an error: PythonError"
        );
    }
}
