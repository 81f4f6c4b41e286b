//! Centralized error types for the visit board.
//!
//! Each crate has its own error enum; `AppError` wraps them so the CLI can
//! show a friendly message while logs keep the full chain.

use thiserror::Error;
use visitboard_chat::ChatError;
use visitboard_schedule::{AnalysisError, ScheduleError};
use visitboard_store::StoreError;

/// Top-level application error type.
///
/// Use `user_message()` for text shown to people using the board.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Store(e) => e.user_message().to_string(),
            AppError::Schedule(e) => e.user_message(),
            AppError::Chat(e) => e.user_message().to_string(),
            AppError::Analysis(e) => e.user_message().to_string(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let err: AppError = ChatError::InvalidCredentials.into();
        assert!(matches!(err, AppError::Chat(_)));
        assert_eq!(err.user_message(), "שם משתמש או סיסמה שגויים.");

        let err: AppError = ScheduleError::Unauthorized.into();
        assert_eq!(err.to_string(), "Schedule error: Wrong admin password");
    }

    #[test]
    fn test_store_errors_keep_their_message() {
        let err: AppError = StoreError::RetriesExhausted.into();
        assert!(err.user_message().contains("Unable to reach"));
    }

    #[test]
    fn test_config_error_message() {
        let err: AppError = ConfigError::Invalid("store.bucket is empty".into()).into();
        assert!(err.to_string().contains("store.bucket"));
        assert!(!err.user_message().is_empty());
    }
}
