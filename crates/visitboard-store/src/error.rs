//! Store-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid document for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode document for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("All retry attempts exhausted")]
    RetriesExhausted,
}

impl StoreError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::RetriesExhausted => {
                "Unable to reach the board. Check your internet connection."
            }
            Self::Status { status, .. } if *status >= 500 => {
                "The board server is having trouble. Please try again later."
            }
            Self::Status { .. } => "The board server rejected the request.",
            Self::Decode { .. } => "Board data could not be read.",
            Self::Encode { .. } => "Board data could not be saved.",
            Self::Cache(_) => "Local copy of the board is unavailable.",
            Self::InvalidUrl(_) => "The board address is invalid. Check your settings.",
            Self::Task(_) => "Something went wrong. Please try again.",
        }
    }
}
