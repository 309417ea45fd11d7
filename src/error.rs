//! Error types for the MyReads client

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Rejected by the server: {0}")]
    Rejected(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text shown to the user, without the variant prefix
    pub fn details(&self) -> String {
        match self {
            AppError::Rejected(msg) | AppError::Search(msg) | AppError::Internal(msg) => msg.clone(),
            AppError::UnexpectedStatus { status, message } => {
                format!("HTTP {}: {}", status, message)
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
