//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] campus_storage::StorageError),

    #[error("API error: {0}")]
    Api(#[from] campus_http::ApiError),

    #[error("Session error: {0}")]
    Session(#[from] campus_session::SessionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The server answered with `success: false`
    #[error("{0}")]
    Dashboard(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<url::ParseError> for CoreError {
    fn from(e: url::ParseError) -> Self {
        CoreError::Config(format!("invalid API URL: {}", e))
    }
}
