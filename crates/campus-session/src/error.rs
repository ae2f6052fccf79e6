//! Session error types

use thiserror::Error;

use crate::state::AuthState;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: AuthState, to: AuthState },

    #[error("{0}")]
    Login(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("API error: {0}")]
    Api(#[from] campus_http::ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] campus_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
