//! HTTP client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized { message: Option<String> },

    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// The `message` field the server put in an error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message } | ApiError::Status { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message() {
        let err = ApiError::Status {
            status: 422,
            message: Some("The email field is required.".to_string()),
        };
        assert_eq!(err.server_message(), Some("The email field is required."));
        assert_eq!(err.status(), Some(422));
        assert_eq!(
            err.to_string(),
            "Request failed with status 422: The email field is required."
        );

        assert_eq!(ApiError::Timeout.server_message(), None);
        let unauthorized = ApiError::Unauthorized {
            message: Some("Unauthenticated.".to_string()),
        };
        assert_eq!(unauthorized.status(), Some(401));
        assert_eq!(unauthorized.server_message(), Some("Unauthenticated."));
    }
}
