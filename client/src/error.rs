//! Error types for the admin HTTP client

use order_lifecycle::BackendError;
use thiserror::Error;

/// Errors that can occur when talking to the marketplace REST backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing `MARKETPLACE_API_TOKEN` environment variable
    #[error("Missing MARKETPLACE_API_TOKEN environment variable")]
    MissingToken,

    /// A configuration value could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Credential missing, expired or not an admin
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The addressed resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}

impl From<ClientError> for BackendError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::RequestFailed(message) => Self::Transport(message),
            ClientError::ResponseParseFailed(message) => Self::InvalidResponse(message),
            ClientError::Unauthorized(message) => Self::Unauthorized(message),
            ClientError::NotFound(message) => Self::NotFound(message),
            ClientError::ApiError { status, message } => Self::Rejected { status, message },
            other @ (ClientError::MissingToken | ClientError::InvalidConfig(_)) => {
                Self::Transport(other.to_string())
            },
        }
    }
}
