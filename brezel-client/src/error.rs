//! Client error types.

use brezel_model::ModelError;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures raised by a [`Transport`](crate::Transport) before a response exists.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

/// Errors that can occur while talking to a Brezel system.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API request failed: invalid JSON in {status} response: {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("entity materialization failed: {0}")]
    Model(#[from] ModelError),

    #[error("entity from module `{module}` is not a `{expected}`")]
    UnexpectedEntityType {
        module: String,
        expected: &'static str,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::Decode { status, .. } => Some(*status),
            ApiError::Transport(TransportError::Http(e)) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this error represents a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
