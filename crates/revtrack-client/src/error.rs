//! Error types for the revtrack client

use thiserror::Error;

/// Errors that can occur when talking to the resolution endpoint
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid header name or value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Server returned an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body was missing
    #[error("Empty response body")]
    EmptyBody,

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Whether the body arrived but could not be interpreted
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::EmptyBody | Self::InvalidResponse(_))
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
