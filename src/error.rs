//! Provider errors
//!
//! Every lifecycle callback returns [`Result`]; the host reports the error to
//! the user and aborts the current operation. Nothing here is retried.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection refused, DNS failure, timeout, body read failure.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("GreenOps API request failed: {status} - {body}")]
    Api { status: StatusCode, body: String },

    /// Delete answered with something other than 200. Displays the raw body.
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response did not contain an apiKey")]
    MissingApiKey,

    /// Empty, `.` or `..`: these cannot stand as a single URL path segment
    #[error("Invalid cluster name {0:?}")]
    InvalidName(String),

    #[error("Invalid provider configuration: {0}")]
    Config(String),

    #[error("State error: {0}")]
    State(String),
}

impl ProviderError {
    /// True for errors raised before any request reached the wire or while it
    /// was in flight.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Transport(e) if e.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
