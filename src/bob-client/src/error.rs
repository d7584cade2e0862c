//! Error types for the conversation client.
//!
//! Every remote call is classified into one of three failure kinds so the
//! caller can decide whether to degrade to a default value or surface the
//! failure: the server could not be reached, the server answered but not with
//! what was asked for, or the payload did not have the expected shape.

use thiserror::Error;

/// Errors that can occur during conversation operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server could not be reached (connection refused, timeout, DNS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status or without an expected field.
    #[error("Remote error: {0}")]
    Remote(String),

    /// The payload did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A reply is already pending for this conversation.
    #[error("A message is already pending for conversation {0}")]
    SendInFlight(String),

    /// The prompt was empty after trimming.
    #[error("Cannot send an empty message")]
    EmptyPrompt,

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the failure happened before the server could answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Whether the failure was rejected locally without any request being issued.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(self, ClientError::SendInFlight(_) | ClientError::EmptyPrompt)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ClientError::Transport(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Remote(format!("Server returned {}", status))
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("Invalid base URL: {}", err))
    }
}

/// Result type for conversation operations.
pub type Result<T> = std::result::Result<T, ClientError>;
