//! Error types for the cleanup client

use thiserror::Error;

/// Main error type for the cleanup client
#[derive(Error, Debug)]
pub enum CleanerError {
    /// A local precondition failed before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with `ok: false`
    #[error("Backend error: {0}")]
    Backend(String),

    /// The operation was aborted locally
    #[error("Operation cancelled")]
    Cancelled,

    /// The push channel could not be opened or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Push event could not be turned into a typed event
    #[error("Event parse error ({event}): {message}")]
    EventParse {
        /// Event name as received
        event: String,
        /// Error message
        message: String,
    },

    /// Persisted store failure
    #[error("Store error: {0}")]
    Store(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, CleanerError>;

impl CleanerError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an event parse error
    pub fn event_parse(event: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::EventParse {
            event: event.into(),
            message: msg.into(),
        }
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error is a local abort rather than a failure
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for CleanerError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let url = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            return Self::Transport(format!("HTTP {} on {url}", status.as_u16()));
        }
        if err.is_decode() {
            return Self::Transport(format!("Malformed response body: {err}"));
        }
        Self::Transport(err.to_string())
    }
}
