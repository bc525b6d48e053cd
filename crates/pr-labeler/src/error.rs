//! Error types for the labeler.

use thiserror::Error;

/// Errors raised while evaluating or applying the labeling policy.
#[derive(Debug, Error)]
pub enum LabelerError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-success status
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The requested resource (label, file, commit) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// GraphQL response carried errors or no data
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A glob pattern failed to compile
    #[error("Invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Invalid CLI, environment or policy file configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event payload did not match the expected shape
    #[error("Invalid {event} payload: {source}")]
    Event {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// File content could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelerError {
    /// Whether this error is the distinguished "not found" outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias used across the crate.
pub type Result<T, E = LabelerError> = std::result::Result<T, E>;
