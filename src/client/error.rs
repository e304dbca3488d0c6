//! Error types for workspace clients.

use thiserror::Error;

use super::Subsystem;

/// Errors a workspace client call can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Reading or writing the backing store failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The subsystem did not answer.
    #[error("{0} unavailable")]
    Unavailable(Subsystem),

    /// No resource with this id.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource is in a state that does not allow the action.
    #[error("Cannot {action} {id} while it is {state}")]
    InvalidState {
        id: String,
        state: String,
        action: &'static str,
    },

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}
