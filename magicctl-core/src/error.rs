/// Structured error types for magicctl-core.
///
/// Uses `thiserror` so gateway implementations and the list components share
/// one small taxonomy. The `magicctl` binary wraps these in `anyhow` at the edge.
use thiserror::Error;

/// Error surfaced by a Remote Gateway or by local input validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Transport or backend failure, with the HTTP status when one was received
    #[error("Network error{}: {message}", status_suffix(.status))]
    Network { status: Option<u16>, message: String },

    /// Local input rejected before any request was made
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

/// Result type alias for magicctl-core operations
pub type Result<T> = std::result::Result<T, ListError>;

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl ListError {
    /// Create a network error carrying an HTTP status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a network error for a failure that never produced a response
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status of a network error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            Self::Validation { .. } => None,
        }
    }
}
