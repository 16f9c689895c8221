//! Error types shared by the remote clients and playback coordination.

use thiserror::Error;

/// Failure talking to a Google REST endpoint.
///
/// Every variant means the remote side was unavailable for this call; the
/// store and clients never retry and never downgrade these to empty results.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("{operation} failed with HTTP {status}")]
    Status {
        operation: &'static str,
        status: u16,
        body: Option<String>,
    },
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("{operation} request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    /// The request could not be built from the given arguments.
    #[error("{operation} has invalid arguments: {message}")]
    InvalidRequest {
        operation: &'static str,
        message: String,
    },
    /// The response arrived but its body could not be read or decoded.
    #[error("{operation} returned an unreadable response: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },
}

impl RemoteError {
    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Name of the remote operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            RemoteError::Status { operation, .. }
            | RemoteError::Transport { operation, .. }
            | RemoteError::InvalidRequest { operation, .. }
            | RemoteError::InvalidResponse { operation, .. } => operation,
        }
    }
}

/// Failure reported by a playback backend.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The player has been torn down or has not finished loading.
    #[error("player is not ready")]
    NotReady,
    /// Backend-specific failure.
    #[error("{0}")]
    Backend(String),
}
