//! Error handling types for cellbridge.
//!
//! This module provides error types used throughout the synchronizer and
//! the completion dispatcher.

use thiserror::Error;

/// Comprehensive error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Backend session could not be started
    #[error("session initialization failed: {message}")]
    SessionInit { message: String },

    /// A request to the backend session failed
    #[error("backend request failed: {message}")]
    Backend { message: String },

    /// The request was cancelled before the backend replied
    #[error("request cancelled")]
    Cancelled,

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Helper functions for common error patterns
impl BridgeError {
    /// Create a session initialization error
    pub fn session_init(message: impl Into<String>) -> Self {
        BridgeError::SessionInit {
            message: message.into(),
        }
    }

    /// Create a backend request error
    pub fn backend(message: impl Into<String>) -> Self {
        BridgeError::Backend {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        BridgeError::Internal(message.into())
    }
}
