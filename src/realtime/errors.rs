//! # Real-Time Errors
//!
//! Error types for the real-time module.

use thiserror::Error;

/// Result type for real-time operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Real-time errors
#[derive(Debug, Clone, Error)]
pub enum RealtimeError {
    // ==================
    // Request Errors
    // ==================
    /// Invalid message format
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    // ==================
    // Channel Errors
    // ==================
    /// Channel name rejected
    #[error("Invalid channel: {0:?}")]
    InvalidChannel(String),

    /// Sender name rejected
    #[error("Invalid sender: {0:?}")]
    InvalidSender(String),

    /// Session already left its channel
    #[error("Session has left channel {0}")]
    SessionClosed(String),

    // ==================
    // Internal Errors
    // ==================
    /// Internal error (broken invariant)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RealtimeError {
    /// Returns the close code for WebSocket
    pub fn close_code(&self) -> u16 {
        match self {
            RealtimeError::InvalidMessage(_) => 1003,
            RealtimeError::InvalidChannel(_) => 4000,
            RealtimeError::InvalidSender(_) => 4001,
            RealtimeError::SessionClosed(_) => 4002,
            RealtimeError::Internal(_) => 4500,
        }
    }

    /// Internal errors are broken invariants, not expected runtime conditions
    pub fn is_fatal(&self) -> bool {
        matches!(self, RealtimeError::Internal(_))
    }
}
