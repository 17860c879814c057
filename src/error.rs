//! Error types for sqldeck.
//!
//! Defines the main error enum used throughout the engine.

use thiserror::Error;

/// Main error type for sqldeck operations.
#[derive(Error, Debug)]
pub enum SqldeckError {
    /// Network/transport failures (connection refused, timeout, etc.)
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    /// Backend rejected a request (non-2xx status, API-level error body).
    #[error("Backend error: {0}")]
    Backend(String),

    /// Response body could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration errors (invalid config file, bad base URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal engine errors (unknown ids, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SqldeckError {
    /// Creates a network error with the given message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            timed_out: false,
        }
    }

    /// Creates a network error classified as a timeout.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            timed_out: true,
        }
    }

    /// Creates a backend rejection error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true for transport failures classified as timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { timed_out: true, .. })
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network { .. } => "Network Error",
            Self::Backend(_) => "Backend Error",
            Self::Decode(_) => "Decode Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using SqldeckError.
pub type Result<T> = std::result::Result<T, SqldeckError>;
