//! Error types for the synchronizer
//!
//! This module defines all error types used throughout the crate, plus the
//! coarse [`ErrorKind`] classification callers use to decide whether a
//! failure was caused by configuration, IP discovery or the DNS provider.

use thiserror::Error;

/// Result type alias for synchronizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the synchronizer
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (credentials, URLs, patterns)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Public IP discovery failed
    #[error("IP discovery error: {0}")]
    Discovery(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level failures talking to the provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// Credentials rejected by the provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Domain or record unknown to the provider
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// A reconciliation run exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials or settings are missing or malformed
    Configuration,
    /// The host IP could not be determined
    Discovery,
    /// Any failure reported by, or while talking to, the DNS provider
    Provider,
    /// Everything else (deadlines, bad caller input)
    Other,
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IP discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a deadline error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Discovery(_) => ErrorKind::Discovery,
            Self::Json(_)
            | Self::Http(_)
            | Self::Authentication(_)
            | Self::RateLimited(_)
            | Self::NotFound(_)
            | Self::Provider { .. } => ErrorKind::Provider,
            Self::InvalidInput(_) | Self::Timeout(_) | Self::Other(_) => ErrorKind::Other,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
