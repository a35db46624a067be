//! Error types for WeRead Pacer
//!
//! Errors are split by how the run reacts to them: transport errors are retried
//! locally, an expired session is renewed, a failed renewal aborts the run, and
//! configuration errors stop the process before any request is made.

use std::path::PathBuf;
use thiserror::Error;

/// Network-level failures against the reading platform
#[derive(Error, Debug)]
pub enum TransportError {
    /// Underlying HTTP client failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request exceeded its timeout
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Connection could not be established
    #[error("Connection failed: {reason}")]
    Connection { reason: String },

    /// Response body was not the expected JSON document
    #[error("Invalid response body: {reason}")]
    InvalidBody { reason: String },
}

/// Session renewal errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Renewal response carried no session cookie; the run cannot continue
    #[error("Could not obtain a new session key; check the captured cURL command")]
    RenewalFailed,

    /// Renewal request failed in transit
    #[error("Renewal request failed: {0}")]
    Transport(#[from] TransportError),

    /// A read was attempted before any session key was established
    #[error("Session cookie '{cookie}' is missing or empty")]
    MissingSessionToken { cookie: String },
}

/// Per-attempt notification failures; never escape the dispatcher
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Underlying HTTP client failure
    #[error("Notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel endpoint returned an error status
    #[error("Notification endpoint returned HTTP {status}")]
    Status { status: u16 },

    /// Required channel credential is not configured
    #[error("{channel} is missing required setting '{field}'")]
    MissingCredential {
        channel: &'static str,
        field: &'static str,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Unknown notification channel
    #[error(
        "Invalid notification channel '{value}'. Choose 'pushplus', 'telegram', 'wxpusher' or 'webhook'"
    )]
    InvalidChannel { value: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Captured cURL command could not be parsed
    #[error("Invalid cURL command: {reason}")]
    InvalidCurl { reason: String },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Session renewal error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Notification error
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_) | AppError::Auth(AuthError::Transport(_)) | AppError::Notify(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Transport(_) => "transport",
            AppError::Notify(_) => "notification",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Transport result type alias
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Notification result type alias
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renewal_failure_is_fatal() {
        let error = AppError::Auth(AuthError::RenewalFailed);
        assert!(!error.is_recoverable());
        assert_eq!(error.category(), "authentication");
    }

    #[test]
    fn test_renewal_transport_failure_is_recoverable() {
        let error = AppError::Auth(AuthError::Transport(TransportError::Timeout { seconds: 10 }));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_invalid_channel_message() {
        let error = AppError::from(ConfigError::InvalidChannel {
            value: "carrier-pigeon".to_string(),
        });
        assert!(!error.is_recoverable());
        assert_eq!(error.category(), "config");
        assert!(error.to_string().contains("carrier-pigeon"));
    }
}
