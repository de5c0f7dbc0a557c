//! Error types for paperless-intake.

use reqwest::StatusCode;

/// Top-level error type for the intake binary.
///
/// Per-attachment failures never show up here; `process_email` recovers
/// them and records the outcome in its report instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Document service error: {0}")]
    Service(#[from] ServiceError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors reading or parsing the inbound message.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to read message: {0}")]
    Io(#[from] std::io::Error),

    #[error("Message could not be parsed as RFC 5322")]
    Unparseable,

    #[error("No recipient address given and none found in the To header")]
    MissingRecipient,
}

/// Document service (HTTP API) errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid value for header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fallback forwarding (SMTP) errors.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("SMTP relay error: {0}")]
    Relay(String),

    #[error("SMTP send failed: {0}")]
    SendFailed(String),
}

/// Result type alias for paperless-intake.
pub type Result<T> = std::result::Result<T, Error>;
