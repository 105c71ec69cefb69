//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Almanac
///
/// Callers branch on the variant; the message carries the detail for logs.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AlmanacError {
    /// Local store failure (connection, query, constraint).
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient provider or network failure.
    #[error("Remote calendar unavailable: {0}")]
    RemoteUnavailable(String),

    /// No credential stored for the user; they have never authorized.
    #[error("Authorization required: {0}")]
    AuthRequired(String),

    /// The stored credential can no longer be refreshed (revoked or invalid).
    #[error("Authorization expired: {0}")]
    AuthExpired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AlmanacError {
    /// True for failures the user resolves by (re-)authorizing.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired(_) | Self::AuthExpired(_))
    }

    /// True for failures worth retrying on a later tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::Database(_))
    }
}

/// Result type alias for Almanac operations
pub type Result<T> = std::result::Result<T, AlmanacError>;
