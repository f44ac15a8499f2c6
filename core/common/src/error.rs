//! Common error types for cfgvault.

use thiserror::Error;

/// Top-level error type for configuration storage, encryption and migration.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input or document state does not allow the operation.
    ///
    /// Raised for a migration started from the wrong mode, a missing secret,
    /// an invalid document name or an attempt to delete the default document.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation collided with existing state.
    ///
    /// Raised when a document lock could not be acquired within its retry
    /// budget, or when `init` targets a name that already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// The remote object store rejected or could not serve a request.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Whether this error came from the remote side of a migration.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
