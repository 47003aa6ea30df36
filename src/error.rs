//! Error types for Folio.

use thiserror::Error;

/// Common error type for Folio.
#[derive(Error, Debug)]
pub enum FolioError {
    /// A requested path resolved outside its designated root.
    ///
    /// Operations that hit this refuse outright and perform no filesystem
    /// mutation. The raw requested name is logged, never echoed back.
    #[error("path escapes the allowed root")]
    SecurityViolation,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Name collision on create/rename/mkdir.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Submitted content exceeds the configured size limit.
    #[error("payload too large (max {0} bytes)")]
    PayloadTooLarge(u64),

    /// Write could not be completed by any strategy.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Upload refused (unsupported type, bad transfer).
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    /// Missing or malformed request parameter.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache payload (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for Folio operations.
pub type Result<T> = std::result::Result<T, FolioError>;
