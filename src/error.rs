//! Error types for deaddrop

use thiserror::Error;

/// Result type alias for deaddrop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in deaddrop operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No unused identifier found after {0} attempts")]
    ExhaustedRetries(usize),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid store file: {0}")]
    InvalidFile(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Coarse failure classes, mapping each error onto a response category:
/// whether retrying could help, and whose fault the failure was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller input was missing or invalid; retrying unchanged won't help
    BadRequest,
    /// No record matches the lookup key (possibly already consumed)
    NotFound,
    /// Uniqueness violation on insert; retrying unchanged won't help
    Conflict,
    /// Backend trouble or exhausted identifier search; retry later
    Unavailable,
}

impl Error {
    /// The failure class this error belongs to
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::BadRequest(_) => ErrorClass::BadRequest,
            Error::NotFound(_) => ErrorClass::NotFound,
            Error::Conflict(_) => ErrorClass::Conflict,
            Error::Io(_)
            | Error::Serialization(_)
            | Error::ExhaustedRetries(_)
            | Error::Storage(_)
            | Error::Corruption(_)
            | Error::InvalidFile(_)
            | Error::VersionMismatch { .. } => ErrorClass::Unavailable,
        }
    }
}
