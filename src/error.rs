//! Errors surfaced by the tracker core.
//!
//! - [`Validation`] is raised when input can't become a transaction. Nothing
//!   is stored and the caller is expected to correct the input.
//! - [`StorageUnavailable`] is raised when the record store can't persist or
//!   read. The engine keeps serving its last good snapshot.
//!
//! Deleting an unknown id is not an error.
//!
//! [`Validation`]: TrackerError::Validation
//! [`StorageUnavailable`]: TrackerError::StorageUnavailable
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Invalid transaction: {0}")]
    Validation(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl TrackerError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<csv::Error> for TrackerError {
    fn from(err: csv::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::StorageUnavailable(err.to_string())
        } else {
            Self::Validation(format!("malformed record file: {err}"))
        }
    }
}
