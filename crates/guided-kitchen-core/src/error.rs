//! Error taxonomy for the kitchen engine.
//!
//! Every variant is recoverable by the caller. Only
//! [`KitchenError::StorageNotDirectory`] is treated as fatal, and only at
//! startup by the application crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KitchenError {
    /// The requested recipe name has no entry in the index.
    #[error("recipe not found: {0}")]
    NotFound(String),

    /// A single recipe file failed to parse. Recorded at load time and skipped.
    #[error("malformed recipe source {}: {reason}", path.display())]
    MalformedSource { path: PathBuf, reason: String },

    #[error("no active cooking session; start cooking a recipe first")]
    NoActiveSession,

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("recipe storage path is not a directory: {}", .0.display())]
    StorageNotDirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, KitchenError>;

impl KitchenError {
    /// Machine-readable code used by transports (`not_found`, `no_active_session`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            KitchenError::NotFound(_) => "not_found",
            KitchenError::MalformedSource { .. } => "malformed_source",
            KitchenError::NoActiveSession => "no_active_session",
            KitchenError::EmptyQuestion => "empty_question",
            KitchenError::UnknownSession(_) => "unknown_session",
            KitchenError::StorageNotDirectory(_) => "storage_not_directory",
        }
    }
}
