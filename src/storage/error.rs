use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`NoteStore`](super::NoteStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A note already exists at the target path; notes are never overwritten.
    #[error("note already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The note's metadata header could not be parsed.
    #[error("unreadable metadata in {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    /// A vault-relative path tried to escape the vault.
    #[error("invalid note path: {path}")]
    InvalidPath { path: String },
}

impl StorageError {
    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
