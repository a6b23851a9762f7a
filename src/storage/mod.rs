//! Note storage.
//!
//! The sync engine only needs four primitives from the document store:
//! create a folder, create a note (never overwriting), list notes under a
//! folder, and read one field from a note's metadata header. [`NoteStore`]
//! captures them; [`FsNoteStore`] implements them over a vault directory.

mod error;
pub mod frontmatter;
mod fs;

use async_trait::async_trait;

pub use error::StorageError;
pub use fs::FsNoteStore;

/// File extension of notes.
pub const NOTE_EXTENSION: &str = "md";

/// A note found by [`NoteStore::list_notes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRef {
    /// Vault-relative path with `/` separators.
    pub path: String,
    /// File name including extension.
    pub name: String,
}

/// Storage primitives used by the sync engine.
///
/// This trait uses `async_trait` so the engine can hold a `dyn NoteStore`.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Creates `folder` (and parents) if absent.
    async fn ensure_folder(&self, folder: &str) -> Result<(), StorageError>;

    /// Creates a note at `path`; fails with
    /// [`StorageError::AlreadyExists`] if one is already there.
    async fn create_note(&self, path: &str, contents: &str) -> Result<(), StorageError>;

    /// Lists every note under `folder`, recursively, sorted by path.
    /// A missing folder yields an empty list.
    async fn list_notes(&self, folder: &str) -> Result<Vec<NoteRef>, StorageError>;

    /// Reads a scalar field from the note's metadata header.
    async fn read_field(&self, note: &NoteRef, field: &str) -> Result<Option<String>, StorageError>;
}
