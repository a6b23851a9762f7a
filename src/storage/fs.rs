//! Filesystem-backed note store rooted at a vault directory.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::error::StorageError;
use super::frontmatter;
use super::{NOTE_EXTENSION, NoteRef, NoteStore};

/// Notes stored as `.md` files under a vault root.
///
/// All paths handed to the store are vault-relative with `/` separators.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    /// Creates a store rooted at `root`. The directory is not created.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vault root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let relative_path = Path::new(relative);
        let escapes = relative_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::InvalidPath {
                path: relative.to_string(),
            });
        }
        Ok(self.root.join(relative_path))
    }
}

#[async_trait]
impl NoteStore for FsNoteStore {
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    async fn ensure_folder(&self, folder: &str) -> Result<(), StorageError> {
        let path = self.resolve(folder)?;
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| StorageError::io(&path, e))
    }

    #[instrument(level = "debug", skip(self, contents))]
    async fn create_note(&self, path: &str, contents: &str) -> Result<(), StorageError> {
        let full_path = self.resolve(path)?;
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists { path: full_path });
            }
            Err(err) => return Err(StorageError::io(&full_path, err)),
        };

        let written: std::io::Result<()> = async {
            file.write_all(contents.as_bytes()).await?;
            file.flush().await
        }
        .await;
        if let Err(err) = written {
            // Remove the partial note so a later run can recreate it.
            let _ = tokio::fs::remove_file(&full_path).await;
            return Err(StorageError::io(&full_path, err));
        }

        debug!(path = %full_path.display(), bytes = contents.len(), "note created");
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_notes(&self, folder: &str) -> Result<Vec<NoteRef>, StorageError> {
        let base = self.resolve(folder)?;
        let mut notes = Vec::new();
        let mut pending = vec![(base.clone(), folder.trim_end_matches('/').to_string())];

        while let Some((dir, relative_dir)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound && dir == base => {
                    return Ok(Vec::new());
                }
                Err(err) => return Err(StorageError::io(&dir, err)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(&dir, e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let relative = if relative_dir.is_empty() {
                    name.clone()
                } else {
                    format!("{relative_dir}/{name}")
                };
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io(entry.path(), e))?;

                if file_type.is_dir() {
                    pending.push((entry.path(), relative));
                } else if file_type.is_file()
                    && Path::new(&name)
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(NOTE_EXTENSION))
                {
                    notes.push(NoteRef {
                        path: relative,
                        name,
                    });
                }
            }
        }

        notes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(notes)
    }

    async fn read_field(&self, note: &NoteRef, field: &str) -> Result<Option<String>, StorageError> {
        let full_path = self.resolve(&note.path)?;
        let contents = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| StorageError::io(&full_path, e))?;
        frontmatter::read_field(&contents, field)
            .map_err(|reason| StorageError::metadata(&full_path, reason))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_fs_store_create_note_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FsNoteStore::new(dir.path());
        store.ensure_folder("Bookmarks").await.unwrap();

        store.create_note("Bookmarks/a.md", "first").await.unwrap();
        let second = store.create_note("Bookmarks/a.md", "second").await;

        assert!(matches!(second, Err(StorageError::AlreadyExists { .. })));
        let on_disk = std::fs::read_to_string(dir.path().join("Bookmarks/a.md")).unwrap();
        assert_eq!(on_disk, "first");
    }

    #[tokio::test]
    async fn test_fs_store_ensure_folder_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FsNoteStore::new(dir.path());

        store.ensure_folder("Clips/Social").await.unwrap();
        store.ensure_folder("Clips/Social").await.unwrap();

        assert!(dir.path().join("Clips/Social").is_dir());
    }

    #[tokio::test]
    async fn test_fs_store_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let store = FsNoteStore::new(dir.path());

        let result = store.create_note("../outside.md", "x").await;
        assert!(matches!(result, Err(StorageError::InvalidPath { .. })));
        let result = store.ensure_folder("/etc").await;
        assert!(matches!(result, Err(StorageError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_fs_store_list_notes_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let store = FsNoteStore::new(dir.path());
        store.ensure_folder("Bookmarks/nested").await.unwrap();
        store.create_note("Bookmarks/b.md", "").await.unwrap();
        store.create_note("Bookmarks/a.md", "").await.unwrap();
        store.create_note("Bookmarks/nested/c.md", "").await.unwrap();
        std::fs::write(dir.path().join("Bookmarks/image.png"), b"png").unwrap();

        let notes = store.list_notes("Bookmarks").await.unwrap();
        let paths: Vec<&str> = notes.iter().map(|n| n.path.as_str()).collect();

        assert_eq!(
            paths,
            vec!["Bookmarks/a.md", "Bookmarks/b.md", "Bookmarks/nested/c.md"]
        );
        assert_eq!(notes[2].name, "c.md");
    }

    #[tokio::test]
    async fn test_fs_store_list_notes_missing_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsNoteStore::new(dir.path());
        assert!(store.list_notes("Nowhere").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_store_read_field() {
        let dir = TempDir::new().unwrap();
        let store = FsNoteStore::new(dir.path());
        store.ensure_folder("B").await.unwrap();
        store
            .create_note("B/n.md", "---\nsource: https://x.com/u/status/9\n---\nbody\n")
            .await
            .unwrap();

        let note = NoteRef {
            path: "B/n.md".to_string(),
            name: "n.md".to_string(),
        };
        assert_eq!(
            store.read_field(&note, "source").await.unwrap().as_deref(),
            Some("https://x.com/u/status/9")
        );
        assert_eq!(store.read_field(&note, "link").await.unwrap(), None);
    }
}
