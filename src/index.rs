//! Deduplication index: which bookmarks already have a note.
//!
//! The index maps a post id to the file name of the note created for it. It
//! is persisted with the rest of [`SyncState`](crate::state::SyncState) and
//! can be rebuilt wholesale by scanning the notes in the vault.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::storage::{NoteStore, StorageError};

/// Matches a post permalink on either platform domain.
#[allow(clippy::expect_used)]
static STATUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.)?(?:x\.com|twitter\.com)/\w+/status/(\d+)")
        .expect("status URL regex is valid")
});

/// Metadata fields checked for a permalink, in order.
const LINK_FIELDS: [&str; 2] = ["source", "link"];

/// Extracts the post id from a permalink.
///
/// ```
/// use bookmark_sync::index::extract_item_id;
///
/// assert_eq!(extract_item_id("https://x.com/rustlang/status/1234"), Some("1234"));
/// assert_eq!(extract_item_id("https://github.com/rust-lang/rust"), None);
/// ```
#[must_use]
pub fn extract_item_id(url: &str) -> Option<&str> {
    STATUS_URL
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}

/// Mapping from post id to note file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupIndex {
    entries: BTreeMap<String, String>,
}

impl DedupIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a note was already created for `item_id`.
    #[must_use]
    pub fn is_synced(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    /// Records the note created for `item_id`.
    pub fn record(&mut self, item_id: impl Into<String>, filename: impl Into<String>) {
        self.entries.insert(item_id.into(), filename.into());
    }

    /// File name recorded for `item_id`.
    #[must_use]
    pub fn filename(&self, item_id: &str) -> Option<&str> {
        self.entries.get(item_id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    /// Replaces the index with what a scan of `folder` finds.
    ///
    /// Each note's `source` (falling back to `link`) is matched against the
    /// permalink pattern. Notes without a matching link, or that cannot be
    /// read, are skipped. Returns the number of entries found.
    ///
    /// # Errors
    ///
    /// Only a failure to list `folder` itself is returned.
    #[instrument(skip(self, store))]
    pub async fn rebuild(&mut self, store: &dyn NoteStore, folder: &str) -> Result<usize, StorageError> {
        let notes = store.list_notes(folder).await?;
        let mut entries = BTreeMap::new();

        for note in &notes {
            if let Some(id) = scan_note(store, note).await {
                entries.insert(id, note.name.clone());
            }
        }

        info!(scanned = notes.len(), indexed = entries.len(), "rebuilt sync index");
        self.entries = entries;
        Ok(self.entries.len())
    }

    /// File names of every note under `folder`, for filename uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the folder cannot be listed.
    pub async fn list_filenames(
        store: &dyn NoteStore,
        folder: &str,
    ) -> Result<HashSet<String>, StorageError> {
        Ok(store
            .list_notes(folder)
            .await?
            .into_iter()
            .map(|note| note.name)
            .collect())
    }
}

async fn scan_note(store: &dyn NoteStore, note: &crate::storage::NoteRef) -> Option<String> {
    for field in LINK_FIELDS {
        match store.read_field(note, field).await {
            Ok(Some(link)) => {
                if let Some(id) = extract_item_id(&link) {
                    return Some(id.to_string());
                }
            }
            Ok(None) => {}
            Err(err) => {
                debug!(path = %note.path, error = %err, "skipping unreadable note");
                return None;
            }
        }
    }
    None
}
