//! Bookmark Sync Library
//!
//! Mirrors a user's saved-post bookmarks into a folder of markdown notes,
//! one note per bookmark, each with a metadata header that makes it
//! searchable alongside the rest of a note vault.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`api`] - Paginated bookmarks client with rate limiting
//! - [`auth`] - OAuth 2.0 PKCE login and access-token refresh
//! - [`transform`] - Turning a post into a note (title, type, body, header)
//! - [`storage`] - Note store over a vault directory
//! - [`index`] - Dedup index mapping post ids to note files
//! - [`state`] - Persisted settings, credential and index
//! - [`sync`] - The sync orchestrator

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod index;
pub mod state;
pub mod storage;
pub mod sync;
pub mod transform;

// Re-export commonly used types
pub use api::{ApiError, BookmarkSource, BookmarksClient, RateLimiter};
pub use auth::{AuthError, Credential, OAuthClient, TokenManager};
pub use index::DedupIndex;
pub use state::{JsonStateStore, Settings, StateError, StateStore, SyncState};
pub use storage::{FsNoteStore, NoteStore, StorageError};
pub use sync::{SyncEngine, SyncError, SyncMode, SyncResult};
pub use transform::{NoteRecord, render_note, transform};
