//! Sync orchestration.
//!
//! [`SyncEngine`] ties the pieces together: it refreshes the access token,
//! makes sure the dedup index is populated, pages through the bookmarks API
//! and writes one note per new item, persisting the index as it goes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bookmark_sync::api::BookmarksClient;
//! use bookmark_sync::auth::{OAuthClient, TokenManager};
//! use bookmark_sync::state::{JsonStateStore, StateStore};
//! use bookmark_sync::storage::FsNoteStore;
//! use bookmark_sync::sync::{SyncEngine, SyncMode, TracingObserver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let states = Arc::new(JsonStateStore::at_default_path()?);
//! let state = states.load().await?;
//! let notes = Arc::new(FsNoteStore::new(&state.settings.vault_path));
//! let engine = SyncEngine::new(
//!     Arc::new(BookmarksClient::new()),
//!     TokenManager::new(Arc::new(OAuthClient::new())),
//!     notes,
//!     states,
//!     state,
//! );
//! let result = engine.sync(SyncMode::Incremental, &TracingObserver).await;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod observer;
mod result;

pub use engine::{CancelHandle, EARLY_STOP_THRESHOLD, SyncEngine, SyncMode, next_page_size};
pub use error::SyncError;
pub use observer::{NoopObserver, SyncObserver, SyncPhase, SyncProgress, TracingObserver};
pub use result::SyncResult;
