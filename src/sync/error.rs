//! Error taxonomy of a sync run.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::state::StateError;
use crate::storage::StorageError;

/// Errors recorded in a [`SyncResult`](super::SyncResult).
///
/// Everything except [`ItemProcessing`](Self::ItemProcessing) aborts the run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No usable credential or connected account.
    #[error("not connected: run `bookmark-sync auth login` first")]
    NotAuthenticated,

    /// Token refresh was refused or failed.
    #[error("authentication failed: {0}")]
    Auth(#[source] AuthError),

    /// The bookmarks API kept throttling.
    #[error("rate limited by the bookmarks API after {retries} wait(s); try again later")]
    RateLimited { retries: u32 },

    /// The bookmarks API answered with an error status.
    #[error("bookmarks API error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// Transport or decoding failure while fetching a page.
    #[error("failed to fetch bookmarks: {0}")]
    Network(#[source] ApiError),

    /// Folder setup or the initial index scan failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Persisting the sync state failed.
    #[error("failed to save sync state: {0}")]
    State(#[from] StateError),

    /// One item could not be written. The run continues.
    #[error("item {item_id}: {source}")]
    ItemProcessing {
        item_id: String,
        #[source]
        source: StorageError,
    },

    /// Another run holds the run lock.
    #[error("a sync is already running")]
    AlreadyRunning,
}

impl SyncError {
    /// Creates a per-item error.
    pub fn item(item_id: impl Into<String>, source: StorageError) -> Self {
        Self::ItemProcessing {
            item_id: item_id.into(),
            source,
        }
    }

    /// True for errors that end the run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ItemProcessing { .. })
    }
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated => Self::NotAuthenticated,
            other => Self::Auth(other),
        }
    }
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited { retries } => Self::RateLimited { retries },
            ApiError::Remote { status, body } => Self::Remote { status, body },
            other => Self::Network(other),
        }
    }
}
