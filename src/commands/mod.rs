//! CLI command handlers.

mod auth;
mod config;
mod index;
mod status;
mod sync;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bookmark_sync::api::BookmarksClient;
use bookmark_sync::auth::{OAuthClient, TokenManager};
use bookmark_sync::state::{JsonStateStore, Settings, SyncState};
use bookmark_sync::storage::FsNoteStore;
use bookmark_sync::sync::SyncEngine;

use crate::cli::VaultArgs;

pub use auth::{run_auth_login_command, run_auth_logout_command};
pub use config::{run_config_set_command, run_config_show_command};
pub use index::run_rebuild_index_command;
pub use status::run_status_command;
pub use sync::run_sync_command;

/// Opens the state store at `path`, or at the default location.
fn open_state_store(path: Option<&Path>) -> Result<JsonStateStore> {
    match path {
        Some(path) => Ok(JsonStateStore::new(path)),
        None => JsonStateStore::at_default_path().context("cannot locate the state file"),
    }
}

/// Persisted settings with this run's `--vault`/`--folder` applied.
fn settings_with_overrides(settings: &Settings, vault: &VaultArgs) -> Result<Settings> {
    let mut effective = settings.clone();
    if let Some(path) = &vault.vault {
        effective.vault_path.clone_from(path);
    }
    if let Some(folder) = &vault.folder {
        effective.set("bookmarks_folder", folder)?;
    }
    Ok(effective)
}

/// Wires the production collaborators around `state`.
fn build_engine(store: Arc<JsonStateStore>, state: SyncState, settings: Settings) -> SyncEngine {
    let notes = Arc::new(FsNoteStore::new(&settings.vault_path));
    SyncEngine::new(
        Arc::new(BookmarksClient::new()),
        TokenManager::new(Arc::new(OAuthClient::new())),
        notes,
        store,
        state,
    )
    .with_run_settings(settings)
}
