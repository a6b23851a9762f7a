//! Rebuild-index command handler.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use bookmark_sync::state::StateStore;
use tracing::info;

use super::{build_engine, open_state_store, settings_with_overrides};
use crate::cli::VaultArgs;

pub async fn run_rebuild_index_command(vault: &VaultArgs, state_path: Option<&Path>) -> Result<()> {
    let store = Arc::new(open_state_store(state_path)?);
    let state = store.load().await?;
    let settings = settings_with_overrides(&state.settings, vault)?;

    info!(
        vault = %settings.vault_path.display(),
        folder = %settings.bookmarks_folder,
        "Rebuilding sync index"
    );
    let engine = build_engine(store, state, settings);
    let count = engine.rebuild_index().await?;

    println!("Indexed {count} existing note(s)");
    Ok(())
}
