//! Config command handlers: show and change persisted settings.

use std::path::Path;

use anyhow::Result;
use bookmark_sync::state::StateStore;
use tracing::info;

use super::open_state_store;

pub async fn run_config_show_command(state_path: Option<&Path>) -> Result<()> {
    let store = open_state_store(state_path)?;
    let state = store.load().await?;

    println!("state_path = {}", store.path().display());
    for (key, value) in state.settings.entries() {
        println!("{key} = {value}");
    }
    Ok(())
}

pub async fn run_config_set_command(key: &str, value: &str, state_path: Option<&Path>) -> Result<()> {
    let store = open_state_store(state_path)?;
    let mut state = store.load().await?;

    state.settings.set(key, value)?;
    store.save(&state).await?;

    info!(key, "Setting updated");
    Ok(())
}
