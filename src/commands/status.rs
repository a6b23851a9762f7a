//! Status command handler.

use std::path::Path;

use anyhow::Result;
use bookmark_sync::state::{StateStore, SyncState};
use chrono::{DateTime, Utc};

use super::open_state_store;

pub async fn run_status_command(state_path: Option<&Path>) -> Result<()> {
    let store = open_state_store(state_path)?;
    let state = store.load().await?;

    println!("state_path = {}", store.path().display());
    for line in status_lines(&state, Utc::now()) {
        println!("{line}");
    }
    Ok(())
}

fn status_lines(state: &SyncState, now: DateTime<Utc>) -> Vec<String> {
    let connection = match (&state.account, state.is_connected()) {
        (Some(account), true) => format!("connected as @{} (id {})", account.username, account.id),
        _ => "not connected".to_string(),
    };
    let mut lines = vec![format!("account = {connection}")];

    if let Some(credential) = state.credential.as_ref().filter(|_| state.is_connected()) {
        let minutes = credential.remaining(now).num_minutes();
        let token = if minutes > 0 {
            format!("valid for {minutes} more minute(s)")
        } else {
            "expired (refreshed on next sync)".to_string()
        };
        lines.push(format!("access_token = {token}"));
    }

    lines.push(format!(
        "last_sync = {}",
        state
            .last_sync
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339())
    ));
    lines.push(format!("indexed_notes = {}", state.synced_items.len()));
    lines.extend(
        state
            .settings
            .entries()
            .into_iter()
            .map(|(key, value)| format!("{key} = {value}")),
    );
    lines
}
