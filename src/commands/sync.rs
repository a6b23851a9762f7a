//! Sync command handler.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use bookmark_sync::state::StateStore;
use bookmark_sync::sync::{SyncMode, SyncObserver, TracingObserver};
use tracing::{info, warn};

use super::{build_engine, open_state_store, settings_with_overrides};
use crate::cli::SyncArgs;
use crate::progress::{SpinnerObserver, should_use_spinner};

pub async fn run_sync_command(args: &SyncArgs, state_path: Option<&Path>, quiet: bool) -> Result<()> {
    let store = Arc::new(open_state_store(state_path)?);
    let state = store.load().await?;

    let mut settings = settings_with_overrides(&state.settings, &args.vault)?;
    if let Some(max) = args.max {
        settings.max_items_per_sync = max;
    }
    let mode = SyncMode::from_full_flag(args.full || settings.full_sync);
    info!(
        vault = %settings.vault_path.display(),
        folder = %settings.bookmarks_folder,
        ?mode,
        "Starting sync"
    );

    let engine = build_engine(store, state, settings);

    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item");
            cancel.cancel();
        }
    });

    let spinner = should_use_spinner(io::stderr().is_terminal(), quiet, args.no_progress)
        .then(SpinnerObserver::start);
    let observer: &dyn SyncObserver = match &spinner {
        Some(spinner) => spinner,
        None => &TracingObserver,
    };

    let result = engine.sync(mode, observer).await;
    if let Some(spinner) = &spinner {
        spinner.finish();
    }

    for error in result.errors.iter().filter(|error| !error.is_fatal()) {
        warn!(%error, "Bookmark skipped");
    }
    if let Some(fatal) = result.fatal_error() {
        bail!("Sync failed: {fatal}");
    }

    info!(
        fetched = result.fetched,
        created = result.created,
        skipped = result.skipped,
        "Sync complete"
    );
    if !quiet {
        println!("{result}");
    }
    Ok(())
}
