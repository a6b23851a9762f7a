//! Progress UI (spinner) for sync runs.

use std::time::Duration;

use bookmark_sync::sync::{SyncObserver, SyncPhase, SyncProgress};
use indicatif::{ProgressBar, ProgressStyle};

/// Renders sync progress as a single spinner line on stderr.
pub(crate) struct SpinnerObserver {
    spinner: ProgressBar,
}

impl SpinnerObserver {
    pub(crate) fn start() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }

    pub(crate) fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl SyncObserver for SpinnerObserver {
    fn phase(&self, phase: SyncPhase) {
        self.spinner.set_prefix(phase.to_string());
    }

    fn progress(&self, progress: SyncProgress) {
        self.spinner.set_message(counters_label(progress));
    }
}

fn counters_label(progress: SyncProgress) -> String {
    format!(
        "[fetched {}, created {}, skipped {}]",
        progress.fetched, progress.created, progress.skipped
    )
}

/// Spinner only on an interactive, non-dumb terminal, and not when quiet.
pub(crate) fn should_use_spinner(stderr_is_terminal: bool, quiet: bool, disabled: bool) -> bool {
    stderr_is_terminal && !quiet && !disabled && !is_dumb_terminal()
}

fn is_dumb_terminal() -> bool {
    std::env::var("TERM").is_ok_and(|term| term == "dumb")
}
