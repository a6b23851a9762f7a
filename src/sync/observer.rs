//! Progress reporting hooks for a sync run.

use std::fmt;

use tracing::{debug, info};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Authenticating,
    /// Building the index from existing notes before the first fetch.
    IndexCheck,
    Fetching { page: u32 },
    /// Incremental mode met enough already-synced items to stop.
    ReachedSynced,
    Cancelled,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticating => f.write_str("Checking authentication..."),
            Self::IndexCheck => f.write_str("Building initial sync index..."),
            Self::Fetching { page } => write!(f, "Fetching bookmarks page {page}..."),
            Self::ReachedSynced => f.write_str("Reached previously synced bookmarks."),
            Self::Cancelled => f.write_str("Sync cancelled."),
            Self::Done => f.write_str("Sync complete."),
        }
    }
}

/// Running counters reported to observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncProgress {
    pub fetched: usize,
    pub created: usize,
    pub skipped: usize,
}

/// Receives phase changes and counter updates from the engine.
///
/// Both methods default to doing nothing.
pub trait SyncObserver: Send + Sync {
    fn phase(&self, _phase: SyncPhase) {}

    fn progress(&self, _progress: SyncProgress) {}
}

/// Ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// Emits phases at info level and counters at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn phase(&self, phase: SyncPhase) {
        info!(%phase, "sync phase");
    }

    fn progress(&self, progress: SyncProgress) {
        debug!(
            fetched = progress.fetched,
            created = progress.created,
            skipped = progress.skipped,
            "sync progress"
        );
    }
}
