//! The sync orchestrator.
//!
//! A run walks `Authenticating → IndexCheck → Fetching(page) → item loop`
//! until the pages run out, the item cap is reached, incremental mode meets
//! already-synced items, or cancellation is requested. It always ends with a
//! [`SyncResult`].

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::error::SyncError;
use super::observer::{SyncObserver, SyncPhase, SyncProgress};
use super::result::SyncResult;
use crate::api::{BookmarkSource, MAX_PAGE_SIZE, RelatedEntities, Tweet};
use crate::auth::TokenManager;
use crate::index::DedupIndex;
use crate::state::{Settings, StateStore, SyncState};
use crate::storage::NoteStore;
use crate::transform::{TransformOptions, render_note, transform};

/// Consecutive already-synced items that end an incremental run.
pub const EARLY_STOP_THRESHOLD: u32 = 3;

/// How far back a run walks the bookmark list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Stop once [`EARLY_STOP_THRESHOLD`] already-synced items are seen in a row.
    Incremental,
    /// Walk every page; already-synced items are still skipped.
    Full,
}

impl SyncMode {
    #[must_use]
    pub fn from_full_flag(full: bool) -> Self {
        if full { Self::Full } else { Self::Incremental }
    }
}

/// Cooperative cancellation flag, polled between pages and between items.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation so the next run proceeds.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Size of the next page request, or zero once `cap` items were fetched.
/// A `cap` of zero means unlimited.
#[must_use]
pub fn next_page_size(cap: u32, fetched: usize) -> u32 {
    if cap == 0 {
        return MAX_PAGE_SIZE;
    }
    let remaining = usize::try_from(cap)
        .unwrap_or(usize::MAX)
        .saturating_sub(fetched);
    u32::try_from(remaining).map_or(MAX_PAGE_SIZE, |remaining| remaining.min(MAX_PAGE_SIZE))
}

/// Mirrors bookmarks into notes.
///
/// The engine owns the [`SyncState`] behind a run lock: at most one
/// [`sync`](Self::sync) or [`rebuild_index`](Self::rebuild_index) proceeds at
/// a time, and a second caller gets [`SyncError::AlreadyRunning`] instead of
/// waiting.
pub struct SyncEngine {
    source: Arc<dyn BookmarkSource>,
    tokens: TokenManager,
    notes: Arc<dyn NoteStore>,
    states: Arc<dyn StateStore>,
    state: Mutex<SyncState>,
    /// Settings used instead of the persisted ones, without being saved.
    run_settings: Option<Settings>,
    cancel: CancelHandle,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("tokens", &self.tokens)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// Per-run bookkeeping that is not part of the result.
struct RunContext {
    mode: SyncMode,
    folder: String,
    options: TransformOptions,
    /// File names present in the folder, including notes created this run.
    existing: HashSet<String>,
    consecutive_seen: u32,
    unflushed: u32,
    flush_interval: u32,
}

impl SyncEngine {
    /// Creates an engine over `state`, typically just loaded from `states`.
    #[must_use]
    pub fn new(
        source: Arc<dyn BookmarkSource>,
        tokens: TokenManager,
        notes: Arc<dyn NoteStore>,
        states: Arc<dyn StateStore>,
        state: SyncState,
    ) -> Self {
        Self {
            source,
            tokens,
            notes,
            states,
            state: Mutex::new(state),
            run_settings: None,
            cancel: CancelHandle::default(),
        }
    }

    /// Runs with `settings` instead of the persisted settings. The persisted
    /// settings are left as they are.
    #[must_use]
    pub fn with_run_settings(mut self, settings: Settings) -> Self {
        self.run_settings = Some(settings);
        self
    }

    fn settings_for(&self, state: &SyncState) -> Settings {
        self.run_settings
            .clone()
            .unwrap_or_else(|| state.settings.clone())
    }

    /// Handle that cancels the current (and any later) run until reset.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Copy of the current state. Waits for a running sync to finish.
    pub async fn snapshot(&self) -> SyncState {
        self.state.lock().await.clone()
    }

    /// Runs one sync.
    ///
    /// Never fails as a whole: authentication, folder setup and page fetch
    /// failures end the run and are reported in [`SyncResult::errors`];
    /// per-item write failures are recorded and the run continues.
    #[instrument(skip(self, observer))]
    pub async fn sync(&self, mode: SyncMode, observer: &dyn SyncObserver) -> SyncResult {
        let Ok(mut state) = self.state.try_lock() else {
            warn!("sync requested while another run holds the lock");
            return SyncResult::failed(SyncError::AlreadyRunning);
        };

        let mut result = SyncResult::default();
        if let Err(err) = self.run(&mut state, mode, observer, &mut result).await {
            warn!(error = %err, "sync aborted");
            if result.created > 0 {
                if let Err(save_err) = self.states.save(&state).await {
                    warn!(error = %save_err, "failed to persist index after aborted sync");
                }
            }
            result.errors.push(err);
        }

        observer.phase(SyncPhase::Done);
        info!(
            fetched = result.fetched,
            created = result.created,
            skipped = result.skipped,
            errors = result.errors.len(),
            cancelled = result.cancelled,
            "sync finished"
        );
        result
    }

    async fn run(
        &self,
        state: &mut SyncState,
        mode: SyncMode,
        observer: &dyn SyncObserver,
        result: &mut SyncResult,
    ) -> Result<(), SyncError> {
        observer.phase(SyncPhase::Authenticating);
        let token = self.tokens.ensure_valid_token(state.credential.as_mut()).await?;
        if token.refreshed {
            self.states.save(state).await?;
        }
        let account_id = state
            .account
            .as_ref()
            .map(|account| account.id.clone())
            .ok_or(SyncError::NotAuthenticated)?;

        let settings = self.settings_for(state);
        let folder = settings.bookmarks_folder.clone();
        self.notes.ensure_folder(&folder).await?;

        if state.synced_items.is_empty() {
            observer.phase(SyncPhase::IndexCheck);
            let indexed = state.synced_items.rebuild(&*self.notes, &folder).await?;
            info!(indexed, "built initial sync index");
            self.states.save(state).await?;
        }

        let existing = DedupIndex::list_filenames(&*self.notes, &folder).await?;
        let cap = settings.max_items_per_sync;
        let mut run = RunContext {
            mode,
            existing,
            options: TransformOptions::from_settings(&settings, Local::now().date_naive()),
            folder,
            consecutive_seen: 0,
            unflushed: 0,
            flush_interval: settings.flush_interval.max(1),
        };
        let mut cursor: Option<String> = None;
        let mut page_number = 0_u32;

        loop {
            if self.cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let page_size = next_page_size(cap, result.fetched);
            if page_size == 0 {
                break;
            }

            page_number += 1;
            observer.phase(SyncPhase::Fetching { page: page_number });
            let page = self
                .source
                .fetch_page(&account_id, &token.token, cursor.as_deref(), page_size)
                .await?;
            if page.data.is_empty() {
                debug!(page = page_number, "empty page, nothing more to fetch");
                break;
            }

            result.fetched += page.data.len();
            observer.progress(progress_of(result));

            let related = RelatedEntities::from_includes(&page.includes);
            let stopped = self
                .process_page(state, &page.data, &related, &mut run, observer, result)
                .await?;
            if stopped {
                break;
            }

            cursor = page.next_cursor().map(str::to_string);
            if cap > 0 && result.fetched >= usize::try_from(cap).unwrap_or(usize::MAX) {
                debug!(cap, "item cap reached");
                break;
            }
            if cursor.is_none() {
                break;
            }
        }

        if result.cancelled {
            observer.phase(SyncPhase::Cancelled);
        }
        state.last_sync = Some(Utc::now());
        self.states.save(state).await?;
        Ok(())
    }

    /// Handles one page of items. Returns true when the run should stop.
    async fn process_page(
        &self,
        state: &mut SyncState,
        items: &[Tweet],
        related: &RelatedEntities<'_>,
        run: &mut RunContext,
        observer: &dyn SyncObserver,
        result: &mut SyncResult,
    ) -> Result<bool, SyncError> {
        for item in items {
            if self.cancel.is_cancelled() {
                result.cancelled = true;
                return Ok(true);
            }

            if state.synced_items.is_synced(&item.id) {
                result.skipped += 1;
                run.consecutive_seen += 1;
                observer.progress(progress_of(result));
                if run.mode == SyncMode::Incremental && run.consecutive_seen >= EARLY_STOP_THRESHOLD {
                    observer.phase(SyncPhase::ReachedSynced);
                    return Ok(true);
                }
                continue;
            }
            run.consecutive_seen = 0;

            let note = transform(item, related, &run.options, &run.existing);
            let file_name = note.file_name();
            let path = format!("{}/{file_name}", run.folder);
            match self.notes.create_note(&path, &render_note(&note)).await {
                Ok(()) => {
                    debug!(item_id = %item.id, path = %path, "created note");
                    state.synced_items.record(item.id.clone(), file_name.clone());
                    run.existing.insert(file_name);
                    result.created += 1;
                    run.unflushed += 1;
                    if run.unflushed >= run.flush_interval {
                        self.states.save(state).await?;
                        run.unflushed = 0;
                    }
                }
                Err(source) => {
                    warn!(item_id = %item.id, error = %source, "failed to write note");
                    result.errors.push(SyncError::item(item.id.clone(), source));
                }
            }
            observer.progress(progress_of(result));
        }
        Ok(false)
    }

    /// Rebuilds the index from the notes on disk and persists it.
    ///
    /// # Errors
    ///
    /// [`SyncError::AlreadyRunning`] while a sync holds the lock; otherwise
    /// storage or state errors.
    #[instrument(skip(self))]
    pub async fn rebuild_index(&self) -> Result<usize, SyncError> {
        let Ok(mut state) = self.state.try_lock() else {
            return Err(SyncError::AlreadyRunning);
        };
        let folder = self.settings_for(&state).bookmarks_folder;
        let count = state.synced_items.rebuild(&*self.notes, &folder).await?;
        self.states.save(&state).await?;
        Ok(count)
    }
}

fn progress_of(result: &SyncResult) -> SyncProgress {
    SyncProgress {
        fetched: result.fetched,
        created: result.created,
        skipped: result.skipped,
    }
}
