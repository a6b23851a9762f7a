use std::fmt;

use super::error::SyncError;

/// Outcome of one sync run.
///
/// Always produced, even when the run aborts; a fatal error is then the last
/// entry in `errors`.
#[derive(Debug, Default)]
pub struct SyncResult {
    /// Items returned by the API across all pages.
    pub fetched: usize,
    /// Notes written.
    pub created: usize,
    /// Items already in the index.
    pub skipped: usize,
    pub errors: Vec<SyncError>,
    /// The run stopped because cancellation was requested.
    pub cancelled: bool,
}

impl SyncResult {
    pub(crate) fn failed(error: SyncError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// True when no error of any kind was recorded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The error that ended the run, if any.
    #[must_use]
    pub fn fatal_error(&self) -> Option<&SyncError> {
        self.errors.iter().find(|err| err.is_fatal())
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            f.write_str("Sync cancelled. ")?;
        }
        write!(
            f,
            "Created {} note(s), skipped {} duplicate(s)",
            self.created, self.skipped
        )?;
        if let Some(first) = self.errors.first() {
            write!(f, "; {} error(s), first: {first}", self.errors.len())?;
        }
        Ok(())
    }
}
