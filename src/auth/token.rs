//! Access-token lifecycle.
//!
//! [`TokenManager`] hands out an access token that is good for at least the
//! refresh margin, refreshing it first when it is about to expire. It mutates
//! the caller's [`Credential`] in place and reports whether it did, so the
//! owner of the persisted state decides when to flush.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, instrument};

use super::credential::Credential;
use super::error::AuthError;
use super::oauth::TokenRefresher;

/// Tokens expiring sooner than this are refreshed before use.
pub const REFRESH_MARGIN_MINUTES: i64 = 5;

/// A bearer token ready for use.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// True if a refresh happened and the credential must be persisted.
    pub refreshed: bool,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("refreshed", &self.refreshed)
            .finish()
    }
}

/// Keeps the stored credential fresh.
pub struct TokenManager {
    refresher: Arc<dyn TokenRefresher>,
    margin: TimeDelta,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Creates a manager refreshing through `refresher`.
    #[must_use]
    pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            refresher,
            margin: TimeDelta::minutes(REFRESH_MARGIN_MINUTES),
        }
    }

    /// Returns a valid access token, refreshing `credential` if needed.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] if no complete credential is stored;
    /// any refresh failure is returned as-is and is never retried here.
    pub async fn ensure_valid_token(
        &self,
        credential: Option<&mut Credential>,
    ) -> Result<AccessToken, AuthError> {
        self.ensure_valid_token_at(credential, Utc::now()).await
    }

    /// [`ensure_valid_token`](Self::ensure_valid_token) against an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`ensure_valid_token`](Self::ensure_valid_token).
    #[instrument(level = "debug", skip(self, credential))]
    pub async fn ensure_valid_token_at(
        &self,
        credential: Option<&mut Credential>,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let Some(credential) = credential.filter(|c| c.is_complete()) else {
            return Err(AuthError::NotAuthenticated);
        };

        let remaining = credential.remaining(now);
        if remaining > self.margin {
            debug!(remaining_secs = remaining.num_seconds(), "access token still valid");
            return Ok(AccessToken {
                token: credential.access_token.clone(),
                refreshed: false,
            });
        }

        info!(
            remaining_secs = remaining.num_seconds(),
            "access token near expiry, refreshing"
        );
        let response = self.refresher.refresh(credential).await?;
        credential.apply_refresh(&response, now);
        Ok(AccessToken {
            token: credential.access_token.clone(),
            refreshed: true,
        })
    }
}
