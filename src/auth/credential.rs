//! Stored OAuth credential.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::oauth::TokenResponse;

/// Used when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_TTL_SECS: u64 = 7200;

/// Longest lifetime accepted from the token endpoint (one year).
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

/// Access and refresh token for the connected account, plus the client
/// registration that issued them.
///
/// Secrets are redacted in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// The access token is usable only strictly before this instant.
    pub expires_at: DateTime<Utc>,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

impl Credential {
    /// Builds a credential from a fresh token exchange.
    #[must_use]
    pub fn from_token_response(
        response: &TokenResponse,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone().unwrap_or_default(),
            expires_at: expiry_from(response.expires_in, now),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Overwrites the token pair after a refresh.
    ///
    /// Some providers rotate refresh tokens and some do not; the previous
    /// refresh token is kept when none is returned.
    pub fn apply_refresh(&mut self, response: &TokenResponse, now: DateTime<Utc>) {
        self.access_token.clone_from(&response.access_token);
        if let Some(refresh_token) = response.refresh_token.as_ref().filter(|t| !t.is_empty()) {
            self.refresh_token.clone_from(refresh_token);
        }
        self.expires_at = expiry_from(response.expires_in, now);
    }

    /// True when both tokens are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Time left before expiry (negative once expired).
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        self.expires_at.signed_duration_since(now)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

fn expiry_from(expires_in: Option<u64>, now: DateTime<Utc>) -> DateTime<Utc> {
    let secs = expires_in
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS)
        .min(MAX_TOKEN_TTL_SECS);
    now + TimeDelta::seconds(i64::try_from(secs).unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(refresh: Option<&str>, expires_in: Option<u64>) -> TokenResponse {
        TokenResponse {
            access_token: "new-access".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in,
            scope: None,
            token_type: Some("bearer".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_credential_from_token_response() {
        let credential =
            Credential::from_token_response(&response(Some("r1"), Some(7200)), "cid", "secret", now());

        assert_eq!(credential.access_token, "new-access");
        assert_eq!(credential.refresh_token, "r1");
        assert_eq!(credential.remaining(now()), TimeDelta::hours(2));
        assert!(credential.is_complete());
    }

    #[test]
    fn test_credential_refresh_keeps_old_refresh_token_when_absent() {
        let mut credential =
            Credential::from_token_response(&response(Some("r1"), Some(60)), "cid", "", now());

        credential.apply_refresh(&response(None, Some(3600)), now());

        assert_eq!(credential.refresh_token, "r1");
        assert_eq!(credential.remaining(now()), TimeDelta::hours(1));
    }

    #[test]
    fn test_credential_refresh_rotates_refresh_token() {
        let mut credential =
            Credential::from_token_response(&response(Some("r1"), None), "cid", "", now());
        assert_eq!(credential.remaining(now()), TimeDelta::hours(2));

        credential.apply_refresh(&response(Some("r2"), Some(60)), now());
        assert_eq!(credential.refresh_token, "r2");
    }

    #[test]
    fn test_credential_debug_redacts_secrets() {
        let credential =
            Credential::from_token_response(&response(Some("r1"), None), "cid", "shh", now());
        let debug = format!("{credential:?}");
        assert!(!debug.contains("new-access"));
        assert!(!debug.contains("shh"));
        assert!(debug.contains("cid"));
    }
}
