//! Error types for the OAuth flow and token lifecycle.

use thiserror::Error;

/// Errors raised while connecting an account or keeping its token fresh.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable credential is stored; the account must be connected first.
    #[error("not authenticated: run `bookmark-sync auth login` first")]
    NotAuthenticated,

    /// The token endpoint refused an exchange or refresh.
    #[error("token request rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Provider error description, or the raw body.
        message: String,
    },

    /// Transport-level failure talking to the OAuth endpoints.
    #[error("network error calling {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A token or user response was not the expected JSON shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The `state` echoed back by the redirect does not match the one sent.
    #[error("authorization state mismatch; restart the login")]
    StateMismatch,

    /// The redirect carried no authorization code.
    #[error("no authorization code found in the redirect")]
    MissingCode,

    /// The user (or provider) declined the authorization request.
    #[error("authorization denied: {reason}")]
    Denied { reason: String },

    /// An endpoint URL could not be parsed.
    #[error("invalid OAuth URL: {url}")]
    InvalidUrl { url: String },
}

impl AuthError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates a rejection error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_rejected_display() {
        let msg = AuthError::rejected(400, "invalid_grant").to_string();
        assert!(msg.contains("400"), "Expected status in: {msg}");
        assert!(msg.contains("invalid_grant"), "Expected message in: {msg}");
    }

    #[test]
    fn test_auth_error_not_authenticated_suggests_login() {
        let msg = AuthError::NotAuthenticated.to_string();
        assert!(msg.contains("auth login"), "Expected hint in: {msg}");
    }

    #[test]
    fn test_auth_error_denied_display() {
        let msg = AuthError::Denied {
            reason: "access_denied".to_string(),
        }
        .to_string();
        assert_eq!(msg, "authorization denied: access_denied");
    }
}
