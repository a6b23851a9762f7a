//! Error types for the bookmarks API client.

use thiserror::Error;

/// Errors returned by [`BookmarksClient`](super::BookmarksClient).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connection refused, TLS, timeout).
    #[error("network error calling {url}: {source}")]
    Network {
        /// Request URL, without credentials.
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Throttled with no usable reset signal, or throttled again after the
    /// configured number of waits.
    #[error("rate limited by the bookmarks API after {retries} wait(s); try again later")]
    RateLimited {
        /// How many times the client already waited for a reset.
        retries: u32,
    },

    /// Non-success, non-throttling HTTP response.
    #[error("bookmarks API error (HTTP {status}): {body}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the provider.
        body: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL could not be joined with the endpoint path.
    #[error("invalid API URL: {url}")]
    InvalidUrl { url: String },
}

impl ApiError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a remote status error.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
