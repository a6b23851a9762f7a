//! Paginated bookmarks endpoint client.
//!
//! [`BookmarksClient`] fetches one page at a time, consulting the shared
//! [`RateLimiter`] before every request and transparently waiting out
//! provider throttling a bounded number of times.

use std::time::SystemTime;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::ApiError;
use super::rate_limiter::RateLimiter;
use super::throttle::throttle_wait;
use super::types::BookmarksPage;

/// Production API base.
pub const DEFAULT_API_BASE: &str = "https://api.x.com/2";

/// Largest page the endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// How many times a throttled page request is retried after waiting.
pub const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 3;

const TWEET_FIELDS: &str = "created_at,public_metrics,author_id,entities,attachments,text,note_tweet,referenced_tweets,conversation_id";
const EXPANSIONS: &str = "author_id,attachments.media_keys,referenced_tweets.id";
const USER_FIELDS: &str = "name,username";
const MEDIA_FIELDS: &str = "url,type,alt_text,preview_image_url";

/// Source of bookmark pages.
///
/// This trait uses `async_trait` so the orchestrator can hold a
/// `dyn BookmarkSource`; tests substitute an in-memory source.
#[async_trait]
pub trait BookmarkSource: Send + Sync {
    /// Fetches one page of `account_id`'s bookmarks.
    ///
    /// `page_size` is clamped to `1..=100`.
    async fn fetch_page(
        &self,
        account_id: &str,
        access_token: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<BookmarksPage, ApiError>;
}

/// HTTP client for the bookmarks endpoint.
#[derive(Debug)]
pub struct BookmarksClient {
    http: Client,
    base_url: String,
    limiter: Mutex<RateLimiter>,
    max_throttle_retries: u32,
}

impl Default for BookmarksClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarksClient {
    /// Creates a client against the production API with the default budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Creates a client against a custom API base (used by tests).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: Mutex::new(RateLimiter::default()),
            max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
        }
    }

    /// Replaces the request budget.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Mutex::new(limiter);
        self
    }

    /// Sets how many times a throttled request is retried.
    #[must_use]
    pub fn with_max_throttle_retries(mut self, retries: u32) -> Self {
        self.max_throttle_retries = retries;
        self
    }

    /// Returns the configured API base.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of requests currently counting against the budget.
    pub async fn calls_in_window(&self) -> usize {
        self.limiter.lock().await.calls_in_window()
    }

    fn page_url(
        &self,
        account_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<Url, ApiError> {
        let raw = format!("{}/users/{}/bookmarks", self.base_url, account_id);
        let mut url = Url::parse(&raw).map_err(|_| ApiError::invalid_url(&raw))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("max_results", &page_size.clamp(1, MAX_PAGE_SIZE).to_string())
                .append_pair("tweet.fields", TWEET_FIELDS)
                .append_pair("expansions", EXPANSIONS)
                .append_pair("user.fields", USER_FIELDS)
                .append_pair("media.fields", MEDIA_FIELDS);
            if let Some(cursor) = cursor {
                query.append_pair("pagination_token", cursor);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl BookmarkSource for BookmarksClient {
    #[instrument(skip(self, access_token), fields(cursor = cursor.unwrap_or("")))]
    async fn fetch_page(
        &self,
        account_id: &str,
        access_token: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<BookmarksPage, ApiError> {
        let url = self.page_url(account_id, cursor, page_size)?;
        let mut throttled = 0_u32;

        loop {
            self.limiter.lock().await.wait_if_needed().await;

            let sent = self
                .http
                .get(url.clone())
                .bearer_auth(access_token)
                .send()
                .await;
            // The slot is consumed whether or not the request succeeded.
            self.limiter.lock().await.record_call();

            let response = sent.map_err(|e| ApiError::network(url.path(), e))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = throttle_wait(response.headers(), SystemTime::now());
                match wait {
                    Some(wait) if throttled < self.max_throttle_retries => {
                        throttled += 1;
                        warn!(
                            wait_ms = wait.as_millis(),
                            attempt = throttled,
                            "throttled by bookmarks API, waiting for reset"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    _ => return Err(ApiError::RateLimited { retries: throttled }),
                }
            }

            let body = response
                .text()
                .await
                .map_err(|e| ApiError::network(url.path(), e))?;

            if !status.is_success() {
                return Err(ApiError::remote(status.as_u16(), body));
            }

            let page: BookmarksPage =
                serde_json::from_str(&body).map_err(|e| ApiError::decode(url.path(), e))?;
            debug!(
                items = page.data.len(),
                has_next = page.next_cursor().is_some(),
                "fetched bookmarks page"
            );
            return Ok(page);
        }
    }
}
