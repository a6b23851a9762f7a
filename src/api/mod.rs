//! Bookmarks API client.
//!
//! This module wraps the paginated bookmarks endpoint. Every outbound request
//! passes through a sliding-window [`RateLimiter`]; throttling responses are
//! waited out and retried a bounded number of times.
//!
//! # Example
//!
//! ```no_run
//! use bookmark_sync::api::{BookmarkSource, BookmarksClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BookmarksClient::new();
//! let page = client.fetch_page("12345", "access-token", None, 100).await?;
//! println!("{} items, next: {:?}", page.data.len(), page.next_cursor());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod rate_limiter;
mod throttle;
pub mod types;

pub use client::{
    BookmarkSource, BookmarksClient, DEFAULT_API_BASE, DEFAULT_MAX_THROTTLE_RETRIES,
    MAX_PAGE_SIZE,
};
pub use error::ApiError;
pub use rate_limiter::RateLimiter;
pub use throttle::{RATE_LIMIT_RESET_HEADER, parse_retry_after, throttle_wait};
pub use types::{BookmarksPage, Includes, RelatedEntities, Tweet, User};
