//! Interpreting provider throttling responses.
//!
//! A 429 from the bookmarks endpoint carries `x-rate-limit-reset`, the epoch
//! second at which the window resets. Some proxies strip it and send a
//! standard `Retry-After` instead, which is honored as a fallback.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{debug, instrument, warn};

/// Provider header carrying the reset time in epoch seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Margin added after the advertised reset before retrying.
pub const RESET_MARGIN: Duration = Duration::from_secs(1);

/// Maximum Retry-After value honored (1 hour).
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Computes how long to wait before retrying a throttled request.
///
/// Returns `None` when no reset time can be determined or when the reset has
/// already passed, in which case the caller should give up.
#[must_use]
pub fn throttle_wait(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    if let Some(reset) = headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        return wait_until_reset(reset, now);
    }

    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| parse_retry_after(value, now))
        .filter(|wait| !wait.is_zero())
}

/// Wait until `reset_epoch_secs` plus [`RESET_MARGIN`].
fn wait_until_reset(reset_epoch_secs: &str, now: SystemTime) -> Option<Duration> {
    let Ok(seconds) = reset_epoch_secs.trim().parse::<u64>() else {
        debug!(value = reset_epoch_secs, "unparseable rate limit reset header");
        return None;
    };
    let resume_at = UNIX_EPOCH + Duration::from_secs(seconds) + RESET_MARGIN;
    match resume_at.duration_since(now) {
        Ok(wait) if !wait.is_zero() => Some(wait),
        _ => {
            debug!(reset = seconds, "rate limit reset already passed");
            None
        }
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports integer seconds and HTTP-date (RFC 7231). Dates in the past yield
/// zero; excessive values are capped at 1 hour.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
/// use bookmark_sync::api::parse_retry_after;
///
/// let now = SystemTime::now();
/// assert_eq!(parse_retry_after("120", now), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("invalid", now), None);
/// ```
#[must_use]
#[instrument(level = "debug", skip(now))]
pub fn parse_retry_after(header_value: &str, now: SystemTime) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        let Ok(seconds) = u64::try_from(seconds) else {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        };
        let duration = Duration::from_secs(seconds);
        if duration > MAX_RETRY_AFTER {
            warn!(seconds, "Retry-After exceeds maximum, capping at 1 hour");
            return Some(MAX_RETRY_AFTER);
        }
        return Some(duration);
    }

    let Ok(datetime) = httpdate::parse_http_date(header_value) else {
        debug!(header_value, "unparseable Retry-After value");
        return None;
    };
    match datetime.duration_since(now) {
        Ok(duration) if duration > MAX_RETRY_AFTER => Some(MAX_RETRY_AFTER),
        Ok(duration) => Some(duration),
        Err(_) => Some(Duration::ZERO),
    }
}
