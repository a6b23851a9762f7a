//! Note titles and file names.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::classify::external_urls;
use crate::api::types::{EntityUrl, Tweet, User};
use crate::storage::NOTE_EXTENSION;

/// Longest title kept, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Longest title kept, in bytes. Leaves room under the common 255-byte file
/// name limit for a collision suffix and the extension.
pub const MAX_TITLE_BYTES: usize = 240;

/// Longest first sentence accepted as a title, in characters.
const MAX_SENTENCE_CHARS: usize = 80;

/// A truncated sentence is cut at the last space only past this point.
const MIN_WORD_BREAK: usize = 40;

/// Card titles must be longer than this.
const MIN_CARD_TITLE_CHARS: usize = 5;

/// Sentence titles must be longer than this.
const MIN_SENTENCE_TITLE_CHARS: usize = 10;

#[allow(clippy::expect_used)]
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[/\\:*?"<>|#^\[\]]"#).expect("unsafe filename regex is valid")
});

#[allow(clippy::expect_used)]
pub(super) static URL_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("URL regex is valid"));

#[allow(clippy::expect_used)]
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("mention regex is valid"));

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Collapses runs of whitespace to one space and trims.
pub(super) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Strips characters that are unsafe in file names, collapses whitespace and
/// caps the result at [`MAX_TITLE_CHARS`] characters and [`MAX_TITLE_BYTES`]
/// bytes, cutting on a character boundary.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let stripped = UNSAFE_FILENAME_CHARS.replace_all(name, "");
    let collapsed = collapse_whitespace(&stripped);
    let mut capped = String::new();
    for c in collapsed.chars().take(MAX_TITLE_CHARS) {
        if capped.len() + c.len_utf8() > MAX_TITLE_BYTES {
            break;
        }
        capped.push(c);
    }
    capped.trim_end().to_string()
}

/// Takes at most `limit` characters, cut back to the last space when that
/// space lies past `min_break`.
pub(super) fn truncate_at_word(text: &str, limit: usize, min_break: usize) -> String {
    let truncated: String = text.chars().take(limit).collect();
    match truncated.rfind(' ') {
        Some(byte_idx) if truncated[..byte_idx].chars().count() > min_break => {
            truncated[..byte_idx].trim().to_string()
        }
        _ => truncated.trim().to_string(),
    }
}

/// First sentence of `text` with URLs and @mentions removed.
#[must_use]
pub fn first_sentence(text: &str) -> String {
    let without_urls = URL_IN_TEXT.replace_all(text, "");
    let without_mentions = MENTION.replace_all(&without_urls, "");
    let cleaned = collapse_whitespace(&without_mentions);

    let sentence_end = cleaned
        .chars()
        .position(|c| matches!(c, '.' | '!' | '?' | '\n'));
    if let Some(end) = sentence_end.filter(|&end| end > 0 && end <= MAX_SENTENCE_CHARS) {
        return cleaned.chars().take(end).collect::<String>().trim().to_string();
    }
    if cleaned.chars().count() <= MAX_SENTENCE_CHARS {
        return cleaned;
    }
    truncate_at_word(&cleaned, MAX_SENTENCE_CHARS, MIN_WORD_BREAK)
}

/// Picks the title for a post.
///
/// In order: the card title of the first external link that has one longer
/// than five characters; the first sentence of the text if longer than ten
/// characters once sanitized; `"{author} tweet {last 6 of id}"`.
#[must_use]
pub fn generate_title(tweet: &Tweet, author: Option<&User>, urls: &[EntityUrl]) -> String {
    let card_title = external_urls(urls)
        .filter_map(|(url, _)| url.title.as_deref().map(str::trim))
        .find(|title| title.chars().count() > MIN_CARD_TITLE_CHARS)
        .map(sanitize_filename)
        .filter(|title| !title.is_empty());
    if let Some(title) = card_title {
        return title;
    }

    let sentence = sanitize_filename(&first_sentence(tweet.full_text()));
    if sentence.chars().count() > MIN_SENTENCE_TITLE_CHARS {
        return sentence;
    }

    let author_name = author
        .map(|user| user.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown");
    sanitize_filename(&format!("{author_name} tweet {}", last_chars(&tweet.id, 6)))
}

fn last_chars(text: &str, count: usize) -> &str {
    let total = text.chars().count();
    let skip = total.saturating_sub(count);
    text.char_indices()
        .nth(skip)
        .map_or("", |(byte_idx, _)| &text[byte_idx..])
}

/// Returns `desired`, or `desired (n)` with the smallest `n >= 2`, such that
/// `{name}.md` is not in `existing`.
#[must_use]
pub fn unique_filename(desired: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(&format!("{desired}.{NOTE_EXTENSION}")) {
        return desired.to_string();
    }
    (2_u32..)
        .map(|n| format!("{desired} ({n})"))
        .find(|candidate| !existing.contains(&format!("{candidate}.{NOTE_EXTENSION}")))
        .unwrap_or_else(|| desired.to_string())
}
