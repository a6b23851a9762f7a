//! Note body: author line, expanded text, media embeds and the quoted post.

use std::ops::Range;

use crate::api::types::{EntityUrl, Media, MediaKind, RelatedEntities, Tweet, User};

/// Permalink of a post.
#[must_use]
pub fn permalink(username: &str, id: &str) -> String {
    format!("https://x.com/{username}/status/{id}")
}

/// `YYYY-MM-DD` prefix of an RFC 3339 timestamp.
pub(super) fn date_prefix(timestamp: Option<&str>) -> Option<&str> {
    timestamp.and_then(|ts| ts.get(..10))
}

/// Renders the note body for `tweet`.
///
/// A quoted post found in `related` is appended as a block quote; quotes of
/// the quoted post are not followed.
#[must_use]
pub fn format_body(tweet: &Tweet, related: &RelatedEntities<'_>) -> String {
    let mut body = format_single(tweet, related.author_of(tweet), &related.media_of(tweet));

    for quoted_id in tweet.quoted_ids() {
        let Some(quoted) = related.tweet(quoted_id) else {
            continue;
        };
        let quoted_body =
            format_single(quoted, related.author_of(quoted), &related.media_of(quoted));
        body.push_str("\n\n");
        body.push_str(&block_quote(&quoted_body));
    }
    body
}

fn format_single(tweet: &Tweet, author: Option<&User>, media: &[&Media]) -> String {
    let name = author
        .map(|a| a.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown");
    let username = author
        .map(|a| a.username.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("unknown");
    let date = date_prefix(tweet.created_at.as_deref()).unwrap_or_default();

    let urls = tweet
        .active_entities()
        .map(|entities| entities.urls.as_slice())
        .unwrap_or_default();
    let text = expand_urls(tweet.full_text(), urls);

    let mut lines = vec![
        format!(
            "**{name}** @{username} [{date}]({})",
            permalink(username, &tweet.id)
        ),
        String::new(),
        text,
    ];

    let embeds = media_embeds(media);
    if !embeds.is_empty() {
        lines.push(String::new());
        lines.push(embeds);
    }
    lines.join("\n")
}

fn block_quote(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces each shortened URL in `text` with its expanded form.
///
/// Entities are applied from the highest start offset down so earlier offsets
/// stay valid. When an entity's offsets do not point at its URL the first
/// occurrence of the URL is replaced instead.
#[must_use]
pub fn expand_urls(text: &str, urls: &[EntityUrl]) -> String {
    let mut ordered: Vec<&EntityUrl> = urls.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = text.to_string();
    for entity in ordered {
        if entity.url.is_empty() {
            continue;
        }
        let expanded = entity.expanded();
        match char_range_to_bytes(&result, entity.start, entity.end) {
            Some(range) if result[range.clone()] == entity.url => {
                result.replace_range(range, expanded);
            }
            _ => result = result.replacen(&entity.url, expanded, 1),
        }
    }
    result
}

fn char_range_to_bytes(text: &str, start: usize, end: usize) -> Option<Range<usize>> {
    if start >= end {
        return None;
    }
    let mut boundaries = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()));
    let start_byte = boundaries.nth(start)?;
    let end_byte = boundaries.nth(end - start - 1)?;
    Some(start_byte..end_byte)
}

fn media_embeds(media: &[&Media]) -> String {
    media
        .iter()
        .filter_map(|m| match m.kind {
            MediaKind::Photo => m.url.as_deref().map(|url| format!("![Image]({url})")),
            MediaKind::Video | MediaKind::AnimatedGif => m
                .preview_image_url
                .as_deref()
                .map(|url| format!("![Video thumbnail]({url})")),
            MediaKind::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
