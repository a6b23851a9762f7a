//! Turning a fetched bookmark into a note.
//!
//! [`transform`] is pure: given a post, the page's related entities, the
//! options and the file names already taken, it returns a [`NoteRecord`]
//! with a unique file name. [`render_note`] produces the markdown written to
//! storage.
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//!
//! use bookmark_sync::api::types::{Includes, RelatedEntities, Tweet};
//! use bookmark_sync::transform::{ContentType, TransformOptions, transform};
//! use chrono::NaiveDate;
//!
//! let tweet = Tweet {
//!     id: "1800000000000000001".to_string(),
//!     text: "Hello world. Extra stuff.".to_string(),
//!     ..Tweet::default()
//! };
//! let includes = Includes::default();
//! let options = TransformOptions {
//!     default_tags: vec!["clippings".to_string()],
//!     url_type_detection: true,
//!     created: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
//! };
//!
//! let note = transform(&tweet, &RelatedEntities::from_includes(&includes), &options, &HashSet::new());
//! assert_eq!(note.title, "Hello world");
//! assert_eq!(note.content_type, ContentType::Tweet);
//! assert_eq!(note.link, note.source);
//! ```

mod body;
mod classify;
mod markdown;
mod title;

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::api::types::{EntityUrl, RelatedEntities, Tweet};
use crate::state::Settings;
use crate::storage::NOTE_EXTENSION;

pub use body::{expand_urls, format_body, permalink};
pub use classify::{Classification, ContentType, classify, is_platform_url};
pub use markdown::{escape_yaml, render_note};
pub use title::{first_sentence, generate_title, sanitize_filename, unique_filename};

/// Longest description kept, in characters.
const MAX_DESCRIPTION_CHARS: usize = 200;

/// A truncated description is cut at the last space only past this point.
const MIN_DESCRIPTION_BREAK: usize = 100;

/// Inputs to [`transform`] that come from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    pub default_tags: Vec<String>,
    pub url_type_detection: bool,
    /// Date written to the `created` field.
    pub created: NaiveDate,
}

impl TransformOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings, created: NaiveDate) -> Self {
        Self {
            default_tags: settings.default_tags.clone(),
            url_type_detection: settings.url_type_detection,
            created,
        }
    }
}

/// Everything needed to write one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    /// Id of the bookmarked post.
    pub item_id: String,
    pub title: String,
    /// File name without extension, unique among existing notes.
    pub filename: String,
    pub content_type: ContentType,
    /// Permalink of the post.
    pub source: String,
    /// The external link the post shares, or [`source`](Self::source).
    pub link: String,
    pub authors: Vec<String>,
    /// `YYYY-MM-DD` the post was published.
    pub published_date: Option<String>,
    /// `YYYY-MM-DD` the note was created.
    pub created: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: Vec<String>,
    pub related_to: String,
    pub body: String,
}

impl NoteRecord {
    /// File name with extension.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{NOTE_EXTENSION}", self.filename)
    }
}

/// URLs from the extended and regular text, de-duplicated by expanded URL,
/// first occurrence first.
#[must_use]
pub fn collect_urls(tweet: &Tweet) -> Vec<EntityUrl> {
    let extended = tweet
        .note_tweet
        .as_ref()
        .and_then(|note| note.entities.as_ref())
        .map(|entities| entities.urls.as_slice())
        .unwrap_or_default();
    let regular = tweet
        .entities
        .as_ref()
        .map(|entities| entities.urls.as_slice())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    extended
        .iter()
        .chain(regular)
        .filter(|url| seen.insert(url.dedup_key().to_string()))
        .cloned()
        .collect()
}

/// Post text without URLs, whitespace collapsed, capped at 200 characters.
#[must_use]
pub fn description(tweet: &Tweet) -> String {
    let without_urls = title::URL_IN_TEXT.replace_all(tweet.full_text(), "");
    let cleaned = title::collapse_whitespace(&without_urls);
    if cleaned.chars().count() <= MAX_DESCRIPTION_CHARS {
        return cleaned;
    }
    title::truncate_at_word(&cleaned, MAX_DESCRIPTION_CHARS, MIN_DESCRIPTION_BREAK)
}

/// Default tags followed by the post's hashtags, without duplicates.
#[must_use]
pub fn tags(tweet: &Tweet, default_tags: &[String]) -> Vec<String> {
    let hashtags = tweet
        .active_entities()
        .map(|entities| entities.hashtags.as_slice())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    default_tags
        .iter()
        .map(|tag| tag.trim())
        .chain(hashtags.iter().map(|hashtag| hashtag.tag.as_str()))
        .filter(|tag| !tag.is_empty() && seen.insert(*tag))
        .map(str::to_string)
        .collect()
}

/// Builds the note for `tweet`.
///
/// `existing` holds the file names (with extension) already present in the
/// target folder; the caller adds [`NoteRecord::file_name`] to it before
/// transforming the next post.
#[must_use]
pub fn transform(
    tweet: &Tweet,
    related: &RelatedEntities<'_>,
    options: &TransformOptions,
    existing: &HashSet<String>,
) -> NoteRecord {
    let author = related.author_of(tweet);
    let urls = collect_urls(tweet);
    let classification = classify(&urls, options.url_type_detection);

    let username = author
        .map(|a| a.username.as_str())
        .filter(|u| !u.is_empty())
        .unwrap_or("i");
    let source = permalink(username, &tweet.id);
    let link = classification.link.unwrap_or_else(|| source.clone());

    let title = generate_title(tweet, author, &urls);
    let filename = unique_filename(&title, existing);

    NoteRecord {
        item_id: tweet.id.clone(),
        title,
        filename,
        content_type: classification.content_type,
        source,
        link,
        authors: author.map(|a| vec![a.name.clone()]).unwrap_or_default(),
        published_date: body::date_prefix(tweet.created_at.as_deref()).map(str::to_string),
        created: options.created.format("%Y-%m-%d").to_string(),
        description: description(tweet),
        tags: tags(tweet, &options.default_tags),
        category: Vec::new(),
        related_to: String::new(),
        body: format_body(tweet, related),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::{Entities, EntityHashtag, Includes, NoteTweet, User};

    fn options() -> TransformOptions {
        TransformOptions {
            default_tags: vec!["clippings".to_string(), " reading ".to_string()],
            url_type_detection: true,
            created: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        }
    }

    fn url(short: &str, expanded: &str) -> EntityUrl {
        EntityUrl {
            url: short.to_string(),
            expanded_url: Some(expanded.to_string()),
            ..EntityUrl::default()
        }
    }

    fn hashtag(tag: &str) -> EntityHashtag {
        EntityHashtag {
            start: 0,
            end: 0,
            tag: tag.to_string(),
        }
    }

    // ==================== collect_urls Tests ====================

    #[test]
    fn test_collect_urls_dedups_across_variants() {
        let tweet = Tweet {
            id: "1".to_string(),
            entities: Some(Entities {
                urls: vec![url("https://t.co/a", "https://a.example"), url("https://t.co/c", "https://c.example")],
                ..Entities::default()
            }),
            note_tweet: Some(NoteTweet {
                text: "long".to_string(),
                entities: Some(Entities {
                    urls: vec![url("https://t.co/b", "https://b.example"), url("https://t.co/a2", "https://a.example")],
                    ..Entities::default()
                }),
            }),
            ..Tweet::default()
        };

        let expanded: Vec<String> = collect_urls(&tweet)
            .iter()
            .map(|u| u.expanded().to_string())
            .collect();
        assert_eq!(
            expanded,
            vec!["https://b.example", "https://a.example", "https://c.example"]
        );
    }

    // ==================== description Tests ====================

    #[test]
    fn test_description_strips_urls_and_collapses() {
        let tweet = Tweet {
            id: "1".to_string(),
            text: "Read   this\nhttps://t.co/x  now".to_string(),
            ..Tweet::default()
        };
        assert_eq!(description(&tweet), "Read this now");
    }

    #[test]
    fn test_description_truncates_at_word_boundary() {
        let tweet = Tweet {
            id: "1".to_string(),
            text: "lorem ipsum ".repeat(30),
            ..Tweet::default()
        };
        let result = description(&tweet);
        assert!(result.chars().count() <= 200);
        assert!(result.ends_with("ipsum") || result.ends_with("lorem"));
        assert!(!result.ends_with(' '));
    }

    // ==================== tags Tests ====================

    #[test]
    fn test_tags_merge_defaults_and_hashtags() {
        let tweet = Tweet {
            id: "1".to_string(),
            entities: Some(Entities {
                hashtags: vec![hashtag("rust"), hashtag("clippings"), hashtag("rust")],
                ..Entities::default()
            }),
            ..Tweet::default()
        };
        assert_eq!(
            tags(&tweet, &options().default_tags),
            vec!["clippings", "reading", "rust"]
        );
    }

    // ==================== transform Tests ====================

    #[test]
    fn test_transform_link_post() {
        let tweet = Tweet {
            id: "1800000000000000001".to_string(),
            text: "New release https://t.co/gh #rust".to_string(),
            author_id: Some("7".to_string()),
            created_at: Some("2024-05-01T12:00:00.000Z".to_string()),
            entities: Some(Entities {
                urls: vec![EntityUrl {
                    start: 12,
                    end: 27,
                    ..url("https://t.co/gh", "https://github.com/rust-lang/rust")
                }],
                hashtags: vec![hashtag("rust")],
                ..Entities::default()
            }),
            ..Tweet::default()
        };
        let includes = Includes {
            users: vec![User {
                id: "7".to_string(),
                name: "Ada".to_string(),
                username: "ada".to_string(),
                profile_image_url: None,
            }],
            ..Includes::default()
        };
        let related = RelatedEntities::from_includes(&includes);

        let note = transform(&tweet, &related, &options(), &HashSet::new());

        assert_eq!(note.item_id, "1800000000000000001");
        assert_eq!(note.content_type, ContentType::Code);
        assert_eq!(note.link, "https://github.com/rust-lang/rust");
        assert_eq!(note.source, "https://x.com/ada/status/1800000000000000001");
        assert_eq!(note.authors, vec!["Ada"]);
        assert_eq!(note.published_date.as_deref(), Some("2024-05-01"));
        assert_eq!(note.created, "2025-01-15");
        assert_eq!(note.title, "New release rust");
        assert_eq!(note.filename, "New release rust");
        assert_eq!(note.tags, vec!["clippings", "reading", "rust"]);
        assert!(note.body.contains("New release https://github.com/rust-lang/rust #rust"));
        assert_eq!(note.file_name(), "New release rust.md");
    }

    #[test]
    fn test_transform_plain_post_without_author() {
        let tweet = Tweet {
            id: "99".to_string(),
            text: "Hello world. Extra stuff.".to_string(),
            ..Tweet::default()
        };
        let includes = Includes::default();
        let note = transform(
            &tweet,
            &RelatedEntities::from_includes(&includes),
            &options(),
            &HashSet::from(["Hello world.md".to_string()]),
        );

        assert_eq!(note.content_type, ContentType::Tweet);
        assert_eq!(note.source, "https://x.com/i/status/99");
        assert_eq!(note.link, note.source);
        assert!(note.authors.is_empty());
        assert_eq!(note.published_date, None);
        assert_eq!(note.title, "Hello world");
        assert_eq!(note.filename, "Hello world (2)");
    }

    #[test]
    fn test_transform_detection_disabled_keeps_tweet_type() {
        let tweet = Tweet {
            id: "5".to_string(),
            text: "Watch this video right now https://t.co/v".to_string(),
            entities: Some(Entities {
                urls: vec![url("https://t.co/v", "https://youtu.be/abc")],
                ..Entities::default()
            }),
            ..Tweet::default()
        };
        let includes = Includes::default();
        let mut opts = options();
        opts.url_type_detection = false;

        let note = transform(&tweet, &RelatedEntities::from_includes(&includes), &opts, &HashSet::new());
        assert_eq!(note.content_type, ContentType::Tweet);
        assert_eq!(note.link, note.source);
    }
}
