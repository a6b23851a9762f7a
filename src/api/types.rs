//! Wire types for the bookmarks API.
//!
//! These mirror the provider's v2 JSON payloads. Every optional field carries
//! `#[serde(default)]` so that sparse responses (missing `includes`, missing
//! entity arrays) still decode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A shortened URL occurring in a post's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityUrl {
    /// Start offset in the text, in characters.
    #[serde(default)]
    pub start: usize,
    /// End offset in the text, in characters.
    #[serde(default)]
    pub end: usize,
    /// The shortened URL as it appears in the text.
    pub url: String,
    #[serde(default)]
    pub expanded_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    /// Card title supplied by the provider for the target page.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Final URL after following redirects.
    #[serde(default)]
    pub unwound_url: Option<String>,
}

impl EntityUrl {
    /// The best URL to classify against: unwound, then expanded.
    #[must_use]
    pub fn resolved(&self) -> Option<&str> {
        non_empty(self.unwound_url.as_deref()).or_else(|| non_empty(self.expanded_url.as_deref()))
    }

    /// The replacement used when rewriting the post text.
    #[must_use]
    pub fn expanded(&self) -> &str {
        non_empty(self.expanded_url.as_deref())
            .or_else(|| non_empty(self.display_url.as_deref()))
            .unwrap_or(&self.url)
    }

    /// Key used to de-duplicate URLs across text variants.
    #[must_use]
    pub fn dedup_key(&self) -> &str {
        non_empty(self.expanded_url.as_deref()).unwrap_or(&self.url)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityMention {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    pub username: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityHashtag {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    pub tag: String,
}

/// Entities attached to a text variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<EntityUrl>,
    #[serde(default)]
    pub mentions: Vec<EntityMention>,
    #[serde(default)]
    pub hashtags: Vec<EntityHashtag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attachments {
    #[serde(default)]
    pub media_keys: Vec<String>,
}

/// Extended ("long form") text variant of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoteTweet {
    pub text: String,
    #[serde(default)]
    pub entities: Option<Entities>,
}

/// How one post references another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Retweeted,
    Quoted,
    RepliedTo,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReferencedTweet {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub id: String,
}

/// One bookmarked post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    /// RFC 3339 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub entities: Option<Entities>,
    #[serde(default)]
    pub attachments: Option<Attachments>,
    #[serde(default)]
    pub note_tweet: Option<NoteTweet>,
    #[serde(default)]
    pub referenced_tweets: Vec<ReferencedTweet>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl Tweet {
    /// The extended text when present, otherwise the regular text.
    #[must_use]
    pub fn full_text(&self) -> &str {
        match &self.note_tweet {
            Some(note) if !note.text.is_empty() => &note.text,
            _ => &self.text,
        }
    }

    /// The entity set matching [`full_text`](Self::full_text).
    #[must_use]
    pub fn active_entities(&self) -> Option<&Entities> {
        self.note_tweet
            .as_ref()
            .and_then(|note| note.entities.as_ref())
            .or(self.entities.as_ref())
    }

    /// Media keys attached to this post.
    #[must_use]
    pub fn media_keys(&self) -> &[String] {
        self.attachments
            .as_ref()
            .map(|attachments| attachments.media_keys.as_slice())
            .unwrap_or_default()
    }

    /// Ids of posts this one quotes.
    pub fn quoted_ids(&self) -> impl Iterator<Item = &str> {
        self.referenced_tweets
            .iter()
            .filter(|reference| reference.kind == ReferenceKind::Quoted)
            .map(|reference| reference.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Media {
    pub media_key: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview_image_url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// Objects expanded alongside a page of posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub tweets: Vec<Tweet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageMeta {
    #[serde(default)]
    pub result_count: Option<u32>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub previous_token: Option<String>,
}

/// Partial error reported inside an otherwise successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiProblem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// One page of the bookmarks endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookmarksPage {
    #[serde(default)]
    pub data: Vec<Tweet>,
    #[serde(default)]
    pub includes: Includes,
    #[serde(default)]
    pub meta: PageMeta,
    #[serde(default)]
    pub errors: Vec<ApiProblem>,
}

impl BookmarksPage {
    /// Continuation cursor for the next page, if any.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.meta.next_token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Response of the current-user endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserMeResponse {
    pub data: User,
}

/// Keyed lookup over a page's [`Includes`].
#[derive(Debug, Default)]
pub struct RelatedEntities<'a> {
    users: HashMap<&'a str, &'a User>,
    media: HashMap<&'a str, &'a Media>,
    tweets: HashMap<&'a str, &'a Tweet>,
}

impl<'a> RelatedEntities<'a> {
    /// Indexes the expansions of one page.
    #[must_use]
    pub fn from_includes(includes: &'a Includes) -> Self {
        Self {
            users: includes.users.iter().map(|u| (u.id.as_str(), u)).collect(),
            media: includes
                .media
                .iter()
                .map(|m| (m.media_key.as_str(), m))
                .collect(),
            tweets: includes.tweets.iter().map(|t| (t.id.as_str(), t)).collect(),
        }
    }

    #[must_use]
    pub fn user(&self, id: &str) -> Option<&'a User> {
        self.users.get(id).copied()
    }

    /// The author of `tweet`, if it was expanded.
    #[must_use]
    pub fn author_of(&self, tweet: &Tweet) -> Option<&'a User> {
        tweet.author_id.as_deref().and_then(|id| self.user(id))
    }

    /// Media attached to `tweet`, in attachment order; unknown keys are skipped.
    #[must_use]
    pub fn media_of(&self, tweet: &Tweet) -> Vec<&'a Media> {
        tweet
            .media_keys()
            .iter()
            .filter_map(|key| self.media.get(key.as_str()).copied())
            .collect()
    }

    #[must_use]
    pub fn tweet(&self, id: &str) -> Option<&'a Tweet> {
        self.tweets.get(id).copied()
    }
}
