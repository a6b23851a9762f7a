//! Content classification by linked URL.
//!
//! A bookmark that links out is classified by its first external URL that
//! matches a known host (video, podcast, code, newsletter, article) or an
//! article-like path. Links back to the platform itself are ignored.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::types::EntityUrl;

/// Classified note type, written to the `type` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Tweet,
    Video,
    Podcast,
    Code,
    Newsletter,
    Article,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tweet => "tweet",
            Self::Video => "video",
            Self::Podcast => "podcast",
            Self::Code => "code",
            Self::Newsletter => "newsletter",
            Self::Article => "article",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub content_type: ContentType,
    /// The external URL that decided the type; `None` for plain posts.
    pub link: Option<String>,
}

impl Classification {
    fn tweet() -> Self {
        Self {
            content_type: ContentType::Tweet,
            link: None,
        }
    }
}

/// Host rules, checked in order; the first match wins.
const HOST_RULES: &[(&str, ContentType)] = &[
    (r"youtube\.com|youtu\.be", ContentType::Video),
    (r"vimeo\.com", ContentType::Video),
    (r"twitch\.tv", ContentType::Video),
    (r"loom\.com", ContentType::Video),
    (r"open\.spotify\.com/episode", ContentType::Podcast),
    (r"podcasts\.apple\.com", ContentType::Podcast),
    (r"overcast\.fm", ContentType::Podcast),
    (r"github\.com", ContentType::Code),
    (r"gitlab\.com", ContentType::Code),
    (r"codepen\.io", ContentType::Code),
    (r"replit\.com", ContentType::Code),
    (r"npmjs\.com", ContentType::Code),
    (r"substack\.com", ContentType::Newsletter),
    (r"beehiiv\.com", ContentType::Newsletter),
    (r"buttondown\.email", ContentType::Newsletter),
    (r"medium\.com", ContentType::Article),
    (r"dev\.to", ContentType::Article),
    (r"techcrunch\.com", ContentType::Article),
    (r"theverge\.com", ContentType::Article),
    (r"arxiv\.org", ContentType::Article),
    (r"reddit\.com", ContentType::Article),
    (r"hackernews|news\.ycombinator", ContentType::Article),
    (r"wikipedia\.org", ContentType::Article),
];

#[allow(clippy::expect_used)]
static HOST_PATTERNS: LazyLock<Vec<(Regex, ContentType)>> = LazyLock::new(|| {
    HOST_RULES
        .iter()
        .map(|(pattern, kind)| {
            let regex = Regex::new(&format!("(?i){pattern}")).expect("host rule regex is valid");
            (regex, *kind)
        })
        .collect()
});

#[allow(clippy::expect_used)]
static ARTICLE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(?:blog|post|posts|article|articles|news|engineering|research)/")
        .expect("article path regex is valid")
});

#[allow(clippy::expect_used)]
static PLATFORM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.)?(?:x\.com|twitter\.com)(?:[/:?#]|$)")
        .expect("platform URL regex is valid")
});

/// True if `url` points back to the platform itself.
#[must_use]
pub fn is_platform_url(url: &str) -> bool {
    PLATFORM_URL.is_match(url)
}

/// URLs with a resolved target outside the platform, in input order.
pub fn external_urls(urls: &[EntityUrl]) -> impl Iterator<Item = (&EntityUrl, &str)> {
    urls.iter().filter_map(|url| {
        url.resolved()
            .filter(|resolved| !is_platform_url(resolved))
            .map(|resolved| (url, resolved))
    })
}

fn match_rules(resolved: &str) -> Option<ContentType> {
    HOST_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(resolved))
        .map(|(_, kind)| *kind)
        .or_else(|| ARTICLE_PATH.is_match(resolved).then_some(ContentType::Article))
}

/// Classifies a post by the URLs it links to.
///
/// With detection disabled, or no external URL, the post is a plain
/// [`ContentType::Tweet`] with no link. Otherwise the first external URL
/// matching a rule decides; if none matches the first external URL is taken
/// as an [`ContentType::Article`].
#[must_use]
pub fn classify(urls: &[EntityUrl], detection_enabled: bool) -> Classification {
    if !detection_enabled {
        return Classification::tweet();
    }

    let mut first_external = None;
    for (_, resolved) in external_urls(urls) {
        if let Some(content_type) = match_rules(resolved) {
            return Classification {
                content_type,
                link: Some(resolved.to_string()),
            };
        }
        first_external.get_or_insert(resolved);
    }

    first_external.map_or_else(Classification::tweet, |resolved| Classification {
        content_type: ContentType::Article,
        link: Some(resolved.to_string()),
    })
}
