//! Post records as produced by a source and as kept in a result batch

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// Marker that replaces post content when content output is disabled
pub const REDACTION_MARKER: &str = "#####";

/// A post as yielded by a [`PostSource`](crate::source::PostSource).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPost {
    pub url: String,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
}

impl RawPost {
    pub fn new(url: impl Into<String>, timestamp: DateTime<Utc>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp,
            content: content.into(),
        }
    }

    /// Calendar date of the post (UTC)
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// An accepted post. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    post_id: String,
    post_url: String,
    timestamp: DateTime<Utc>,
    content: String,
}

impl PostRecord {
    /// Build a record from a raw post, redacting content unless `verbose`.
    pub fn from_raw(raw: RawPost, verbose: bool) -> Self {
        let content = if verbose {
            raw.content
        } else {
            REDACTION_MARKER.to_string()
        };
        Self {
            post_id: post_id_from_url(&raw.url).to_string(),
            post_url: raw.url,
            timestamp: raw.timestamp,
            content,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn post_url(&self) -> &str {
        &self.post_url
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Trailing path segment of a post URL ("https://t.me/durov/142" -> "142").
///
/// Query string and fragment are ignored. A URL with a trailing slash yields
/// the last non-empty segment.
pub fn post_id_from_url(url: &str) -> &str {
    let path = url.split(&['?', '#'][..]).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
