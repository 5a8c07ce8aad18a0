//! Data models for feed entries and the persisted article collection.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FeedEntry`]: One syndicated item normalised from RSS or Atom
//! - [`MediaRef`]: A media attachment declared by the feed
//! - [`Article`]: The translated, persisted record written to `news.json`
//!
//! Field names of [`Article`] are part of the on-disk format read by the
//! site's front-end (`data/news.json`), so they must not be renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel stored when a feed entry names no author.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Title used when a feed entry has none.
pub const DEFAULT_TITLE: &str = "No Title";

/// Link used when a feed entry has none. Never fetched.
pub const DEFAULT_LINK: &str = "#";

/// A media attachment declared in structured feed metadata
/// (`<media:content>`, `<enclosure>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRef {
    /// The declared URL, if any.
    pub url: Option<String>,
    /// The declared MIME type (e.g. `image/jpeg`), if any.
    pub content_type: Option<String>,
}

impl MediaRef {
    /// Return the URL when this attachment is declared as an image.
    pub fn image_url(&self) -> Option<&str> {
        let is_image = self
            .content_type
            .as_deref()
            .is_some_and(|t| t.trim().to_ascii_lowercase().starts_with("image/"));
        if !is_image {
            return None;
        }
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// One syndicated item, normalised from either RSS 2.0 or Atom 1.0.
///
/// All text fields are optional because feeds routinely omit them; the
/// ingestor applies the defaults when turning an entry into an [`Article`].
#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    /// Feed-supplied identifier (`<guid>` / `<id>`).
    pub id: Option<String>,
    /// Canonical link to the article page.
    pub link: Option<String>,
    pub title: Option<String>,
    /// Plain summary as published by the feed.
    pub summary: Option<String>,
    /// Raw description markup, scanned for a fallback `<img>`.
    pub description_markup: Option<String>,
    pub author: Option<String>,
    /// Structured publish time, already normalised to UTC.
    pub published: Option<DateTime<Utc>>,
    /// Media attachments in document order.
    pub media: Vec<MediaRef>,
}

impl FeedEntry {
    /// The deduplication key: the entry identifier, else the entry link.
    ///
    /// Blank values count as absent. Returns `None` when neither is present.
    pub fn article_id(&self) -> Option<&str> {
        non_blank(self.id.as_deref()).or_else(|| non_blank(self.link.as_deref()))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// A fully ingested, translated news article.
///
/// This is the only persisted entity. Once written it is never mutated:
/// later runs skip any entry whose `id` is already stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Unique identifier across the whole stored collection.
    pub id: String,
    /// Translated title.
    pub title: String,
    /// Translated summary.
    pub summary: String,
    /// Translated full text (extracted article body, or the summary).
    pub content: String,
    /// ISO-8601 UTC timestamp, e.g. `2025-05-06T14:30:00Z`.
    pub date: String,
    pub author: String,
    /// Image URL shown on the news card.
    pub image: String,
    /// Canonical link to the original article.
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        Article {
            id: "https://example.com/a".to_string(),
            title: "Tajuk".to_string(),
            summary: "Ringkasan".to_string(),
            content: "<p>Kandungan</p>".to_string(),
            date: "2025-05-06T14:30:00Z".to_string(),
            author: "Satoshi".to_string(),
            image: "https://example.com/a.jpg".to_string(),
            source_url: "https://example.com/a".to_string(),
        }
    }

    #[test]
    fn test_article_serialization_field_names() {
        let json = serde_json::to_string(&sample_article()).unwrap();
        for key in [
            "\"id\"",
            "\"title\"",
            "\"summary\"",
            "\"content\"",
            "\"date\"",
            "\"author\"",
            "\"image\"",
            "\"source_url\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn test_article_deserialization() {
        let json = r#"{
            "id": "abc",
            "title": "t",
            "summary": "s",
            "content": "c",
            "date": "2025-01-01T00:00:00Z",
            "author": "Unknown",
            "image": "https://img",
            "source_url": "https://example.com"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.id, "abc");
        assert_eq!(article.author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_article_id_prefers_entry_id() {
        let entry = FeedEntry {
            id: Some("guid-1".to_string()),
            link: Some("https://example.com/1".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.article_id(), Some("guid-1"));
    }

    #[test]
    fn test_article_id_falls_back_to_link() {
        let entry = FeedEntry {
            id: Some("   ".to_string()),
            link: Some("https://example.com/1".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.article_id(), Some("https://example.com/1"));
    }

    #[test]
    fn test_article_id_absent() {
        assert_eq!(FeedEntry::default().article_id(), None);
    }

    #[test]
    fn test_media_image_url() {
        let image = MediaRef {
            url: Some("https://example.com/a.png".to_string()),
            content_type: Some("image/png".to_string()),
        };
        let video = MediaRef {
            url: Some("https://example.com/a.mp4".to_string()),
            content_type: Some("video/mp4".to_string()),
        };
        let untyped = MediaRef {
            url: Some("https://example.com/a.png".to_string()),
            content_type: None,
        };
        let no_url = MediaRef {
            url: None,
            content_type: Some("image/png".to_string()),
        };
        assert_eq!(image.image_url(), Some("https://example.com/a.png"));
        assert_eq!(video.image_url(), None);
        assert_eq!(untyped.image_url(), None);
        assert_eq!(no_url.image_url(), None);
    }
}
