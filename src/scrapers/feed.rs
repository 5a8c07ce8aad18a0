//! RSS 2.0 and Atom 1.0 feed parsing.
//!
//! A feed body is tried as RSS first and as Atom second; both are flattened
//! into [`FeedEntry`] records so the ingestor never sees format differences.
//!
//! # Field Mapping
//!
//! | FeedEntry | RSS | Atom |
//! |-----------|-----|------|
//! | `id` | `<guid>` | `<id>` |
//! | `link` | `<link>` | alternate `<link href>` |
//! | `summary` | `<description>` | `<summary>` else `<content>` |
//! | `author` | `<author>` else `<dc:creator>` | first `<author><name>` |
//! | `published` | `<pubDate>` else `<dc:date>` | `<published>` else `<updated>` |
//! | `media` | `<media:content>`, `<media:group>`, `<enclosure>` | `<media:content>`, `<media:group>` |
//!
//! # Malformed Feeds
//!
//! When the document as a whole is not well-formed, every complete
//! `<item>` (or `<entry>`) element is cut out and parsed on its own inside a
//! minimal envelope that carries the root's namespace declarations. Items
//! that still fail are dropped; the rest are returned with a warning.

use crate::models::{FeedEntry, MediaRef};
use crate::scrapers::http::{Fetch, FetchError};
use chrono::{DateTime, FixedOffset, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

static ITEM_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<item\b[^>]*>").unwrap());
static ENTRY_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<entry\b[^>]*>").unwrap());
static NAMESPACE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"xmlns:([\w.-]+)\s*=\s*("[^"]*"|'[^']*')"#).unwrap());

/// Why a feed produced no entries at all.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not fetch feed: {0}")]
    Fetch(#[from] FetchError),
    /// The body is neither RSS 2.0 nor Atom 1.0.
    #[error("not a valid RSS ({rss}) or Atom ({atom}) document")]
    Parse {
        rss: rss::Error,
        atom: atom_syndication::Error,
    },
}

/// Download `feed_url` and parse it into entries.
///
/// # Errors
///
/// [`FeedError::Fetch`] when the request fails, [`FeedError::Parse`] when the
/// body is not a feed.
#[instrument(level = "info", skip(fetcher, timeout))]
pub async fn fetch_feed<F: Fetch>(
    fetcher: &F,
    feed_url: &str,
    timeout: Duration,
) -> Result<Vec<FeedEntry>, FeedError> {
    let body = fetcher.get_text(feed_url, timeout).await?;
    let entries = parse_feed(&body)?;
    info!(count = entries.len(), "Parsed feed entries");
    Ok(entries)
}

/// Parse a feed document into normalised entries.
///
/// # Arguments
///
/// * `body` - The raw feed document (RSS 2.0 or Atom 1.0)
///
/// # Returns
///
/// The entries in document order. A document that is not well-formed
/// still yields every item that can be read on its own.
///
/// # Errors
///
/// [`FeedError::Parse`] when the body is neither format and no single
/// item or entry could be recovered from it.
pub fn parse_feed(body: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let rss_err = match rss::Channel::read_from(body.as_bytes()) {
        Ok(channel) => {
            debug!(items = channel.items().len(), "Parsed as RSS");
            return Ok(channel.items().iter().map(rss_entry).collect());
        }
        Err(e) => e,
    };

    let atom_err = match atom_syndication::Feed::read_from(body.as_bytes()) {
        Ok(feed) => {
            debug!(entries = feed.entries().len(), "Parsed as Atom");
            return Ok(feed.entries().iter().map(atom_entry).collect());
        }
        Err(e) => e,
    };

    let recovered = recover_entries(body);
    if recovered.is_empty() {
        warn!(rss_error = %rss_err, atom_error = %atom_err, "Feed is not well-formed");
        return Err(FeedError::Parse {
            rss: rss_err,
            atom: atom_err,
        });
    }

    warn!(
        rss_error = %rss_err,
        atom_error = %atom_err,
        recovered = recovered.len(),
        "Feed is not well-formed; continuing with recovered entries"
    );
    Ok(recovered)
}

/// Re-parse each complete item of a broken document in isolation.
fn recover_entries(body: &str) -> Vec<FeedEntry> {
    if let Some(first) = ITEM_OPEN.find(body) {
        let namespaces = namespace_decls(&body[..first.start()]);
        return complete_elements(body, &ITEM_OPEN, "</item>")
            .into_iter()
            .filter_map(|item| {
                let doc = format!(r#"<rss version="2.0" {namespaces}><channel>{item}</channel></rss>"#);
                rss::Channel::read_from(doc.as_bytes())
                    .map_err(|e| debug!(error = %e, "Dropping unreadable item"))
                    .ok()
            })
            .flat_map(|channel| channel.items().iter().map(rss_entry).collect::<Vec<_>>())
            .collect();
    }

    if let Some(first) = ENTRY_OPEN.find(body) {
        let namespaces = namespace_decls(&body[..first.start()]);
        return complete_elements(body, &ENTRY_OPEN, "</entry>")
            .into_iter()
            .filter_map(|entry| {
                let doc = format!(
                    r#"<feed xmlns="http://www.w3.org/2005/Atom" {namespaces}>{entry}</feed>"#
                );
                atom_syndication::Feed::read_from(doc.as_bytes())
                    .map_err(|e| debug!(error = %e, "Dropping unreadable entry"))
                    .ok()
            })
            .flat_map(|feed| feed.entries().iter().map(atom_entry).collect::<Vec<_>>())
            .collect();
    }

    Vec::new()
}

/// Slice out every element opened by `open` and closed by `close`.
///
/// An element cut short by the next opening tag, or by the end of input,
/// is skipped.
fn complete_elements<'a>(body: &'a str, open: &Regex, close: &str) -> Vec<&'a str> {
    let starts: Vec<usize> = open.find_iter(body).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = start + body[start..].find(close)? + close.len();
            match starts.get(i + 1) {
                Some(&next) if next < end => None,
                _ => Some(&body[start..end]),
            }
        })
        .collect()
}

/// Prefixed `xmlns:` declarations found in `prolog`, first one per prefix.
fn namespace_decls(prolog: &str) -> String {
    NAMESPACE_DECL
        .captures_iter(prolog)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(0)?.as_str())))
        .unique_by(|(prefix, _)| *prefix)
        .map(|(_, decl)| decl)
        .join(" ")
}

fn rss_entry(item: &rss::Item) -> FeedEntry {
    let dublin_core = item.dublin_core_ext();

    let author = item.author().map(str::to_string).or_else(|| {
        dublin_core
            .and_then(|dc| dc.creators().first())
            .map(|c| c.to_string())
    });

    let published = item.pub_date().and_then(parse_timestamp).or_else(|| {
        dublin_core
            .and_then(|dc| dc.dates().first())
            .and_then(|d| parse_timestamp(d))
    });

    let mut media = media_from_extensions(item.extensions());
    if let Some(enclosure) = item.enclosure() {
        media.push(MediaRef {
            url: Some(enclosure.url().to_string()),
            content_type: Some(enclosure.mime_type().to_string()),
        });
    }

    FeedEntry {
        id: item.guid().map(|g| g.value().to_string()),
        link: item.link().map(str::to_string),
        title: item.title().map(str::to_string),
        summary: item.description().map(str::to_string),
        description_markup: item.description().map(str::to_string),
        author: author.filter(|a| !a.trim().is_empty()),
        published,
        media,
    }
}

fn atom_entry(entry: &atom_syndication::Entry) -> FeedEntry {
    let link = entry
        .links()
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| entry.links().first())
        .map(|l| l.href().to_string());

    let content = entry.content().and_then(|c| c.value()).map(str::to_string);
    let summary = entry.summary().map(|s| s.value.clone()).or(content);

    let published = entry
        .published()
        .map(to_utc)
        .or_else(|| Some(to_utc(entry.updated())).filter(|dt| dt.timestamp() > 0));

    FeedEntry {
        id: Some(entry.id().to_string()),
        link,
        title: Some(entry.title().value.clone()),
        description_markup: summary.clone(),
        summary,
        author: entry
            .authors()
            .first()
            .map(|p| p.name().to_string())
            .filter(|a| !a.trim().is_empty()),
        published,
        media: media_from_extensions(entry.extensions()),
    }
}

fn to_utc(dt: &DateTime<FixedOffset>) -> DateTime<Utc> {
    dt.with_timezone(&Utc)
}

/// Parse an RFC 2822 (`pubDate`) or RFC 3339 (`dc:date`) timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| debug!(raw, error = %e, "Unparseable feed timestamp"))
        .ok()
}

/// The two feed crates ship structurally identical extension trees.
trait ExtensionNode: Sized {
    fn attr(&self, key: &str) -> Option<&str>;
    fn child_nodes(&self) -> &BTreeMap<String, Vec<Self>>;
}

impl ExtensionNode for rss::extension::Extension {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs().get(key).map(String::as_str)
    }

    fn child_nodes(&self) -> &BTreeMap<String, Vec<Self>> {
        self.children()
    }
}

impl ExtensionNode for atom_syndication::extension::Extension {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs().get(key).map(String::as_str)
    }

    fn child_nodes(&self) -> &BTreeMap<String, Vec<Self>> {
        self.children()
    }
}

/// Collect `<media:content>` elements, both top-level and inside `<media:group>`.
fn media_from_extensions<E: ExtensionNode>(
    extensions: &BTreeMap<String, BTreeMap<String, Vec<E>>>,
) -> Vec<MediaRef> {
    let Some(media_ns) = extensions.get("media") else {
        return Vec::new();
    };

    let direct = media_ns.get("content").into_iter().flatten();
    let grouped = media_ns
        .get("group")
        .into_iter()
        .flatten()
        .filter_map(|g| g.child_nodes().get("media:content").or(g.child_nodes().get("content")))
        .flatten();

    direct
        .chain(grouped)
        .map(|node| MediaRef {
            url: node.attr("url").map(str::to_string),
            content_type: node.attr("type").map(str::to_string),
        })
        .collect()
}
