//! Feed ingestion: feed entries in, translated [`Article`]s out.
//!
//! Feeds are processed one after another and entries one after another.
//! A feed that cannot be fetched or parsed is logged and skipped; an entry
//! is either emitted with every field populated (using fallbacks) or not at
//! all.
//!
//! # Per-entry Steps
//!
//! 1. Compute the article id (entry id, else link); skip when absent or known
//! 2. Apply defaults for title, summary, link, author and date
//! 3. Resolve the image (media metadata, description `<img>`, fixed fallback)
//! 4. Resolve the full content (article page, else summary)
//! 5. Translate title, summary and content independently
//! 6. Record the id so later entries and feeds cannot duplicate it

use crate::api::TranslationBackend;
use crate::models::{Article, DEFAULT_LINK, DEFAULT_TITLE, FeedEntry, UNKNOWN_AUTHOR};
use crate::scrapers::article::resolve_full_content;
use crate::scrapers::feed::fetch_feed;
use crate::scrapers::http::Fetch;
use crate::translate::Translator;
use crate::utils::{Clock, resolve_url, to_iso8601};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// First `<img ... src="...">` in description markup.
static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["']"#).unwrap());

/// Knobs that shape every produced article.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Language passed to the translator, e.g. `Malay`.
    pub target_language: String,
    /// Image used when an entry declares none.
    pub fallback_image: String,
    pub feed_timeout: Duration,
    pub article_timeout: Duration,
}

/// Per-feed counters, logged when a feed is done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub seen: usize,
    pub missing_id: usize,
    pub duplicate: usize,
    pub emitted: usize,
}

/// Turns feeds into articles using the injected network, translator and clock.
pub struct Ingestor<'a, F, B, C> {
    pub fetcher: &'a F,
    pub translator: &'a Translator<B>,
    pub clock: &'a C,
    pub options: &'a IngestOptions,
}

impl<'a, F, B, C> Ingestor<'a, F, B, C>
where
    F: Fetch,
    B: TranslationBackend,
    C: Clock,
{
    /// Ingest every feed in order.
    ///
    /// # Arguments
    ///
    /// * `feed_urls` - Feeds to fetch, processed one at a time
    /// * `existing_ids` - Ids already stored; every emitted article's id is added
    ///
    /// # Returns
    ///
    /// The new articles in feed order. Per-feed failures are logged and never
    /// abort the remaining feeds.
    #[instrument(level = "info", skip_all, fields(feeds = feed_urls.len()))]
    pub async fn ingest(
        &self,
        feed_urls: &[String],
        existing_ids: &mut HashSet<String>,
    ) -> Vec<Article> {
        let mut articles = Vec::new();

        for feed_url in feed_urls {
            info!(%feed_url, "Fetching news feed");
            match fetch_feed(self.fetcher, feed_url, self.options.feed_timeout).await {
                Ok(entries) => {
                    let stats = self
                        .ingest_entries(entries, existing_ids, &mut articles)
                        .await;
                    info!(
                        %feed_url,
                        seen = stats.seen,
                        emitted = stats.emitted,
                        duplicate = stats.duplicate,
                        missing_id = stats.missing_id,
                        "Feed processed"
                    );
                }
                Err(e) => {
                    error!(%feed_url, error = %e, "Error fetching or processing feed; skipping");
                }
            }
        }

        info!(count = articles.len(), "Ingested new articles");
        articles
    }

    /// Turn already-parsed entries into articles, appending to `out`.
    pub async fn ingest_entries(
        &self,
        entries: Vec<FeedEntry>,
        existing_ids: &mut HashSet<String>,
        out: &mut Vec<Article>,
    ) -> FeedStats {
        let mut stats = FeedStats::default();

        for entry in entries {
            stats.seen += 1;

            let Some(article_id) = entry.article_id().map(str::to_string) else {
                stats.missing_id += 1;
                debug!(title = ?entry.title, "Entry has neither id nor link; skipping");
                continue;
            };
            if existing_ids.contains(&article_id) {
                stats.duplicate += 1;
                debug!(%article_id, "Already stored; skipping");
                continue;
            }

            let article = self.build_article(article_id, &entry).await;
            existing_ids.insert(article.id.clone());
            out.push(article);
            stats.emitted += 1;
        }

        stats
    }

    #[instrument(level = "info", skip(self, entry))]
    async fn build_article(&self, article_id: String, entry: &FeedEntry) -> Article {
        let title = non_blank(entry.title.as_deref()).unwrap_or(DEFAULT_TITLE);
        let summary = non_blank(entry.summary.as_deref()).unwrap_or(title);
        let link = non_blank(entry.link.as_deref()).unwrap_or(DEFAULT_LINK);
        let author = non_blank(entry.author.as_deref()).unwrap_or(UNKNOWN_AUTHOR);
        let date = to_iso8601(entry.published.unwrap_or_else(|| self.clock.now()));
        let image = resolve_image(entry, link, &self.options.fallback_image);

        let content =
            resolve_full_content(self.fetcher, link, summary, self.options.article_timeout).await;

        let language = self.options.target_language.as_str();
        let translated_title = self.translator.translate(title, language).await;
        let translated_summary = self.translator.translate(summary, language).await;
        let translated_content = self.translator.translate(&content, language).await;

        debug!(%date, %image, "Built article");
        Article {
            id: article_id,
            title: translated_title,
            summary: translated_summary,
            content: translated_content,
            date,
            author: author.to_string(),
            image,
            source_url: link.to_string(),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Pick the card image for an entry.
///
/// # Arguments
///
/// * `entry` - The feed entry whose media and description are inspected
/// * `link` - The article link, used as the base for relative URLs
/// * `fallback` - Image used when the entry declares none
///
/// # Returns
///
/// The first image-typed media attachment with a URL, else the first
/// `<img src>` in the description markup, else `fallback`.
pub fn resolve_image(entry: &FeedEntry, link: &str, fallback: &str) -> String {
    entry
        .media
        .iter()
        .find_map(|m| m.image_url())
        .or_else(|| {
            entry
                .description_markup
                .as_deref()
                .and_then(|markup| IMG_SRC.captures(markup))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .filter(|src| !src.trim().is_empty())
        })
        .map(|src| resolve_url(src, link))
        .unwrap_or_else(|| fallback.to_string())
}
