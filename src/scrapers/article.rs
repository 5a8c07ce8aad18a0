//! Article page retrieval and main-content extraction.
//!
//! Feeds usually carry only a teaser. When an entry links to a real page,
//! the page is downloaded and reduced to its primary body with a small set
//! of CSS heuristics; anything that fails along the way falls back to the
//! feed summary.

use crate::scrapers::http::Fetch;
use crate::utils::is_fetchable_url;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Candidate containers, most specific first.
static CANDIDATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        // article body
        r#"[itemprop="articleBody"], .article-body, .article__body, .article-content, .post-body"#,
        // entry content
        ".entry-content, .post-content",
        "article",
        // main content
        r#"main, [role="main"], #main-content, .main-content"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

/// Subtrees that never belong to the readable body.
static BOILERPLATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"script, style, noscript, iframe, nav, [role="navigation"], footer, header, aside, .sidebar, form, button, input, select, textarea"#,
    )
    .unwrap()
});

/// Return the best-guess main content of an HTML page as markup.
///
/// The first element matching the candidate selectors (in priority order)
/// is taken, boilerplate subtrees are removed from it, and the remainder is
/// serialised. Returns `None` when no candidate exists or when nothing but
/// whitespace survives the cleanup. Malformed markup never fails: the HTML5
/// parser recovers and the result is simply "no candidate".
pub fn extract_main_content(html: &str) -> Option<String> {
    let mut document = Html::parse_document(html);

    let candidate_id = CANDIDATE_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())
        .map(|el| el.id())?;

    let doomed: Vec<_> = document
        .tree
        .get(candidate_id)
        .and_then(ElementRef::wrap)?
        .select(&BOILERPLATE_SELECTOR)
        .map(|el| el.id())
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let candidate = document.tree.get(candidate_id).and_then(ElementRef::wrap)?;
    if candidate.text().all(|t| t.trim().is_empty()) {
        debug!("Main content candidate is empty after cleanup");
        return None;
    }
    Some(candidate.html())
}

/// Resolve the full text for an entry.
///
/// Fetches `link` when it is a real `http(s)` URL and extracts the main
/// content; every failure (bad link, request error, non-2xx, nothing
/// extractable) yields `summary` instead.
#[instrument(level = "info", skip_all, fields(%link))]
pub async fn resolve_full_content<F: Fetch>(
    fetcher: &F,
    link: &str,
    summary: &str,
    timeout: Duration,
) -> String {
    if !is_fetchable_url(link) {
        debug!("No fetchable link; using summary as content");
        return summary.to_string();
    }

    match fetcher.get_text(link, timeout).await {
        Ok(body) => match extract_main_content(&body) {
            Some(content) => {
                debug!(bytes = content.len(), "Extracted main content");
                content
            }
            None => {
                debug!("No main content found; using summary");
                summary.to_string()
            }
        },
        Err(e) => {
            warn!(error = %e, "Could not fetch full content; using summary");
            summary.to_string()
        }
    }
}
