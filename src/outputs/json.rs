//! JSON article store.
//!
//! The output file is both the state carried between runs and the artifact
//! served to the site, so it is always read and written as a whole.
//!
//! # Output Structure
//!
//! ```text
//! data/
//! └── news.json   # [ { "id": ..., "title": ..., "date": ... }, ... ]
//! ```
//!
//! The array is sorted newest first by `date` and never holds two articles
//! with the same `id`.

use crate::models::Article;
use crate::utils::ensure_parent_dir;
use itertools::Itertools;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Failure to persist the collection. Fatal for the run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialize articles: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load the stored collection from `path`.
///
/// A missing file is a fresh start. An unreadable or malformed file is
/// logged and also treated as a fresh start. Duplicate ids already present
/// in the file are dropped, keeping the first occurrence.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load(path: &Path) -> Vec<Article> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No stored articles yet; starting fresh");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Could not read stored articles; starting fresh");
            return Vec::new();
        }
    };

    let stored: Vec<Article> = match serde_json::from_str(&raw) {
        Ok(articles) => articles,
        Err(e) => {
            warn!(error = %e, "Stored articles are empty or malformed; starting fresh");
            return Vec::new();
        }
    };

    let total = stored.len();
    let articles: Vec<Article> = stored.into_iter().unique_by(|a| a.id.clone()).collect();
    if articles.len() < total {
        warn!(
            dropped = total - articles.len(),
            "Stored articles contained duplicate ids; kept first occurrence"
        );
    }
    info!(count = articles.len(), "Loaded stored articles");
    articles
}

/// Append `fresh` to `existing`, skipping ids that are already present,
/// then sort newest first.
///
/// # Arguments
///
/// * `existing` - The stored collection
/// * `fresh` - Articles produced by this run
///
/// # Returns
///
/// The merged collection sorted by `date` descending. A stored article
/// always wins over a re-fetched one with the same id.
pub fn merge(existing: Vec<Article>, fresh: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = existing.iter().map(|a| a.id.clone()).collect();
    let mut merged = existing;
    merged.extend(fresh.into_iter().filter(|a| seen.insert(a.id.clone())));
    sort_newest_first(&mut merged);
    merged
}

/// Sort by `date` descending. ISO-8601 UTC strings compare chronologically.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Write the full collection to `path` as indented JSON, creating the
/// parent directory if needed.
///
/// # Errors
///
/// [`StoreError`] when the directory or file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn save(path: &Path, articles: &[Article]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(articles)?;

    ensure_parent_dir(path).await.map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, json).await.map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Wrote articles JSON");
    Ok(())
}
