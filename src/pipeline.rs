//! The run itself: load, ingest, merge, sort, save.
//!
//! Only a failure to write the collection escapes [`run`]; every other
//! problem is absorbed by the component that met it.

use crate::api::TranslationBackend;
use crate::ingest::Ingestor;
use crate::outputs::json::{self, StoreError};
use crate::scrapers::http::Fetch;
use crate::utils::Clock;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Articles found in the output file at start.
    pub stored: usize,
    /// New articles produced by this run.
    pub ingested: usize,
    /// Articles written back.
    pub saved: usize,
}

/// Run the pipeline once against `output_file`.
///
/// # Errors
///
/// Returns [`StoreError`] when the merged collection cannot be written.
#[instrument(level = "info", skip_all, fields(output = %output_file.display()))]
pub async fn run<F, B, C>(
    output_file: &Path,
    feed_urls: &[String],
    ingestor: &Ingestor<'_, F, B, C>,
) -> Result<RunSummary, StoreError>
where
    F: Fetch,
    B: TranslationBackend,
    C: Clock,
{
    let t0 = Instant::now();

    let existing = json::load(output_file).await;
    let stored = existing.len();
    let mut existing_ids: HashSet<String> = existing.iter().map(|a| a.id.clone()).collect();

    let fresh = ingestor.ingest(feed_urls, &mut existing_ids).await;
    let ingested = fresh.len();

    let merged = json::merge(existing, fresh);
    json::save(output_file, &merged).await?;

    let summary = RunSummary {
        stored,
        ingested,
        saved: merged.len(),
    };
    let elapsed = t0.elapsed();
    info!(
        stored = summary.stored,
        ingested = summary.ingested,
        saved = summary.saved,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Successfully fetched and saved articles"
    );
    Ok(summary)
}
