//! # Awful Feed Translator
//!
//! A news ingestion pipeline that reads RSS/Atom feeds, pulls the full text
//! of each new entry, translates it with a generative model, and keeps a
//! merged JSON collection for a static news site.
//!
//! ## Features
//!
//! - Parses RSS 2.0 and Atom 1.0 feeds
//! - Extracts the main body of each linked article page
//! - Translates title, summary and content through the Gemini API
//!   (skipped when no `GEMINI_API_KEY` is set)
//! - Deduplicates by entry id against everything already stored
//! - Writes one JSON array, newest first, read by the site front-end
//!
//! ## Usage
//!
//! ```sh
//! GEMINI_API_KEY=... awful_feed_translator -o ./data/news.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Load**: Read the stored collection (missing or malformed → empty)
//! 2. **Ingest**: Fetch each feed, build and translate new articles
//! 3. **Merge**: Append new articles, sort newest first
//! 4. **Save**: Rewrite the JSON file
//!
//! Feeds, entries and network calls are handled strictly one at a time.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod ingest;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod translate;
mod utils;

use api::GeminiClient;
use cli::Cli;
use config::Settings;
use ingest::Ingestor;
use scrapers::http::HttpFetcher;
use translate::Translator;
use utils::SystemClock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("awful_feed_translator starting up");

    match try_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    debug!(?args.config, ?args.output_file, feeds = args.feeds.len(), "Parsed CLI arguments");

    let settings = Settings::from_cli(args)?;
    info!(
        output = %settings.output_file.display(),
        feeds = settings.feeds.len(),
        target_language = %settings.target_language,
        "Resolved settings"
    );

    let translator = match &settings.gemini_api_key {
        Some(key) => Translator::new(Some(GeminiClient::new(
            key.clone(),
            settings.gemini_model.clone(),
            settings.translate_timeout(),
        )?)),
        None => {
            warn!("GEMINI_API_KEY not set; translation will be skipped");
            Translator::disabled()
        }
    };
    if let Some(backend) = translator.backend() {
        info!(?backend, "Translation enabled");
    }

    let fetcher = HttpFetcher::new()?;
    let options = settings.ingest_options();
    let ingestor = Ingestor {
        fetcher: &fetcher,
        translator: &translator,
        clock: &SystemClock,
        options: &options,
    };

    pipeline::run(&settings.output_file, &settings.feeds, &ingestor).await?;
    Ok(())
}
