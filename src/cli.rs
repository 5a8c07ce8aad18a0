//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also come from an environment variable or, for most of
//! them, from the YAML file given with `--config`.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a single pipeline run.
///
/// Anything left unset falls back to the YAML config file and then to the
/// built-in defaults (see [`crate::config::Settings`]).
///
/// # Examples
///
/// ```sh
/// # Defaults: Bitcoin Magazine feed, Malay, ./data/news.json
/// GEMINI_API_KEY=... awful_feed_translator
///
/// # Two feeds, Indonesian, custom output
/// awful_feed_translator -f https://bitcoinmagazine.com/feed \
///     -f https://www.coindesk.com/arc/outboundfeeds/rss/ \
///     -l Indonesian -o ./site/data/news.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file holding the stored articles (read, merged and rewritten)
    #[arg(short, long, env = "NEWS_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// RSS/Atom feed URL (repeatable)
    #[arg(short, long = "feed", env = "NEWS_FEEDS", value_delimiter = ',')]
    pub feeds: Vec<String>,

    /// Language to translate titles, summaries and content into
    #[arg(short = 'l', long, env = "TARGET_LANGUAGE")]
    pub target_language: Option<String>,

    /// Gemini API key; translation is skipped when absent
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model used for translation
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_are_unset() {
        let cli = Cli::try_parse_from(["awful_feed_translator"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.output_file.is_none());
        assert!(cli.target_language.is_none());
        assert!(cli.gemini_model.is_none());
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "awful_feed_translator",
            "--output-file",
            "./out/news.json",
            "--feed",
            "https://a.test/rss",
            "--feed",
            "https://b.test/atom",
            "--target-language",
            "Indonesian",
            "--gemini-model",
            "gemini-1.5-flash",
        ]);

        assert_eq!(cli.output_file, Some(PathBuf::from("./out/news.json")));
        assert_eq!(cli.feeds, ["https://a.test/rss", "https://b.test/atom"]);
        assert_eq!(cli.target_language.as_deref(), Some("Indonesian"));
        assert_eq!(cli.gemini_model.as_deref(), Some("gemini-1.5-flash"));
    }

    #[test]
    fn test_cli_short_flags_and_delimiter() {
        let cli = Cli::parse_from([
            "awful_feed_translator",
            "-c",
            "/etc/news.yaml",
            "-o",
            "/tmp/news.json",
            "-f",
            "https://a.test/rss,https://b.test/rss",
            "-l",
            "Malay",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/etc/news.yaml")));
        assert_eq!(cli.output_file, Some(PathBuf::from("/tmp/news.json")));
        assert_eq!(cli.feeds.len(), 2);
        assert_eq!(cli.target_language.as_deref(), Some("Malay"));
    }
}
