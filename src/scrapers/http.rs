//! HTTP access for feeds and article pages.
//!
//! Everything that goes over the network for the feed side of the pipeline
//! passes through the [`Fetch`] trait, so the ingestor can be driven by an
//! in-memory fake in tests.

use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument};

/// User agent sent with every feed and article request.
pub const USER_AGENT: &str = concat!("awful_feed_translator/", env!("CARGO_PKG_VERSION"));

/// Why a GET did not produce a body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body decoding failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Fetch a URL and return its body as text.
pub trait Fetch {
    /// GET `url`, giving up after `timeout`.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// [`Fetch`] implementation backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build the client used for feeds and article pages.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self, timeout))]
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let resp = self.client.get(url).timeout(timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET complete"
        );
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory [`Fetch`] used by the ingestor and pipeline tests.

    use super::{Fetch, FetchError};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Debug, Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, Result<String, u16>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub fn with_status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        pub fn requested(&self, url: &str) -> bool {
            self.requests.borrow().iter().any(|u| u == url)
        }
    }

    impl Fetch for FakeFetcher {
        async fn get_text(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeFetcher;
    use super::*;

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("awful_feed_translator/"));
    }

    #[test]
    fn test_status_error_message() {
        let e = FetchError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        assert_eq!(e.to_string(), "https://example.com returned HTTP 503");
    }

    #[tokio::test]
    async fn test_fake_fetcher_records_requests() {
        let fetcher = FakeFetcher::default()
            .with_page("https://a.test/feed", "<rss/>")
            .with_status("https://a.test/down", 500);
        let timeout = Duration::from_secs(1);

        assert_eq!(
            fetcher.get_text("https://a.test/feed", timeout).await.unwrap(),
            "<rss/>"
        );
        assert!(matches!(
            fetcher.get_text("https://a.test/down", timeout).await,
            Err(FetchError::Status { status: 500, .. })
        ));
        assert!(fetcher.requested("https://a.test/down"));
        assert!(!fetcher.requested("https://a.test/other"));
    }
}
