//! Shared HTTP fetch capability for all extraction strategies.
//!
//! Every platform variant fetches its listing page the same way: a single GET
//! with a bounded timeout and a realistic browser-like header set. The
//! per-platform modules only supply field-extraction logic on top of the raw
//! HTML this client returns.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScrapeError;

/// HTTP client for listing pages.
///
/// Maps transport failures to typed errors: a timeout becomes
/// [`ScrapeError::Timeout`], any non-2xx response becomes
/// [`ScrapeError::HttpStatus`]. Nothing is retried here; a caller that wants
/// a retry resubmits the whole import request.
pub struct PageFetcher {
    client: Client,
    user_agent: String,
    upstream_override: Option<String>,
}

impl PageFetcher {
    /// Creates a `PageFetcher` with the configured total-request timeout and
    /// `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_owned(),
            upstream_override: None,
        })
    }

    /// Routes every request to a fixed origin (scheme + authority) while
    /// keeping the original URL's path and query. The listing URL itself is
    /// untouched, so platform identification and error messages still refer
    /// to the real marketplace host. Used to point the fetcher at a stub
    /// server or an egress proxy.
    #[must_use]
    pub fn with_upstream_override(mut self, origin: impl Into<String>) -> Self {
        self.upstream_override = Some(origin.into());
        self
    }

    /// Fetches the HTML body of a listing page.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Timeout`] — the request exceeded the configured timeout.
    /// - [`ScrapeError::HttpStatus`] — upstream answered with a non-2xx status.
    /// - [`ScrapeError::Http`] — network or TLS failure.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let target = match &self.upstream_override {
            Some(origin) => rewrite_origin(url, origin),
            None => url.to_owned(),
        };
        let response = self
            .client
            .get(&target)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(
                reqwest::header::ACCEPT_LANGUAGE,
                "en-US,en;q=0.9,fr-FR;q=0.8,fr;q=0.7",
            )
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| map_transport_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| map_transport_error(e, url))
    }
}

fn map_transport_error(err: reqwest::Error, url: &str) -> ScrapeError {
    if err.is_timeout() {
        ScrapeError::Timeout {
            url: url.to_owned(),
        }
    } else {
        ScrapeError::Http(err)
    }
}

/// Replaces the scheme and authority of `url` with `origin`, keeping the
/// path and query.
fn rewrite_origin(url: &str, origin: &str) -> String {
    let path = url
        .find("://")
        .map(|i| &url[i + 3..])
        .and_then(|rest| rest.find('/').map(|j| &rest[j..]))
        .unwrap_or("/");
    format!("{}{path}", origin.trim_end_matches('/'))
}
