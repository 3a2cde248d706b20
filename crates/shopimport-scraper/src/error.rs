use thiserror::Error;

/// Failure modes of a single extraction attempt.
///
/// Every variant is returned as a value; nothing propagates as a panic past
/// the strategy boundary, so the orchestrator can log all of them uniformly.
/// No variant is retried inside the scraper.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid {platform} URL \"{url}\": {reason}")]
    InvalidUrl {
        platform: &'static str,
        url: String,
        reason: String,
    },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not parse listing at {url}: {reason}")]
    Parse { url: String, reason: String },
}

impl ScrapeError {
    /// Short machine-readable kind, used in log rows and metrics labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::InvalidUrl { .. } => "invalid_url",
            ScrapeError::Timeout { .. } => "fetch_timeout",
            ScrapeError::HttpStatus { .. } => "fetch_http_error",
            ScrapeError::Http(_) => "fetch_error",
            ScrapeError::Parse { .. } => "parse_error",
        }
    }
}
