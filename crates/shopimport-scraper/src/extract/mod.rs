//! Per-platform extraction strategies.
//!
//! Every variant runs the same four-stage algorithm: validate the URL and
//! derive a stable product id, fetch the page through the shared
//! [`PageFetcher`], resolve each field through an ordered fallback chain
//! (embedded structured data, then markup patterns, then generic page
//! metadata, then a documented placeholder), and assemble the record. Name
//! and price are load-bearing: a record without either fails with
//! [`ScrapeError::Parse`]; every other field degrades gracefully.

mod aliexpress;
mod amazon;
mod jumia;

use chrono::Utc;
use shopimport_core::{Platform, ProductRecord, ProductSource};

use crate::client::PageFetcher;
use crate::error::ScrapeError;
use crate::html::meta_content;

/// Derive the platform-specific product identifier from a listing URL.
///
/// Pure function over the URL path; returns `None` when the URL does not
/// carry an id in the platform's canonical shape.
#[must_use]
pub fn product_id_for(platform: Platform, url: &str) -> Option<String> {
    match platform {
        Platform::Aliexpress => aliexpress::product_id(url),
        Platform::Amazon => amazon::product_id(url),
        Platform::Jumia => jumia::product_id(url),
    }
}

/// Run the full extraction pipeline for one listing URL.
///
/// # Errors
///
/// - [`ScrapeError::InvalidUrl`] — unrecognized host, or no product id in the URL.
/// - [`ScrapeError::Timeout`] / [`ScrapeError::HttpStatus`] / [`ScrapeError::Http`] —
///   the page could not be fetched.
/// - [`ScrapeError::Parse`] — the load-bearing fields could not be resolved.
pub async fn extract_product(
    fetcher: &PageFetcher,
    url: &str,
) -> Result<ProductRecord, ScrapeError> {
    let platform = Platform::identify(url).ok_or_else(|| ScrapeError::InvalidUrl {
        platform: "unknown",
        url: url.to_owned(),
        reason: "host does not match any supported platform".to_owned(),
    })?;

    let product_id = product_id_for(platform, url).ok_or_else(|| ScrapeError::InvalidUrl {
        platform: platform.as_str(),
        url: url.to_owned(),
        reason: "could not derive a product id from the URL path".to_owned(),
    })?;

    let html = fetcher.fetch_html(url).await?;
    tracing::debug!(url, platform = %platform, product_id, bytes = html.len(), "fetched listing page");

    let record = match platform {
        Platform::Aliexpress => aliexpress::extract(&html, url, &product_id),
        Platform::Amazon => amazon::extract(&html, url, &product_id),
        Platform::Jumia => jumia::extract(&html, url, &product_id),
    }?;

    Ok(record)
}

/// Builds the source descriptor common to every record.
fn source(platform: Platform, url: &str, product_id: &str) -> ProductSource {
    ProductSource {
        platform,
        url: url.to_owned(),
        product_id: product_id.to_owned(),
        extracted_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Generic page-metadata fallbacks, the last resort of every field chain
// before placeholders.
// ---------------------------------------------------------------------------

fn fallback_title(html: &str) -> Option<String> {
    meta_content(html, "og:title")
        .or_else(|| crate::html::first_pattern_match(html, &[r"(?is)<title[^>]*>(.*?)</title>"]))
}

fn fallback_description(html: &str) -> Option<String> {
    meta_content(html, "description").or_else(|| meta_content(html, "og:description"))
}

fn fallback_image(html: &str) -> Option<String> {
    meta_content(html, "og:image")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_dispatches_per_platform() {
        assert_eq!(
            product_id_for(Platform::Amazon, "https://www.amazon.com/dp/B08N5WRWNW").as_deref(),
            Some("B08N5WRWNW")
        );
        assert_eq!(
            product_id_for(
                Platform::Aliexpress,
                "https://www.aliexpress.com/item/1005001234567890.html"
            )
            .as_deref(),
            Some("1005001234567890")
        );
        assert_eq!(
            product_id_for(Platform::Jumia, "https://www.jumia.ci/phone-x-12345.html").as_deref(),
            Some("12345")
        );
    }

    #[test]
    fn fallback_title_prefers_og_over_title_tag() {
        let html = r#"<meta property="og:title" content="OG Name"><title>Tab Name</title>"#;
        assert_eq!(fallback_title(html).as_deref(), Some("OG Name"));
        assert_eq!(
            fallback_title("<title>Tab Name</title>").as_deref(),
            Some("Tab Name")
        );
    }
}
