//! Integration tests for the full extraction pipeline.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Platform identification keys off the real
//! marketplace hosts, so the end-to-end tests point the fetcher at the mock
//! server via its upstream override while keeping real marketplace URLs.
//! The per-platform field chains are covered by fixture tests inside each
//! strategy module.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopimport_core::Platform;
use shopimport_scraper::{extract_product, product_id_for, PageFetcher, ScrapeError};

fn test_fetcher() -> PageFetcher {
    PageFetcher::new(2, "shopimport-test/0.1").expect("failed to build test PageFetcher")
}

const AMAZON_FIXTURE: &str = r#"
    <html><head><title>Amazon.com: Desk Lamp</title></head><body>
    <span id="productTitle">LED Desk Lamp with USB Port</span>
    <span class="a-price"><span class="a-offscreen">$23.50</span></span>
    <span class="a-price-symbol">$</span>
    <div id="availability"><span>In Stock</span></div>
    </body></html>"#;

// ---------------------------------------------------------------------------
// Fetch layer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_html_returns_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B000000001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AMAZON_FIXTURE))
        .mount(&server)
        .await;

    let fetcher = test_fetcher();
    let body = fetcher
        .fetch_html(&format!("{}/dp/B000000001", server.uri()))
        .await
        .expect("expected Ok");
    assert!(body.contains("LED Desk Lamp"));
}

#[tokio::test]
async fn fetch_html_maps_upstream_503_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = test_fetcher();
    let err = fetcher
        .fetch_html(&format!("{}/dp/B000000001", server.uri()))
        .await
        .expect_err("expected Err on 503");

    match &err {
        ScrapeError::HttpStatus { status, .. } => assert_eq!(*status, 503),
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert_eq!(err.kind(), "fetch_http_error");
}

#[tokio::test]
async fn fetch_html_maps_slow_upstream_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    // 2s client timeout against a 5s response delay.
    let fetcher = test_fetcher();
    let err = fetcher
        .fetch_html(&format!("{}/dp/B000000001", server.uri()))
        .await
        .expect_err("expected Err on timeout");

    assert!(matches!(err, ScrapeError::Timeout { .. }), "{err:?}");
    assert_eq!(err.kind(), "fetch_timeout");
}

// ---------------------------------------------------------------------------
// End-to-end pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extract_product_rejects_unknown_hosts_before_fetching() {
    let fetcher = test_fetcher();
    // No server is running at this address; the pipeline must fail before
    // any network I/O.
    let err = extract_product(&fetcher, "https://www.ebay.com/itm/1234")
        .await
        .expect_err("expected Err for unsupported platform");
    assert!(matches!(err, ScrapeError::InvalidUrl { .. }), "{err:?}");
}

#[tokio::test]
async fn extract_product_rejects_urls_without_a_product_id() {
    let fetcher = test_fetcher();
    let err = extract_product(&fetcher, "https://www.amazon.com/s?k=lamps")
        .await
        .expect_err("expected Err when no ASIN is present");

    match err {
        ScrapeError::InvalidUrl { platform, .. } => assert_eq!(platform, "amazon"),
        other => panic!("expected InvalidUrl, got {other:?}"),
    }
}

#[tokio::test]
async fn extract_product_builds_a_full_record_from_a_fixture_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B000000001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AMAZON_FIXTURE))
        .mount(&server)
        .await;

    let fetcher = test_fetcher().with_upstream_override(server.uri());
    let record = extract_product(&fetcher, "https://www.amazon.com/dp/B000000001")
        .await
        .expect("fixture page should extract");

    assert_eq!(record.name, "LED Desk Lamp with USB Port");
    assert_eq!(record.price, "23.50".parse().unwrap());
    assert_eq!(record.currency, "USD");
    assert!(record.in_stock);
    assert_eq!(record.source.platform, Platform::Amazon);
    assert_eq!(record.source.product_id, "B000000001");
    assert_eq!(record.source.url, "https://www.amazon.com/dp/B000000001");
}

#[tokio::test]
async fn extract_product_surfaces_upstream_failures_with_the_real_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = test_fetcher().with_upstream_override(server.uri());
    let err = extract_product(&fetcher, "https://www.amazon.com/dp/B000000001")
        .await
        .expect_err("expected Err on 503");

    match &err {
        ScrapeError::HttpStatus { status, url } => {
            assert_eq!(*status, 503);
            assert_eq!(url, "https://www.amazon.com/dp/B000000001");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn product_id_for_derives_stable_ids() {
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
        product_id_for(Platform::Jumia, "https://www.jumia.com.ng/blender-554433.html").as_deref(),
        Some("554433")
    );
}
