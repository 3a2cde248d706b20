//! Amazon extraction strategy.
//!
//! Amazon rarely ships structured product data, so the chains lean on its
//! long-lived element ids (`productTitle`, `availability`, the `a-price`
//! span family) with JSON-LD and Open Graph metadata as late fallbacks.
//! The product id is the ASIN embedded in `/dp/` or `/gp/product/` paths.

use regex::Regex;
use rust_decimal::Decimal;
use shopimport_core::{Platform, ProductRecord};

use crate::error::ScrapeError;
use crate::extract::{fallback_description, fallback_image, fallback_title, source};
use crate::html::{
    all_pattern_matches, currency_from_symbol, first_block, first_pattern_match, parse_first_f64,
    parse_first_u64, parse_price, tag_attr,
};
use crate::jsonld::extract_product_jsonld;

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x600/e5e5e5/666666?text=Amazon";
const PLACEHOLDER_DESCRIPTION: &str = "Product imported from Amazon";

const NAME_PATTERNS: &[&str] = &[
    r#"(?is)<span[^>]*id="productTitle"[^>]*>(.*?)</span>"#,
    r#"(?is)<h1[^>]*id="title"[^>]*>(.*?)</h1>"#,
    r#"(?is)<h1[^>]*class="[^"]*product-title[^"]*"[^>]*>(.*?)</h1>"#,
];

const PRICE_PATTERNS: &[&str] = &[
    r#"(?is)<span[^>]*class="[^"]*\ba-offscreen\b[^"]*"[^>]*>(.*?)</span>"#,
    r#"(?is)<span[^>]*id="priceblock_(?:our|deal)price"[^>]*>(.*?)</span>"#,
    r#"(?is)<span[^>]*class="[^"]*a-price-whole[^"]*"[^>]*>(.*?)</span>"#,
];

const ORIGINAL_PRICE_PATTERN: &str = r#"(?is)<span[^>]*class="[^"]*a-text-price[^"]*"[^>]*>\s*<span[^>]*class="[^"]*a-offscreen[^"]*"[^>]*>(.*?)</span>"#;

/// ASIN from `/dp/B08N5WRWNW` or `/gp/product/B08N5WRWNW`.
pub(crate) fn product_id(url: &str) -> Option<String> {
    let re = Regex::new(r"/(?:dp|gp/product)/([A-Z0-9]{10})").expect("valid regex");
    re.captures(url).map(|cap| cap[1].to_string())
}

pub(crate) fn extract(
    html: &str,
    url: &str,
    product_id: &str,
) -> Result<ProductRecord, ScrapeError> {
    let ld = extract_product_jsonld(html);

    let name = first_pattern_match(html, NAME_PATTERNS)
        .or_else(|| ld.as_ref().and_then(|p| p.name.clone()))
        .or_else(|| fallback_title(html))
        .ok_or_else(|| parse_error(url, "product name not found"))?;

    let price = first_pattern_match(html, PRICE_PATTERNS)
        .and_then(|text| parse_price(&text))
        .or_else(|| ld.as_ref().and_then(|p| p.price))
        .ok_or_else(|| parse_error(url, "price not found"))?;

    let currency = first_pattern_match(
        html,
        &[r#"(?is)<span[^>]*class="[^"]*a-price-symbol[^"]*"[^>]*>(.*?)</span>"#],
    )
    .as_deref()
    .and_then(currency_from_symbol)
    .map(str::to_string)
    .or_else(|| ld.as_ref().and_then(|p| p.currency.clone()))
    .unwrap_or_else(|| "USD".to_string());

    let original_price = first_pattern_match(html, &[ORIGINAL_PRICE_PATTERN])
        .and_then(|text| parse_price(&text))
        .filter(|original| *original > price);

    let discount_percent = first_pattern_match(
        html,
        &[r#"(?is)<span[^>]*class="[^"]*savingsPercentage[^"]*"[^>]*>[^<]*?(\d+)\s*%"#],
    )
    .and_then(|text| text.parse::<u32>().ok());

    let features = extract_features(html);

    let description = if features.is_empty() {
        first_pattern_match(
            html,
            &[r#"(?is)<div[^>]*id="productDescription"[^>]*>(.*?)</div>"#],
        )
        .or_else(|| ld.as_ref().and_then(|p| p.description.clone()))
        .or_else(|| fallback_description(html))
        .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string())
    } else {
        features.join(" ")
    };

    let mut images = extract_images(html);
    if images.is_empty() {
        if let Some(img) = ld
            .as_ref()
            .and_then(|p| p.images.first().cloned())
            .or_else(|| fallback_image(html))
        {
            images.push(img);
        } else {
            images.push(PLACEHOLDER_IMAGE.to_string());
        }
    }

    let rating = first_pattern_match(
        html,
        &[r#"(?is)<span[^>]*class="[^"]*a-icon-alt[^"]*"[^>]*>(.*?)</span>"#],
    )
    .as_deref()
    .and_then(parse_first_f64)
    .or_else(|| ld.as_ref().and_then(|p| p.rating));

    let review_count = first_pattern_match(
        html,
        &[r#"(?is)<span[^>]*id="acrCustomerReviewText"[^>]*>(.*?)</span>"#],
    )
    .as_deref()
    .and_then(parse_first_u64)
    .or_else(|| ld.as_ref().and_then(|p| p.review_count));

    let in_stock = extract_stock(html)
        .or_else(|| ld.as_ref().and_then(|p| p.in_stock))
        .unwrap_or(true);

    let mut record = ProductRecord::new(
        name,
        description,
        price,
        currency,
        source(Platform::Amazon, url, product_id),
    );
    record.original_price = original_price;
    record.discount_percent = discount_percent;
    record.thumbnail = images.first().cloned();
    record.images = images;
    record.features = features;
    record.rating = rating;
    record.review_count = review_count;
    record.in_stock = in_stock;

    Ok(record)
}

/// Feature bullets from the `#feature-bullets` list.
fn extract_features(html: &str) -> Vec<String> {
    let Some(block) = first_block(
        html,
        r#"(?is)<div[^>]*id="feature-bullets"[^>]*>(.*?)</ul>"#,
    ) else {
        return Vec::new();
    };
    all_pattern_matches(&block, r"(?is)<li[^>]*>\s*<span[^>]*>(.*?)</span>")
}

/// Image URLs: the `data-a-dynamic-image` JSON map first, then the hi-res
/// landing image, then gallery thumbnails rewritten to their large variants.
fn extract_images(html: &str) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let mut push_unique = |images: &mut Vec<String>, url: String| {
        if !url.is_empty() && !images.contains(&url) {
            images.push(url);
        }
    };

    // Main image block: attribute value is an HTML-escaped JSON object whose
    // keys are image URLs.
    if let Some(raw) = first_block(html, r#"(?is)data-a-dynamic-image\s*=\s*"([^"]+)""#) {
        let decoded = raw.replace("&quot;", "\"");
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&decoded) {
            for url in map.keys() {
                push_unique(&mut images, url.clone());
            }
        }
    }

    // Landing image: prefer the hi-res original over the scaled src.
    if let Some(tag) = first_block(html, r#"(?is)(<img[^>]*id="landingImage"[^>]*>)"#) {
        if let Some(main) = tag_attr(&tag, "data-old-hires").or_else(|| tag_attr(&tag, "src")) {
            if !images.contains(&main) {
                images.insert(0, main);
            }
        }
    }

    // Gallery thumbnails, rewritten to the 1500px variant.
    let thumb_re = Regex::new(
        r#"(?is)<span[^>]*class="[^"]*imageThumbnail[^"]*"[^>]*>\s*<img[^>]*src="([^"]+)""#,
    )
    .expect("valid regex");
    let size_re = Regex::new(r"_[A-Z]{2}\d+_").expect("valid regex");
    for cap in thumb_re.captures_iter(html) {
        let hi_res = size_re.replace(&cap[1], "_AC_SL1500_").into_owned();
        push_unique(&mut images, hi_res);
    }

    images
}

/// `None` when the page has no availability block at all.
fn extract_stock(html: &str) -> Option<bool> {
    let text = first_pattern_match(
        html,
        &[r#"(?is)<div[^>]*id="availability"[^>]*>(.*?)</div>"#],
    )?;
    let lowered = text.to_lowercase();
    Some(
        !lowered.contains("unavailable")
            && !lowered.contains("out of stock")
            && !lowered.contains("indisponible"),
    )
}

fn parse_error(url: &str, reason: &str) -> ScrapeError {
    ScrapeError::Parse {
        url: url.to_owned(),
        reason: reason.to_owned(),
    }
}
