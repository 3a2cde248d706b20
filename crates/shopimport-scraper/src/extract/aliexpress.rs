//! AliExpress extraction strategy.
//!
//! AliExpress pages embed the full product payload in a
//! `window.runParams = {...}` script assignment, so that JSON is the primary
//! source for every field; markup patterns and page metadata only cover
//! pages served without it (bot-lite variants, old cached renders).
//! The product id is the numeric item id in `/item/<id>.html`.

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use shopimport_core::{Platform, ProductRecord, Seller};

use crate::error::ScrapeError;
use crate::extract::{fallback_description, fallback_image, fallback_title, source};
use crate::html::{extract_balanced_object, first_pattern_match, parse_price};
use crate::jsonld::extract_product_jsonld;

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x600/e5e5e5/666666?text=AliExpress";
const PLACEHOLDER_DESCRIPTION: &str = "Product imported from AliExpress";
const DEFAULT_SELLER: &str = "AliExpress Seller";

const NAME_PATTERNS: &[&str] = &[
    r#"(?is)<h1[^>]*data-pl="product-title"[^>]*>(.*?)</h1>"#,
    r#"(?is)<[^>]*class="[^"]*product-title-text[^"]*"[^>]*>(.*?)<"#,
    r#"(?is)<h1[^>]*class="[^"]*product-name[^"]*"[^>]*>(.*?)</h1>"#,
];

/// Numeric item id from `/item/1005001234567890.html`.
pub(crate) fn product_id(url: &str) -> Option<String> {
    let re = Regex::new(r"/item/(\d+)\.html").expect("valid regex");
    re.captures(url).map(|cap| cap[1].to_string())
}

pub(crate) fn extract(
    html: &str,
    url: &str,
    product_id: &str,
) -> Result<ProductRecord, ScrapeError> {
    let params = run_params(html);
    let data = params.as_ref().and_then(|p| p.get("data"));
    let ld = extract_product_jsonld(html);

    let name = data
        .and_then(|d| d.pointer("/titleModule/subject"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| first_pattern_match(html, NAME_PATTERNS))
        .or_else(|| ld.as_ref().and_then(|p| p.name.clone()))
        .or_else(|| fallback_title(html))
        .ok_or_else(|| parse_error(url, "product name not found"))?;

    let price_module = data.and_then(|d| d.get("priceModule"));
    let price = price_module
        .and_then(|m| {
            m.pointer("/minActivityAmount/value")
                .or_else(|| m.pointer("/minAmount/value"))
        })
        .and_then(decimal_from_value)
        .or_else(|| {
            first_pattern_match(
                html,
                &[r#"(?is)<[^>]*class="[^"]*product-price-current[^"]*"[^>]*>(.*?)<"#],
            )
            .and_then(|text| parse_price(&text))
        })
        .or_else(|| ld.as_ref().and_then(|p| p.price))
        .ok_or_else(|| parse_error(url, "price not found"))?;

    let currency = price_module
        .and_then(|m| m.pointer("/minActivityAmount/currency"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| ld.as_ref().and_then(|p| p.currency.clone()))
        .unwrap_or_else(|| "USD".to_string());

    let original_price = price_module
        .and_then(|m| m.pointer("/maxAmount/value"))
        .and_then(decimal_from_value)
        .filter(|original| *original > price);

    let discount_percent = price_module
        .and_then(|m| m.get("discount"))
        .and_then(Value::as_u64)
        .and_then(|d| u32::try_from(d).ok());

    let images = extract_images(html, data, ld.as_ref());

    let description = data
        .and_then(|d| d.pointer("/descriptionModule/descriptionUrl"))
        .map(|_| "Description available on the product page".to_string())
        .or_else(|| {
            first_pattern_match(
                html,
                &[
                    r#"(?is)<div[^>]*class="[^"]*product-description[^"]*"[^>]*>(.*?)</div>"#,
                    r#"(?is)<div[^>]*id="product-description"[^>]*>(.*?)</div>"#,
                ],
            )
        })
        .or_else(|| fallback_description(html))
        .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string());

    let rating = data
        .and_then(|d| d.pointer("/titleModule/feedbackRating/averageStar"))
        .and_then(f64_from_value)
        .or_else(|| {
            first_pattern_match(
                html,
                &[r#"(?is)<[^>]*class="[^"]*overview-rating-average[^"]*"[^>]*>(.*?)<"#],
            )
            .as_deref()
            .and_then(crate::html::parse_first_f64)
        })
        .or_else(|| ld.as_ref().and_then(|p| p.rating));

    let review_count = data
        .and_then(|d| d.pointer("/titleModule/feedbackRating/totalValidNum"))
        .and_then(u64_from_value)
        .or_else(|| ld.as_ref().and_then(|p| p.review_count));

    let seller = extract_seller(data);

    let mut record = ProductRecord::new(
        name,
        description,
        price,
        currency,
        source(Platform::Aliexpress, url, product_id),
    );
    record.original_price = original_price;
    record.discount_percent = discount_percent;
    record.thumbnail = images.first().cloned();
    record.images = images;
    record.rating = rating;
    record.review_count = review_count;
    record.seller = Some(seller);
    // Listing pages rarely surface stock-out state; sold-out items disappear
    // from search instead.
    record.in_stock = true;

    Ok(record)
}

/// Locate and parse the `window.runParams = {...}` assignment.
fn run_params(html: &str) -> Option<Value> {
    let idx = html.find("window.runParams")?;
    let rest = &html[idx..];
    let eq = rest.find('=')?;
    let after = rest[eq + 1..].trim_start();
    let object = extract_balanced_object(after)?;
    serde_json::from_str(object).ok()
}

fn extract_images(
    html: &str,
    data: Option<&Value>,
    ld: Option<&crate::jsonld::JsonLdProduct>,
) -> Vec<String> {
    // Structured source: the image module lists protocol-relative paths.
    if let Some(list) = data
        .and_then(|d| d.pointer("/imageModule/imagePathList"))
        .and_then(Value::as_array)
    {
        let images: Vec<String> = list
            .iter()
            .filter_map(Value::as_str)
            .map(absolutize)
            .collect();
        if !images.is_empty() {
            return images;
        }
    }

    // Markup gallery, then metadata.
    let mut images: Vec<String> = Vec::new();
    let gallery_re = Regex::new(
        r#"(?is)<[^>]*class="[^"]*images-view-item[^"]*"[^>]*>\s*<img[^>]*(?:data-src|src)="([^"]+)""#,
    )
    .expect("valid regex");
    for cap in gallery_re.captures_iter(html) {
        let img = absolutize(&cap[1]);
        if !images.contains(&img) {
            images.push(img);
        }
    }
    if let Some(img) = ld
        .and_then(|p| p.images.first().cloned())
        .or_else(|| fallback_image(html))
    {
        if !images.contains(&img) {
            images.push(img);
        }
    }

    if images.is_empty() {
        images.push(PLACEHOLDER_IMAGE.to_string());
    }
    images
}

fn extract_seller(data: Option<&Value>) -> Seller {
    let module = data.and_then(|d| d.get("sellerModule"));
    let name = module
        .and_then(|m| m.get("storeName"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SELLER)
        .to_string();
    // positiveRate is a 0–100 percentage; the record carries a 0–5 scale.
    let rating = module
        .and_then(|m| m.get("positiveRate"))
        .and_then(f64_from_value)
        .map(|rate| rate / 100.0 * 5.0);
    Seller { name, rating }
}

fn absolutize(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        path.to_string()
    }
}

// runParams numbers arrive as both JSON strings and numbers.

fn decimal_from_value(v: &Value) -> Option<Decimal> {
    match v {
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn f64_from_value(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn u64_from_value(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
}

fn parse_error(url: &str, reason: &str) -> ScrapeError {
    ScrapeError::Parse {
        url: url.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.aliexpress.com/item/1005001234567890.html";
    const ID: &str = "1005001234567890";

    fn fixture_with_run_params() -> String {
        let params = serde_json::json!({
            "data": {
                "titleModule": {
                    "subject": "USB-C Fast Charger 65W",
                    "feedbackRating": {"averageStar": "4.8", "totalValidNum": 2314}
                },
                "priceModule": {
                    "minActivityAmount": {"value": "11.89", "currency": "USD"},
                    "minAmount": {"value": "13.99"},
                    "maxAmount": {"value": "19.99"},
                    "discount": 40
                },
                "imageModule": {
                    "imagePathList": ["//ae01.alicdn.com/kf/charger1.jpg",
                                      "https://ae01.alicdn.com/kf/charger2.jpg"]
                },
                "sellerModule": {"storeName": "ChargeTech Store", "positiveRate": "97.4"},
                "descriptionModule": {"descriptionUrl": "https://desc.example/x"}
            }
        });
        format!(
            "<html><body><script>window.runParams = {params};</script></body></html>"
        )
    }

    #[test]
    fn extracts_item_id() {
        assert_eq!(product_id(URL).as_deref(), Some(ID));
        assert_eq!(
            product_id("https://fr.aliexpress.com/item/32839221510.html").as_deref(),
            Some("32839221510")
        );
        assert_eq!(product_id("https://www.aliexpress.com/store/912345"), None);
    }

    #[test]
    fn prefers_run_params_payload() {
        let record = extract(&fixture_with_run_params(), URL, ID).unwrap();

        assert_eq!(record.name, "USB-C Fast Charger 65W");
        assert_eq!(record.price, "11.89".parse::<Decimal>().unwrap());
        assert_eq!(record.currency, "USD");
        assert_eq!(
            record.original_price,
            Some("19.99".parse::<Decimal>().unwrap())
        );
        assert_eq!(record.discount_percent, Some(40));
        assert_eq!(
            record.images,
            vec![
                "https://ae01.alicdn.com/kf/charger1.jpg".to_string(),
                "https://ae01.alicdn.com/kf/charger2.jpg".to_string(),
            ]
        );
        assert_eq!(record.rating, Some(4.8));
        assert_eq!(record.review_count, Some(2314));

        let seller = record.seller.unwrap();
        assert_eq!(seller.name, "ChargeTech Store");
        let rating = seller.rating.unwrap();
        assert!((rating - 4.87).abs() < 0.001, "{rating}");
    }

    #[test]
    fn falls_back_to_markup_when_run_params_missing() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://ae01.alicdn.com/kf/fallback.jpg">
            </head><body>
            <h1 data-pl="product-title">Fallback Charger</h1>
            <div class="product-price-current">US $7.99</div>
            </body></html>"#;

        let record = extract(html, URL, ID).unwrap();
        assert_eq!(record.name, "Fallback Charger");
        assert_eq!(record.price, "7.99".parse::<Decimal>().unwrap());
        assert_eq!(record.images, vec![
            "https://ae01.alicdn.com/kf/fallback.jpg".to_string()
        ]);
        assert_eq!(record.seller.unwrap().name, DEFAULT_SELLER);
        assert_eq!(record.description, PLACEHOLDER_DESCRIPTION);
    }

    #[test]
    fn fails_when_name_and_price_both_missing() {
        let err = extract("<html><body>nothing here</body></html>", URL, ID).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { .. }), "{err:?}");
    }
}
