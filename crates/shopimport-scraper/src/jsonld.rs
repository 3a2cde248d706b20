//! schema.org `Product` extraction from JSON-LD script blocks.
//!
//! Many listings embed `<script type="application/ld+json">` structured data
//! that survives markup redesigns better than CSS class names, so the
//! strategies consult it between their platform-specific patterns and the
//! generic meta-tag fallbacks.

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

/// Fields recoverable from a JSON-LD `Product` node. Everything is optional;
/// callers merge what is present into their fallback chains.
#[derive(Debug, Default, Clone)]
pub(crate) struct JsonLdProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub in_stock: Option<bool>,
    pub brand: Option<String>,
}

/// Extract the first `Product` node found in any `ld+json` block.
pub(crate) fn extract_product_jsonld(html: &str) -> Option<JsonLdProduct> {
    let script_re = Regex::new(
        r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid regex");

    for cap in script_re.captures_iter(html) {
        let json_text = match cap.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };

        let value: Value = match serde_json::from_str(json_text) {
            Ok(v) => v,
            Err(_) => continue,
        };

        // Accept top-level object, array, or @graph container.
        let mut candidates: Vec<Value> = if let Some(arr) = value.as_array() {
            arr.clone()
        } else {
            vec![value]
        };
        let mut expanded = Vec::new();
        for item in &candidates {
            if let Some(graph) = item.get("@graph").and_then(Value::as_array) {
                expanded.extend(graph.iter().cloned());
            }
        }
        candidates.extend(expanded);

        for item in candidates {
            if let Some(product) = jsonld_item_to_product(&item) {
                return Some(product);
            }
        }
    }

    None
}

fn jsonld_item_to_product(item: &Value) -> Option<JsonLdProduct> {
    let type_node = item.get("@type")?;
    // `@type` may be a plain string or an array of strings.
    let is_product = if let Some(s) = type_node.as_str() {
        s.eq_ignore_ascii_case("Product")
    } else if let Some(arr) = type_node.as_array() {
        arr.iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case("Product"))
    } else {
        false
    };
    if !is_product {
        return None;
    }

    let mut product = JsonLdProduct {
        name: item
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        description: item
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        ..JsonLdProduct::default()
    };

    // `image` may be a string, an array, or an ImageObject.
    match item.get("image") {
        Some(Value::String(s)) => product.images.push(s.clone()),
        Some(Value::Array(arr)) => {
            for v in arr {
                if let Some(s) = v.as_str() {
                    product.images.push(s.to_string());
                } else if let Some(s) = v.get("url").and_then(Value::as_str) {
                    product.images.push(s.to_string());
                }
            }
        }
        Some(obj) => {
            if let Some(s) = obj.get("url").and_then(Value::as_str) {
                product.images.push(s.to_string());
            }
        }
        None => {}
    }

    // `offers` may be a single Offer or an array; take the first usable one.
    let offer = match item.get("offers") {
        Some(Value::Array(arr)) => arr.first().cloned(),
        Some(other) => Some(other.clone()),
        None => None,
    };
    if let Some(offer) = offer {
        product.price = offer.get("price").and_then(decimal_from_value).or_else(|| {
            offer
                .get("lowPrice")
                .and_then(decimal_from_value)
        });
        product.currency = offer
            .get("priceCurrency")
            .and_then(Value::as_str)
            .map(str::to_string);
        product.in_stock = offer
            .get("availability")
            .and_then(Value::as_str)
            .map(|s| s.contains("InStock"));
    }

    if let Some(agg) = item.get("aggregateRating") {
        product.rating = agg.get("ratingValue").and_then(f64_from_value);
        product.review_count = agg
            .get("reviewCount")
            .or_else(|| agg.get("ratingCount"))
            .and_then(u64_from_value);
    }

    product.brand = match item.get("brand") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        None => None,
    };

    Some(product)
}

// Numeric JSON-LD values appear as both strings and numbers in the wild.

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
