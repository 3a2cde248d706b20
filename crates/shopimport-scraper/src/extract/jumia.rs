//! Jumia extraction strategy.
//!
//! Jumia ships schema.org JSON-LD on listing pages, so that is the primary
//! structured source; the markup chains target its utility-class selectors
//! (`-fs20`, `-b -ubpt`, ...) which churn more often. Currency depends on
//! the country storefront (jumia.ci, jumia.com.ng, ...) and is read off the
//! price text. The product id is the numeric suffix in `...-12345.html`.

use std::collections::HashMap;

use regex::Regex;
use rust_decimal::Decimal;
use shopimport_core::{Platform, ProductRecord, Seller, ShippingInfo};

use crate::error::ScrapeError;
use crate::extract::{fallback_description, fallback_image, fallback_title, source};
use crate::html::{
    clean_text, first_block, first_pattern_match, parse_first_f64, parse_first_u64, parse_price,
};
use crate::jsonld::extract_product_jsonld;

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x600/e5e5e5/666666?text=Jumia";
const PLACEHOLDER_DESCRIPTION: &str = "Product imported from Jumia";

const NAME_PATTERNS: &[&str] = &[
    r#"(?is)<h1[^>]*class="[^"]*-fs20[^"]*"[^>]*>(.*?)</h1>"#,
    r#"(?is)<h1[^>]*class="[^"]*title[^"]*"[^>]*>(.*?)</h1>"#,
    r#"(?is)<h1[^>]*class="[^"]*name[^"]*"[^>]*>(.*?)</h1>"#,
];

const PRICE_PATTERNS: &[&str] = &[
    r#"(?is)<span[^>]*class="[^"]*-b -ubpt[^"]*"[^>]*>(.*?)</span>"#,
    r#"(?is)<[^>]*class="[^"]*price-box[^"]*"[^>]*>.*?<span[^>]*class="[^"]*current[^"]*"[^>]*>(.*?)</span>"#,
    r#"(?is)<span[^>]*class="[^"]*-prxs[^"]*"[^>]*>(.*?)</span>"#,
];

const ORIGINAL_PRICE_PATTERNS: &[&str] = &[
    r#"(?is)<span[^>]*class="[^"]*-lthr[^"]*"[^>]*>(.*?)</span>"#,
    r#"(?is)<span[^>]*class="[^"]*old[^"]*"[^>]*>(.*?)</span>"#,
];

/// Numeric suffix id from `/some-product-name-12345.html`.
pub(crate) fn product_id(url: &str) -> Option<String> {
    let re = Regex::new(r"-(\d+)\.html").expect("valid regex");
    re.captures(url).map(|cap| cap[1].to_string())
}

pub(crate) fn extract(
    html: &str,
    url: &str,
    product_id: &str,
) -> Result<ProductRecord, ScrapeError> {
    let ld = extract_product_jsonld(html);

    let name = ld
        .as_ref()
        .and_then(|p| p.name.clone())
        .or_else(|| first_pattern_match(html, NAME_PATTERNS))
        .or_else(|| fallback_title(html))
        .ok_or_else(|| parse_error(url, "product name not found"))?;

    let price_text = first_pattern_match(html, PRICE_PATTERNS);
    let price = ld
        .as_ref()
        .and_then(|p| p.price)
        .or_else(|| price_text.as_deref().and_then(parse_price))
        .ok_or_else(|| parse_error(url, "price not found"))?;

    let currency = ld
        .as_ref()
        .and_then(|p| p.currency.clone())
        .or_else(|| price_text.as_deref().and_then(currency_from_price_text))
        // West-African storefronts are the default deployment target.
        .unwrap_or_else(|| "XOF".to_string());

    let original_price = first_pattern_match(html, ORIGINAL_PRICE_PATTERNS)
        .as_deref()
        .and_then(parse_price)
        .filter(|original| *original > price);

    let discount_percent = first_block(html, r"(?is)>\s*-?(\d+)\s*%\s*<")
        .and_then(|text| text.parse::<u32>().ok());

    let images = extract_images(html, ld.as_ref());
    let description = extract_description(html)
        .or_else(|| ld.as_ref().and_then(|p| p.description.clone()))
        .or_else(|| fallback_description(html))
        .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string());

    let rating = extract_rating(html).or_else(|| ld.as_ref().and_then(|p| p.rating));
    let review_count = first_block(html, r"(?is)\(?(\d[\d,\s]*)\)?\s+verified ratings")
        .as_deref()
        .and_then(parse_first_u64)
        .or_else(|| ld.as_ref().and_then(|p| p.review_count));

    let in_stock = ld
        .as_ref()
        .and_then(|p| p.in_stock)
        .unwrap_or_else(|| extract_stock(html));

    let mut record = ProductRecord::new(
        name,
        description,
        price,
        currency,
        source(Platform::Jumia, url, product_id),
    );
    record.original_price = original_price;
    record.discount_percent = discount_percent;
    record.thumbnail = images.first().cloned();
    record.images = images;
    record.specifications = extract_specifications(html);
    record.rating = rating;
    record.review_count = review_count;
    record.in_stock = in_stock;
    record.seller = extract_seller(html);
    record.shipping_info = extract_shipping(html);

    Ok(record)
}

/// Currency from the price text itself; Jumia prints the code next to the
/// amount ("12 500 FCFA", "₦ 45,000").
fn currency_from_price_text(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    let code = if upper.contains("FCFA") || upper.contains("CFA") {
        "XOF"
    } else if upper.contains("MAD") {
        "MAD"
    } else if upper.contains("EGP") {
        "EGP"
    } else if upper.contains("KES") || upper.contains("KSH") {
        "KES"
    } else if upper.contains("NGN") || text.contains('₦') {
        "NGN"
    } else if upper.contains("GHS") || text.contains('₵') {
        "GHS"
    } else {
        return None;
    };
    Some(code.to_string())
}

/// Gallery images, rewritten from the scaled `/s300/` CDN variant to
/// `/s1000/`.
fn extract_images(html: &str, ld: Option<&crate::jsonld::JsonLdProduct>) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let size_re = Regex::new(r"/s\d+/").expect("valid regex");

    let gallery_re = Regex::new(
        r#"(?is)<img[^>]*class="[^"]*-fw[^"]*"[^>]*data-src="([^"]+)"|<[^>]*class="[^"]*itm[^"]*"[^>]*data-src="([^"]+)""#,
    )
    .expect("valid regex");
    for cap in gallery_re.captures_iter(html) {
        if let Some(m) = cap.get(1).or_else(|| cap.get(2)) {
            let hi_res = size_re.replace(m.as_str(), "/s1000/").into_owned();
            if !images.contains(&hi_res) {
                images.push(hi_res);
            }
        }
    }

    if images.is_empty() {
        if let Some(img) = ld
            .and_then(|p| p.images.first().cloned())
            .or_else(|| fallback_image(html))
        {
            images.push(img);
        } else {
            images.push(PLACEHOLDER_IMAGE.to_string());
        }
    }
    images
}

fn extract_description(html: &str) -> Option<String> {
    let blocks = [
        r#"(?is)<div[^>]*class="[^"]*markup[^"]*"[^>]*>(.*?)</div>"#,
        r#"(?is)<div[^>]*id="description"[^>]*>(.*?)</div>"#,
    ];
    for pattern in blocks {
        if let Some(text) = first_pattern_match(html, &[pattern]) {
            if text.len() > 20 {
                return Some(text);
            }
        }
    }
    None
}

/// Specification rows from the product-details table (`<th>` label,
/// `<td>` value).
fn extract_specifications(html: &str) -> HashMap<String, String> {
    let mut specs = HashMap::new();
    let row_re =
        Regex::new(r"(?is)<tr[^>]*>\s*<th[^>]*>(.*?)</th>\s*<td[^>]*>(.*?)</td>").expect("valid regex");
    for cap in row_re.captures_iter(html) {
        let key = clean_text(&cap[1]);
        let value = clean_text(&cap[2]);
        if !key.is_empty() && !value.is_empty() {
            specs.insert(key, value);
        }
    }
    specs
}

/// Star rating, either encoded in the stars widget class (`stars _4`) or
/// printed as "4.3 out of 5".
fn extract_rating(html: &str) -> Option<f64> {
    if let Some(digit) = first_block(html, r#"(?is)class="stars[^"]*_(\d)""#) {
        return digit.parse::<f64>().ok().filter(|r| (0.0..=5.0).contains(r));
    }
    first_pattern_match(html, &[r"(?is)([\d.,]+)\s*(?:out of|sur)\s*5"])
        .as_deref()
        .and_then(parse_first_f64)
        .filter(|r| (0.0..=5.0).contains(r))
}

fn extract_stock(html: &str) -> bool {
    let lowered = html.to_lowercase();
    !lowered.contains("out of stock")
        && !lowered.contains("rupture de stock")
        && !lowered.contains("indisponible")
}

fn extract_seller(html: &str) -> Option<Seller> {
    let name = first_pattern_match(
        html,
        &[r#"(?is)<a[^>]*href="[^"]*seller[^"]*"[^>]*>(.*?)</a>"#],
    )?;
    Some(Seller { name, rating: None })
}

/// Shipping block: free-delivery markers, a flat cost, and an estimated
/// delivery window.
fn extract_shipping(html: &str) -> Option<ShippingInfo> {
    let text = first_pattern_match(
        html,
        &[r#"(?is)<div[^>]*class="[^"]*-phm[^"]*"[^>]*>(.*?)</div>"#],
    )?;
    let lowered = text.to_lowercase();
    let free_shipping = lowered.contains("free") || lowered.contains("gratuit");

    let cost = if free_shipping {
        Some(Decimal::ZERO)
    } else {
        first_block(&text, r"(?i)([\d\s,]+)\s*(?:FCFA|CFA|NGN|KES|MAD|EGP|GHS)")
            .as_deref()
            .and_then(parse_price)
    };

    let estimated_days = first_block(&text, r"(?i)(\d+\s*-?\s*\d*)\s*(?:jours?|days?)")
        .map(|days| format!("{} days", days.trim()));

    Some(ShippingInfo {
        cost,
        estimated_days,
        free_shipping,
    })
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

    const URL: &str = "https://www.jumia.ci/casque-bluetooth-sans-fil-78910.html";
    const ID: &str = "78910";

    const FIXTURE: &str = r#"
        <html><head><title>Casque Bluetooth | Jumia CI</title></head><body>
        <h1 class="-fs20 -pts -pbxs">Casque Bluetooth Sans Fil</h1>
        <span class="-b -ubpt -tal -fs24 -prxs">12 500 FCFA</span>
        <span class="-tal -gy5 -lthr -s">25 000 FCFA</span>
        <span class="bdg _dsct">-50%</span>
        <div class="itm" data-src="https://ci.jumia.is/cms/products/s300/headset.jpg"></div>
        <div class="markup">Casque sans fil avec reduction de bruit active, autonomie 30 heures.</div>
        <table><tbody>
          <tr><th>Couleur</th><td>Noir</td></tr>
          <tr><th>Autonomie</th><td>30 heures</td></tr>
        </tbody></table>
        <div class="stars _4"></div>
        <span class="-fs14 -m">(137) verified ratings</span>
        <a href="/seller/soundhub-ci/">SoundHub CI</a>
        <div class="-fs14 -phm">Livraison gratuite a Abidjan sous 2-4 jours</div>
        </body></html>"#;

    #[test]
    fn extracts_numeric_suffix_id() {
        assert_eq!(product_id(URL).as_deref(), Some(ID));
        assert_eq!(product_id("https://www.jumia.ci/catalog/?q=casque"), None);
    }

    #[test]
    fn extracts_full_record_from_fixture() {
        let record = extract(FIXTURE, URL, ID).unwrap();

        assert_eq!(record.name, "Casque Bluetooth Sans Fil");
        assert_eq!(record.price, "12500".parse::<Decimal>().unwrap());
        assert_eq!(record.currency, "XOF");
        assert_eq!(
            record.original_price,
            Some("25000".parse::<Decimal>().unwrap())
        );
        assert_eq!(record.discount_percent, Some(50));
        assert_eq!(
            record.images,
            vec!["https://ci.jumia.is/cms/products/s1000/headset.jpg".to_string()]
        );
        assert!(record.description.starts_with("Casque sans fil"));
        assert_eq!(record.specifications.get("Couleur").map(String::as_str), Some("Noir"));
        assert_eq!(record.rating, Some(4.0));
        assert_eq!(record.review_count, Some(137));
        assert!(record.in_stock);
        assert_eq!(record.seller.as_ref().unwrap().name, "SoundHub CI");

        let shipping = record.shipping_info.unwrap();
        assert!(shipping.free_shipping);
        assert_eq!(shipping.cost, Some(Decimal::ZERO));
        assert_eq!(shipping.estimated_days.as_deref(), Some("2-4 days"));
    }

    #[test]
    fn jsonld_takes_priority_over_markup() {
        let html = r#"
            <script type="application/ld+json">
            {"@type": "Product", "name": "Structured Headset",
             "offers": {"price": "9900", "priceCurrency": "NGN",
                        "availability": "https://schema.org/OutOfStock"}}
            </script>
            <h1 class="-fs20">Markup Headset</h1>
            <span class="-b -ubpt">8 000 FCFA</span>"#;

        let record = extract(html, URL, ID).unwrap();
        assert_eq!(record.name, "Structured Headset");
        assert_eq!(record.price, "9900".parse::<Decimal>().unwrap());
        assert_eq!(record.currency, "NGN");
        assert!(!record.in_stock);
    }

    #[test]
    fn detects_nigerian_currency_from_price_text() {
        let html = r#"<h1 class="-fs20">Phone</h1><span class="-b -ubpt">₦ 45,000</span>"#;
        let record = extract(html, URL, ID).unwrap();
        assert_eq!(record.currency, "NGN");
        assert_eq!(record.price, "45000".parse::<Decimal>().unwrap());
    }

    #[test]
    fn fails_without_load_bearing_fields() {
        let err = extract("<html><body>empty page</body></html>", URL, ID).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { .. }), "{err:?}");
    }
}
