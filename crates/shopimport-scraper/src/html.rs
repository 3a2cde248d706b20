//! Markup-scanning primitives shared by the extraction strategies.
//!
//! The per-field fallback chains are expressed as ordered lists of regex
//! patterns over the raw HTML. Each pattern captures the field value in
//! group 1; the first pattern whose cleaned capture is non-empty wins. These
//! patterns are inherently coupled to the current markup of each third-party
//! site and will need maintenance as those sites change.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use rust_decimal::Decimal;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9\s\u{00a0}\u{202f}.,]*").expect("valid regex"));
static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9\s,.\u{00a0}]*").expect("valid regex"));
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:[.,][0-9]+)?").expect("valid regex"));

/// Process-wide cache for the caller-supplied fallback patterns, which are
/// evaluated once per field per page. `Regex` clones share the compiled
/// program, so handing out clones is cheap.
static PATTERN_CACHE: LazyLock<Mutex<HashMap<String, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn compiled(pattern: &str) -> Regex {
    let mut cache = PATTERN_CACHE.lock().expect("pattern cache lock");
    if let Some(re) = cache.get(pattern) {
        return re.clone();
    }
    let re = Regex::new(pattern).expect("valid regex");
    cache.insert(pattern.to_owned(), re.clone());
    re
}

/// Evaluates `patterns` in order against `html` and returns the first
/// non-empty cleaned capture. Each pattern must have one capture group.
pub(crate) fn first_pattern_match(html: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        let re = compiled(pattern);
        if let Some(cap) = re.captures(html) {
            if let Some(m) = cap.get(1) {
                let text = clean_text(m.as_str());
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Returns all non-empty cleaned captures of `pattern`, de-duplicated,
/// preserving document order.
pub(crate) fn all_pattern_matches(html: &str, pattern: &str) -> Vec<String> {
    let re = compiled(pattern);
    let mut out: Vec<String> = Vec::new();
    for cap in re.captures_iter(html) {
        if let Some(m) = cap.get(1) {
            let text = clean_text(m.as_str());
            if !text.is_empty() && !out.contains(&text) {
                out.push(text);
            }
        }
    }
    out
}

/// Returns the raw (uncleaned) group-1 capture of `pattern`, for callers
/// that need to scan inside a block of markup rather than read a text value.
pub(crate) fn first_block(html: &str, pattern: &str) -> Option<String> {
    let re = compiled(pattern);
    re.captures(html)
        .and_then(|cap| cap.get(1).map(|m| m.as_str().to_string()))
}

/// Reads one attribute value out of a single already-captured tag.
pub(crate) fn tag_attr(tag: &str, attr: &str) -> Option<String> {
    let escaped = regex::escape(attr);
    let re = compiled(&format!(r#"(?is){escaped}\s*=\s*["']([^"']+)["']"#));
    re.captures(tag).map(|cap| cap[1].to_string())
}

/// Reads a `<meta property="..." content="...">` (or `name=`) value,
/// tolerating either attribute order.
pub(crate) fn meta_content(html: &str, key: &str) -> Option<String> {
    let escaped = regex::escape(key);
    let patterns = [
        format!(
            r#"(?is)<meta[^>]+(?:property|name)\s*=\s*["']{escaped}["'][^>]+content\s*=\s*["']([^"']+)["']"#
        ),
        format!(
            r#"(?is)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]+(?:property|name)\s*=\s*["']{escaped}["']"#
        ),
    ];
    for pattern in &patterns {
        let re = compiled(pattern);
        if let Some(cap) = re.captures(html) {
            let text = clean_text(&cap[1]);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Strips tags, decodes the common HTML entities, and collapses whitespace.
pub(crate) fn clean_text(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    let decoded = decode_entities(&without_tags);
    WS_RE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}

/// Try to extract a balanced JSON object from the start of `s`.
///
/// Scans character-by-character tracking brace depth, respecting string
/// literals and escape sequences. Returns the shortest prefix of `s` that
/// forms a complete `{…}` object, or `None` if the object is unterminated.
pub(crate) fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            ']' => depth -= 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses the first price-looking number out of `text`.
///
/// Handles space/NBSP digit grouping ("1 299"), comma decimals ("12,99"),
/// and mixed separators ("1.299,00"): when both separators appear, the one
/// occurring last is the decimal separator. A single comma followed by
/// exactly three trailing digits is treated as a thousands separator.
pub(crate) fn parse_price(text: &str) -> Option<Decimal> {
    let raw = PRICE_RE.find(text)?.as_str();
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00a0}' && *c != '\u{202f}')
        .collect();
    let compact = compact.trim_end_matches(['.', ',']);

    let has_dot = compact.contains('.');
    let has_comma = compact.contains(',');

    let normalized = if has_dot && has_comma {
        let last_dot = compact.rfind('.').unwrap_or(0);
        let last_comma = compact.rfind(',').unwrap_or(0);
        if last_comma > last_dot {
            compact.replace('.', "").replace(',', ".")
        } else {
            compact.replace(',', "")
        }
    } else if has_comma {
        let after = &compact[compact.rfind(',').unwrap_or(0) + 1..];
        if compact.matches(',').count() == 1 && after.len() != 3 {
            compact.replace(',', ".")
        } else {
            compact.replace(',', "")
        }
    } else if compact.matches('.').count() > 1 {
        // "1.299.00" — keep the last dot as the decimal point.
        let last = compact.rfind('.').unwrap_or(0);
        let head = compact[..last].replace('.', "");
        format!("{head}{}", &compact[last..])
    } else {
        compact.to_string()
    };

    normalized.parse::<Decimal>().ok()
}

/// Parses the first integer out of `text`, ignoring digit-group separators.
pub(crate) fn parse_first_u64(text: &str) -> Option<u64> {
    let raw = INT_RE.find(text)?.as_str();
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok()
}

/// Parses the first decimal number out of `text`, accepting a comma as the
/// decimal separator ("4,5 out of 5").
pub(crate) fn parse_first_f64(text: &str) -> Option<f64> {
    let raw = FLOAT_RE.find(text)?.as_str();
    raw.replace(',', ".").parse::<f64>().ok()
}

/// Maps a currency symbol to its ISO 4217 code.
pub(crate) fn currency_from_symbol(symbol: &str) -> Option<&'static str> {
    match symbol.trim() {
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        "₹" => Some("INR"),
        "¥" => Some("JPY"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pattern_match_respects_order() {
        let html = r#"<h1 id="second">Fallback Title</h1><span id="first">Primary Title</span>"#;
        let got = first_pattern_match(
            html,
            &[
                r#"(?is)<span[^>]*id="first"[^>]*>(.*?)</span>"#,
                r#"(?is)<h1[^>]*id="second"[^>]*>(.*?)</h1>"#,
            ],
        );
        assert_eq!(got.as_deref(), Some("Primary Title"));
    }

    #[test]
    fn first_pattern_match_skips_empty_captures() {
        let html = r#"<span id="first">   </span><h1>Real Title</h1>"#;
        let got = first_pattern_match(
            html,
            &[
                r#"(?is)<span[^>]*id="first"[^>]*>(.*?)</span>"#,
                r"(?is)<h1[^>]*>(.*?)</h1>",
            ],
        );
        assert_eq!(got.as_deref(), Some("Real Title"));
    }

    #[test]
    fn repeated_patterns_reuse_the_compiled_regex() {
        let pattern = r"(?is)<h1[^>]*>(.*?)</h1>";
        let _ = first_pattern_match("<h1>a</h1>", &[pattern]);
        let _ = first_pattern_match("<h1>b</h1>", &[pattern]);
        assert!(PATTERN_CACHE
            .lock()
            .expect("pattern cache lock")
            .contains_key(pattern));
    }

    #[test]
    fn clean_text_strips_markup_and_entities() {
        assert_eq!(
            clean_text("  <b>Tom &amp; Jerry</b>\n  mug&nbsp;set "),
            "Tom & Jerry mug set"
        );
    }

    #[test]
    fn meta_content_handles_both_attribute_orders() {
        let a = r#"<meta property="og:title" content="From Meta">"#;
        let b = r#"<meta content="From Meta" property="og:title">"#;
        assert_eq!(meta_content(a, "og:title").as_deref(), Some("From Meta"));
        assert_eq!(meta_content(b, "og:title").as_deref(), Some("From Meta"));
        assert_eq!(meta_content(a, "og:image"), None);
    }

    #[test]
    fn extract_balanced_object_respects_strings_and_escapes() {
        let s = r#"{"a": "brace } in string", "b": {"c": "esc \" quote"}} trailing"#;
        let got = extract_balanced_object(s).unwrap();
        assert!(got.ends_with("}}"));
        assert!(serde_json::from_str::<serde_json::Value>(got).is_ok());
    }

    #[test]
    fn extract_balanced_object_rejects_unterminated() {
        assert_eq!(extract_balanced_object(r#"{"a": 1"#), None);
        assert_eq!(extract_balanced_object("not json"), None);
    }

    #[test]
    fn parse_price_handles_common_formats() {
        assert_eq!(parse_price("$19.99"), Some("19.99".parse().unwrap()));
        assert_eq!(parse_price("12,99 €"), Some("12.99".parse().unwrap()));
        assert_eq!(parse_price("1 299 FCFA"), Some("1299".parse().unwrap()));
        assert_eq!(parse_price("1.299,00"), Some("1299.00".parse().unwrap()));
        assert_eq!(parse_price("1,299"), Some("1299".parse().unwrap()));
        assert_eq!(parse_price("no digits"), None);
    }

    #[test]
    fn parse_first_u64_strips_group_separators() {
        assert_eq!(parse_first_u64("1,234 ratings"), Some(1234));
        assert_eq!(parse_first_u64("12 345 avis"), Some(12345));
        assert_eq!(parse_first_u64("none"), None);
    }

    #[test]
    fn parse_first_f64_accepts_comma_decimal() {
        assert_eq!(parse_first_f64("4,5 sur 5"), Some(4.5));
        assert_eq!(parse_first_f64("4.7 out of 5 stars"), Some(4.7));
    }
}
