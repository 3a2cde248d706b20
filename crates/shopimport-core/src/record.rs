//! The normalized product record produced by an extraction.
//!
//! A `ProductRecord` is immutable once created: a re-import of the same
//! listing produces a fresh record that replaces the cached one rather than
//! mutating it. All payloads use camelCase on the wire because the record is
//! re-published verbatim to JSON consumers (shop pages, dashboard).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// A normalized extraction result for one retail listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// ISO 4217 code, derived from the page where possible.
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u32>,
    /// Ordered; the first image doubles as the thumbnail.
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub specifications: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ProductVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<Seller>,
    /// Average rating on a 0–5 scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    pub in_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<ShippingInfo>,
    pub source: ProductSource,
}

/// Where a record came from. `platform` and `product_id` are always present
/// and non-empty; extraction fails outright when the product id cannot be
/// derived from the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSource {
    pub platform: Platform,
    pub url: String,
    pub product_id: String,
    pub extracted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub name: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<String>,
    pub free_shipping: bool,
}

impl ProductRecord {
    /// Builds a minimal record with only the load-bearing fields set.
    /// Extraction strategies start from this and fill in what the page
    /// yields.
    #[must_use]
    pub fn new(
        name: String,
        description: String,
        price: Decimal,
        currency: String,
        source: ProductSource,
    ) -> Self {
        Self {
            name,
            description,
            price,
            currency,
            original_price: None,
            discount_percent: None,
            images: Vec::new(),
            thumbnail: None,
            category: None,
            tags: None,
            specifications: HashMap::new(),
            features: Vec::new(),
            variants: Vec::new(),
            seller: None,
            rating: None,
            review_count: None,
            in_stock: true,
            shipping_info: None,
            source,
        }
    }
}
