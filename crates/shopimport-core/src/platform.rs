//! Source platform identification.
//!
//! A platform is one of the fixed set of third-party retail sites the import
//! pipeline knows how to read. Identification is a pure function over the
//! listing URL: no network access, no side effects.

use serde::{Deserialize, Serialize};

/// A supported source marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Aliexpress,
    Amazon,
    Jumia,
}

/// Human-readable metadata for one supported platform, served by the
/// read-only platforms endpoint and the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub id: Platform,
    pub name: &'static str,
    pub description: &'static str,
    pub example_url: &'static str,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Aliexpress, Platform::Amazon, Platform::Jumia];

    /// Classify a listing URL into a known platform.
    ///
    /// Matches on host substrings, case-insensitively. `amazon.` and `jumia.`
    /// are matched without a TLD because both operate many country domains
    /// (amazon.com/.fr/.de, jumia.ci/.ng/.ke, ...). Returns `None` for any
    /// unrecognized host; callers treat that as a user input error, not a
    /// scraping failure.
    #[must_use]
    pub fn identify(url: &str) -> Option<Platform> {
        let lowered = url.to_ascii_lowercase();
        if lowered.contains("aliexpress.com") {
            Some(Platform::Aliexpress)
        } else if lowered.contains("amazon.") {
            Some(Platform::Amazon)
        } else if lowered.contains("jumia.") {
            Some(Platform::Jumia)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Aliexpress => "aliexpress",
            Platform::Amazon => "amazon",
            Platform::Jumia => "jumia",
        }
    }

    #[must_use]
    pub fn info(self) -> PlatformInfo {
        match self {
            Platform::Aliexpress => PlatformInfo {
                id: self,
                name: "AliExpress",
                description: "Global B2C marketplace",
                example_url: "https://www.aliexpress.com/item/1005001234567890.html",
            },
            Platform::Amazon => PlatformInfo {
                id: self,
                name: "Amazon",
                description: "Global marketplace",
                example_url: "https://www.amazon.com/dp/B08N5WRWNW",
            },
            Platform::Jumia => PlatformInfo {
                id: self,
                name: "Jumia",
                description: "Pan-African e-commerce marketplace",
                example_url: "https://www.jumia.ci/product-name-12345.html",
            },
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aliexpress" => Ok(Platform::Aliexpress),
            "amazon" => Ok(Platform::Amazon),
            "jumia" => Ok(Platform::Jumia),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}
