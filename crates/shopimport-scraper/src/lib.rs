pub mod client;
pub mod error;
pub mod extract;
mod html;
mod jsonld;

pub use client::PageFetcher;
pub use error::ScrapeError;
pub use extract::{extract_product, product_id_for};
