//! Command handlers for the CLI.
//!
//! `import` talks to the upstream site directly and needs no database, so it
//! reads only the fetch-related env overrides instead of the full app config.

use shopimport_core::Platform;
use shopimport_scraper::{extract_product, PageFetcher};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Extract one listing and print the record as pretty JSON on stdout.
pub(crate) async fn run_import(url: &str) -> anyhow::Result<()> {
    let timeout_secs = std::env::var("SHOPIMPORT_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = std::env::var("SHOPIMPORT_USER_AGENT")
        .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

    let fetcher = PageFetcher::new(timeout_secs, &user_agent)?;
    let record = extract_product(&fetcher, url).await?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub(crate) fn run_platforms() {
    for platform in Platform::ALL {
        let info = platform.info();
        println!("{:<12} {}", info.id.as_str(), info.name);
        println!("{:<12} {}", "", info.description);
        println!("{:<12} e.g. {}", "", info.example_url);
        println!();
    }
}

/// List recent import log entries, newest first.
pub(crate) async fn run_recent(limit: i64, user: Option<&str>) -> anyhow::Result<()> {
    let pool = shopimport_db::connect_pool_from_env().await?;

    let rows = match user {
        Some(user_id) => shopimport_db::list_recent_imports(&pool, user_id, limit).await?,
        None => shopimport_db::list_all_recent_imports(&pool, limit).await?,
    };

    if rows.is_empty() {
        println!("no import log entries");
        return Ok(());
    }

    for row in rows {
        let outcome = match row.error_message.as_deref() {
            Some(message) => format!("{} ({message})", row.status),
            None => row.status.clone(),
        };
        println!(
            "{}  {:<10} {:<8} {}",
            row.created_at.format("%Y-%m-%d %H:%M:%S"),
            row.platform,
            outcome,
            row.url
        );
    }

    Ok(())
}
