//! Live integration tests for shopimport-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/shopimport-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{Duration, Utc};
use shopimport_db::{
    insert_import_log, list_recent_imports, lookup_fresh, upsert_cached_product, ImportStatus,
    NewImportLog,
};

fn sample_record(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "price": "19.99",
        "currency": "USD",
    })
}

// ---------------------------------------------------------------------------
// product_cache
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cache_lookup_returns_fresh_entry(pool: sqlx::PgPool) {
    let url = "https://www.amazon.com/dp/B0EXAMPLE1";
    let expires = Utc::now() + Duration::days(7);

    upsert_cached_product(&pool, url, "amazon", "B0EXAMPLE1", &sample_record("Widget"), expires)
        .await
        .expect("upsert failed");

    let hit = lookup_fresh(&pool, url, Utc::now())
        .await
        .expect("lookup failed")
        .expect("expected a cache hit");

    assert_eq!(hit.url, url);
    assert_eq!(hit.platform, "amazon");
    assert_eq!(hit.product_id, "B0EXAMPLE1");
    assert_eq!(hit.record["name"], "Widget");
    assert_eq!(hit.expires_at.timestamp(), expires.timestamp());
}

#[sqlx::test(migrations = "../../migrations")]
async fn cache_lookup_skips_expired_entry(pool: sqlx::PgPool) {
    let url = "https://www.aliexpress.com/item/1005001234567890.html";
    let expired = Utc::now() - Duration::hours(1);

    upsert_cached_product(
        &pool,
        url,
        "aliexpress",
        "1005001234567890",
        &sample_record("Gadget"),
        expired,
    )
    .await
    .expect("upsert failed");

    let hit = lookup_fresh(&pool, url, Utc::now()).await.expect("lookup failed");
    assert!(hit.is_none(), "expired entry must not be served");
}

#[sqlx::test(migrations = "../../migrations")]
async fn cache_upsert_overwrites_without_duplicating(pool: sqlx::PgPool) {
    let url = "https://www.jumia.com.ng/widget-12345.html";
    let first_expires = Utc::now() - Duration::hours(1);
    let second_expires = Utc::now() + Duration::days(7);

    let first_id =
        upsert_cached_product(&pool, url, "jumia", "12345", &sample_record("Old"), first_expires)
            .await
            .expect("first upsert failed");

    let second_id =
        upsert_cached_product(&pool, url, "jumia", "12345", &sample_record("New"), second_expires)
            .await
            .expect("second upsert failed");

    assert_eq!(first_id, second_id, "upsert must reuse the existing row");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_cache WHERE url = $1")
        .bind(url)
        .fetch_one(&pool)
        .await
        .expect("count query failed");
    assert_eq!(count, 1);

    let hit = lookup_fresh(&pool, url, Utc::now())
        .await
        .expect("lookup failed")
        .expect("refreshed entry should be fresh again");
    assert_eq!(hit.record["name"], "New");
}

// ---------------------------------------------------------------------------
// import_log
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn import_log_records_success_and_failure(pool: sqlx::PgPool) {
    let record = sample_record("Widget");

    insert_import_log(
        &pool,
        &NewImportLog {
            user_id: "user-a",
            platform: "amazon",
            url: "https://www.amazon.com/dp/B0EXAMPLE1",
            record: Some(&record),
            status: ImportStatus::Success,
            error_message: None,
        },
    )
    .await
    .expect("success insert failed");

    insert_import_log(
        &pool,
        &NewImportLog {
            user_id: "user-a",
            platform: "amazon",
            url: "https://www.amazon.com/dp/B0EXAMPLE2",
            record: None,
            status: ImportStatus::Failed,
            error_message: Some("price not found"),
        },
    )
    .await
    .expect("failed insert failed");

    let rows = list_recent_imports(&pool, "user-a", 10).await.expect("list failed");
    assert_eq!(rows.len(), 2);

    // Newest first.
    let newest = &rows[0];
    assert_eq!(newest.status, "failed");
    assert_eq!(newest.error_message.as_deref(), Some("price not found"));
    assert!(newest.record.is_none());

    let oldest = &rows[1];
    assert_eq!(oldest.status, "success");
    assert_eq!(oldest.record.as_ref().map(|r| &r["name"]), Some(&serde_json::json!("Widget")));
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_log_is_scoped_per_user(pool: sqlx::PgPool) {
    for user in ["user-a", "user-b"] {
        insert_import_log(
            &pool,
            &NewImportLog {
                user_id: user,
                platform: "jumia",
                url: "https://www.jumia.com.ng/widget-12345.html",
                record: None,
                status: ImportStatus::Failed,
                error_message: Some("fetch timed out"),
            },
        )
        .await
        .expect("insert failed");
    }

    let rows = list_recent_imports(&pool, "user-a", 10).await.expect("list failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "user-a");
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_log_rejects_unknown_status(pool: sqlx::PgPool) {
    let result = sqlx::query(
        "INSERT INTO import_log (user_id, platform, url, status) VALUES ($1, $2, $3, $4)",
    )
    .bind("user-a")
    .bind("amazon")
    .bind("https://www.amazon.com/dp/B0EXAMPLE1")
    .bind("pending")
    .execute(&pool)
    .await;

    assert!(result.is_err(), "CHECK constraint should reject unknown statuses");
}
