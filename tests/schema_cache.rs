//! Schema cache behaviour against a mock metadata API.

use std::sync::Arc;
use std::time::Duration;

use schema_proxy::lifecycle::Shutdown;
use schema_proxy::schema::{SchemaCache, SchemaLoadError, SchemaLookup};

mod common;
use common::{default_tables, MockMeta, MockTable};

#[tokio::test]
async fn test_initial_load_indexes_tables_and_links() {
    let meta = MockMeta::start(default_tables()).await;
    let cache = SchemaCache::new(meta.client());
    assert!(!cache.is_ready());

    let snapshot = cache.load_initial().await.unwrap();
    assert!(cache.is_ready());
    assert_eq!(snapshot.base_id(), "p1");
    assert_eq!(snapshot.table_count(), 2);
    assert_eq!(snapshot.relationship_table_count(), 1);

    assert_eq!(cache.resolve_table("products").as_deref(), Some("T1"));
    assert_eq!(cache.resolve_table("NC_ORDERS").as_deref(), Some("T2"));
    assert_eq!(
        cache.resolve_relationship_field("T1", "related orders").as_deref(),
        Some("F1")
    );
    assert!(cache.resolve_relationship_field("T2", "related orders").is_none());
}

#[tokio::test]
async fn test_refresh_swaps_snapshot() {
    let meta = MockMeta::start(default_tables()).await;
    let cache = SchemaCache::new(meta.client());
    let before = cache.load_initial().await.unwrap();

    meta.set_tables(vec![
        MockTable::new("T1", "Products", "nc_products"),
        MockTable::new("T3", "Invoices", "nc_invoices"),
    ]);
    cache.refresh().await.unwrap();

    assert_eq!(cache.resolve_table("invoices").as_deref(), Some("T3"));
    assert!(cache.resolve_table("orders").is_none());
    assert!(cache.resolve_relationship_field("T1", "related orders").is_none());

    // Holders of the old snapshot keep a consistent view.
    assert_eq!(before.table_id("orders"), Some("T2"));
    assert!(before.table_id("invoices").is_none());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let meta = MockMeta::start(default_tables()).await;
    let cache = SchemaCache::new(meta.client());
    let before = cache.load_initial().await.unwrap();

    meta.set_failing(true);
    let err = cache.refresh().await.unwrap_err();
    assert!(matches!(err, SchemaLoadError::Status { status: 500, .. }));

    let current = cache.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &current));
    assert_eq!(cache.resolve_table("products").as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_malformed_table_list_keeps_previous_snapshot() {
    let meta = MockMeta::start(default_tables()).await;
    let cache = SchemaCache::new(meta.client());
    let before = cache.load_initial().await.unwrap();

    meta.set_malformed(true);
    let err = cache.refresh().await.unwrap_err();
    assert!(matches!(err, SchemaLoadError::Parse { .. }));

    assert!(Arc::ptr_eq(&before, &cache.snapshot().unwrap()));
    assert_eq!(cache.resolve_table("products").as_deref(), Some("T1"));
    assert_eq!(cache.stats().table_count, 2);
}

#[tokio::test]
async fn test_initial_load_failure_leaves_cache_empty() {
    let meta = MockMeta::start(default_tables()).await;
    meta.set_failing(true);
    let cache = SchemaCache::new(meta.client());

    assert!(cache.load_initial().await.is_err());
    assert!(!cache.is_ready());
    assert!(cache.resolve_table("products").is_none());
    assert!(!cache.stats().ready);
}

#[tokio::test]
async fn test_failed_detail_yields_no_link_fields() {
    let tables = vec![
        MockTable::new("T1", "Products", "nc_products").with_link("F1", "Related Orders"),
        MockTable::new("T2", "Orders", "nc_orders").with_link("F2", "Products"),
    ];
    let meta = MockMeta::start(tables).await;
    meta.fail_details_for("T2");
    let cache = SchemaCache::new(meta.client());

    let snapshot = cache.load_initial().await.unwrap();
    assert_eq!(snapshot.table_count(), 2);
    assert_eq!(snapshot.relationship_table_count(), 1);
    assert_eq!(cache.resolve_table("orders").as_deref(), Some("T2"));
    assert!(cache.resolve_relationship_field("T2", "products").is_none());
    assert_eq!(
        cache.resolve_relationship_field("T1", "Related Orders").as_deref(),
        Some("F1")
    );
}

#[tokio::test]
async fn test_background_refresh_runs_and_stops_on_shutdown() {
    let meta = MockMeta::start(default_tables()).await;
    let cache = Arc::new(SchemaCache::new(meta.client()));
    cache.load_initial().await.unwrap();
    let initial_calls = meta.list_calls();

    let shutdown = Shutdown::new();
    let handle = cache.start_background_refresh(Duration::from_millis(50), shutdown.subscribe());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(meta.list_calls() > initial_calls);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("refresh task did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_stats_report_snapshot() {
    let meta = MockMeta::start(default_tables()).await;
    let cache = SchemaCache::new(meta.client());
    cache.load_initial().await.unwrap();

    let stats = cache.stats();
    assert!(stats.ready);
    assert_eq!(stats.table_count, 2);
    assert_eq!(stats.relationship_table_count, 1);
    assert!(stats.loaded_at.is_some());
}
