//! Store behavior tests: upsert semantics, cascade deletes, retention,
//! read/bookmark flags. Each test gets its own in-memory SQLite database.

use feedflow::storage::{Database, FeedItem, FeedSource, NewFeedSource};
use feedflow::util::{now_millis, stable_id};
use pretty_assertions::assert_eq;

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn test_source(url: &str, title: &str) -> FeedSource {
    FeedSource {
        id: stable_id(url),
        url: url.to_string(),
        title: title.to_string(),
        category: None,
        logo_url: None,
        last_sync_timestamp: None,
    }
}

async fn subscribe(db: &Database, url: &str, title: &str) -> FeedSource {
    db.insert_feed_sources(&[NewFeedSource {
        url: url.to_string(),
        title: title.to_string(),
        category: None,
        logo_url: None,
    }])
    .await
    .unwrap();
    test_source(url, title)
}

fn item(url: &str, title: &str, source: &FeedSource, pub_date: Option<i64>) -> FeedItem {
    FeedItem {
        id: stable_id(url),
        url: url.to_string(),
        title: title.to_string(),
        subtitle: None,
        content: None,
        image_url: None,
        feed_source: source.clone(),
        is_read: false,
        is_bookmarked: false,
        pub_date_millis: pub_date,
        date_string: None,
        comments_url: None,
    }
}

// ============================================================================
// Sources
// ============================================================================

#[tokio::test]
async fn test_subscribe_appears_in_list() {
    let db = test_db().await;
    subscribe(&db, "https://example.com/feed.xml", "Example").await;

    let sources = db.feed_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].url, "https://example.com/feed.xml");
    assert_eq!(sources[0].title, "Example");
    assert_eq!(sources[0].last_sync_timestamp, None);
}

#[tokio::test]
async fn test_resubscribe_updates_title_and_keeps_sync_state() {
    let db = test_db().await;
    let source = subscribe(&db, "https://example.com/feed.xml", "Old Title").await;
    db.update_last_sync(source.id, 1_700_000_000_000).await.unwrap();

    subscribe(&db, "https://example.com/feed.xml", "New Title").await;

    let sources = db.feed_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].title, "New Title");
    assert_eq!(sources[0].last_sync_timestamp, Some(1_700_000_000_000));
}

#[tokio::test]
async fn test_delete_source_cascades_to_items() {
    let db = test_db().await;
    let source = subscribe(&db, "https://example.com/feed.xml", "Example").await;
    db.insert_feed_items(
        source.id,
        &[item("https://example.com/1", "One", &source, None)],
        now_millis(),
    )
    .await
    .unwrap();
    assert_eq!(db.feed_items().await.unwrap().len(), 1);

    db.delete_feed_source(source.id).await.unwrap();

    assert!(db.feed_sources().await.unwrap().is_empty());
    assert!(db.feed_items().await.unwrap().is_empty());
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
async fn test_insert_items_updates_last_sync_atomically() {
    let db = test_db().await;
    let source = subscribe(&db, "https://example.com/feed.xml", "Example").await;

    db.insert_feed_items(
        source.id,
        &[
            item("https://example.com/1", "One", &source, Some(1_700_000_000_000)),
            item("https://example.com/2", "Two", &source, Some(1_700_000_100_000)),
        ],
        1_700_000_200_000,
    )
    .await
    .unwrap();

    let items = db.feed_items().await.unwrap();
    assert_eq!(items.len(), 2);
    // Newest first
    assert_eq!(items[0].title, "Two");
    assert_eq!(items[1].title, "One");

    let sources = db.feed_sources().await.unwrap();
    assert_eq!(sources[0].last_sync_timestamp, Some(1_700_000_200_000));
}

#[tokio::test]
async fn test_refetch_preserves_read_and_bookmark_flags() {
    let db = test_db().await;
    let source = subscribe(&db, "https://example.com/feed.xml", "Example").await;
    let one = item("https://example.com/1", "One", &source, None);

    db.insert_feed_items(source.id, &[one.clone()], now_millis())
        .await
        .unwrap();
    db.update_read_status(&[one.id], true).await.unwrap();
    db.update_bookmark_status(one.id, true).await.unwrap();

    // Same item comes back on the next refresh with an edited title
    let edited = item("https://example.com/1", "One (edited)", &source, None);
    db.insert_feed_items(source.id, &[edited], now_millis())
        .await
        .unwrap();

    let items = db.feed_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "One (edited)");
    assert!(items[0].is_read);
    assert!(items[0].is_bookmarked);
}

#[tokio::test]
async fn test_read_flags() {
    let db = test_db().await;
    let source = subscribe(&db, "https://example.com/feed.xml", "Example").await;
    let one = item("https://example.com/1", "One", &source, None);
    let two = item("https://example.com/2", "Two", &source, None);
    db.insert_feed_items(source.id, &[one.clone(), two], now_millis())
        .await
        .unwrap();

    db.update_read_status(&[one.id], true).await.unwrap();
    let items = db.feed_items().await.unwrap();
    assert_eq!(items.iter().filter(|i| i.is_read).count(), 1);

    db.mark_all_read().await.unwrap();
    let items = db.feed_items().await.unwrap();
    assert!(items.iter().all(|i| i.is_read));

    db.update_read_status(&[one.id], false).await.unwrap();
    let items = db.feed_items().await.unwrap();
    assert_eq!(items.iter().filter(|i| !i.is_read).count(), 1);
}

#[tokio::test]
async fn test_item_date_string_is_formatted_on_read() {
    let db = test_db().await;
    let source = subscribe(&db, "https://example.com/feed.xml", "Example").await;
    db.insert_feed_items(
        source.id,
        &[item(
            "https://example.com/1",
            "One",
            &source,
            Some(1_714_564_800_000),
        )],
        now_millis(),
    )
    .await
    .unwrap();

    let items = db.feed_items().await.unwrap();
    assert_eq!(items[0].date_string.as_deref(), Some("2024-05-01 12:00"));
}

// ============================================================================
// Retention
// ============================================================================

#[tokio::test]
async fn test_retention_drops_only_old_unbookmarked_items() {
    let db = test_db().await;
    let source = subscribe(&db, "https://example.com/feed.xml", "Example").await;
    let now = now_millis();
    let week = 7 * 24 * 60 * 60 * 1000;

    let old = item("https://example.com/old", "Old", &source, Some(now - 2 * week));
    let old_bookmarked = item(
        "https://example.com/kept",
        "Kept",
        &source,
        Some(now - 2 * week),
    );
    let recent = item("https://example.com/new", "New", &source, Some(now));
    let undated = item("https://example.com/undated", "Undated", &source, None);

    db.insert_feed_items(
        source.id,
        &[old, old_bookmarked.clone(), recent, undated],
        now,
    )
    .await
    .unwrap();
    db.update_bookmark_status(old_bookmarked.id, true)
        .await
        .unwrap();

    let dropped = db.delete_items_older_than(now - week).await.unwrap();
    assert_eq!(dropped, 1);

    let remaining: Vec<String> = db
        .feed_items()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert!(remaining.contains(&"Kept".to_string()));
    assert!(remaining.contains(&"New".to_string()));
    assert!(remaining.contains(&"Undated".to_string()));
    assert!(!remaining.contains(&"Old".to_string()));
}
