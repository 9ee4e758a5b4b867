use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-level errors surfaced to the pipeline and callers.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Schema creation failed while opening the database
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

// ============================================================================
// Data Structures
// ============================================================================

/// A subscribed feed source.
///
/// `id` is a stable 64-bit hash of the URL (see [`crate::util::stable_id`]),
/// so the same subscription maps to the same row on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub category: Option<String>,
    pub logo_url: Option<String>,
    /// Epoch millis of the last completed refresh; `None` until first sync.
    pub last_sync_timestamp: Option<i64>,
}

/// A subscription about to be inserted; the store derives the id from the URL.
#[derive(Debug, Clone)]
pub struct NewFeedSource {
    pub url: String,
    pub title: String,
    pub category: Option<String>,
    pub logo_url: Option<String>,
}

/// A single article, either derived from a parsed channel by the save stage
/// or read back out of the store.
///
/// `id` is the stable hash of the item URL, which doubles as the dedup key
/// across refreshes. `date_string` is only populated on the read path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub feed_source: FeedSource,
    pub is_read: bool,
    pub is_bookmarked: bool,
    pub pub_date_millis: Option<i64>,
    pub date_string: Option<String>,
    pub comments_url: Option<String>,
}

// ============================================================================
// Row Types
// ============================================================================

/// Joined feed_item + feed_source row for the read path.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedItemRow {
    pub url_hash: i64,
    pub url: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub pub_date: Option<i64>,
    pub comments_url: Option<String>,
    pub is_read: bool,
    pub is_bookmarked: bool,
    pub source_id: i64,
    pub source_url: String,
    pub source_title: String,
    pub source_category: Option<String>,
    pub source_logo_url: Option<String>,
    pub source_last_sync: Option<i64>,
}

impl FeedItemRow {
    pub(crate) fn into_feed_item(self) -> FeedItem {
        FeedItem {
            id: self.url_hash,
            url: self.url,
            title: self.title,
            subtitle: self.subtitle,
            content: self.content,
            image_url: self.image_url,
            feed_source: FeedSource {
                id: self.source_id,
                url: self.source_url,
                title: self.source_title,
                category: self.source_category,
                logo_url: self.source_logo_url,
                last_sync_timestamp: self.source_last_sync,
            },
            is_read: self.is_read,
            is_bookmarked: self.is_bookmarked,
            pub_date_millis: self.pub_date,
            date_string: self.pub_date.and_then(crate::util::format_date),
            comments_url: self.comments_url,
        }
    }
}

/// feed_source row, straight off the table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedSourceRow {
    pub url_hash: i64,
    pub url: String,
    pub title: String,
    pub category: Option<String>,
    pub logo_url: Option<String>,
    pub last_sync_timestamp: Option<i64>,
}

impl FeedSourceRow {
    pub(crate) fn into_feed_source(self) -> FeedSource {
        FeedSource {
            id: self.url_hash,
            url: self.url,
            title: self.title,
            category: self.category,
            logo_url: self.logo_url,
            last_sync_timestamp: self.last_sync_timestamp,
        }
    }
}
