use crate::util::stable_id;

use super::schema::Database;
use super::types::{DatabaseError, FeedSource, FeedSourceRow, NewFeedSource};

impl Database {
    /// List all subscribed feed sources.
    pub async fn feed_sources(&self) -> Result<Vec<FeedSource>, DatabaseError> {
        let rows: Vec<FeedSourceRow> = sqlx::query_as(
            r#"
            SELECT url_hash, url, title, category, logo_url, last_sync_timestamp
            FROM feed_source
            ORDER BY title
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedSourceRow::into_feed_source).collect())
    }

    /// Insert subscriptions, upserting on URL.
    ///
    /// The id is derived from the URL, so re-subscribing to a known feed
    /// refreshes its title/category/logo and keeps its items and sync state.
    pub async fn insert_feed_sources(
        &self,
        sources: &[NewFeedSource],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for source in sources {
            sqlx::query(
                r#"
                INSERT INTO feed_source (url_hash, url, title, category, logo_url)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(url_hash) DO UPDATE SET
                    title = excluded.title,
                    category = excluded.category,
                    logo_url = COALESCE(excluded.logo_url, logo_url)
            "#,
            )
            .bind(stable_id(&source.url))
            .bind(&source.url)
            .bind(&source.title)
            .bind(&source.category)
            .bind(&source.logo_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a subscription; its items go with it (ON DELETE CASCADE).
    pub async fn delete_feed_source(&self, source_id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM feed_source WHERE url_hash = ?")
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Update a source's last-sync timestamp.
    ///
    /// The save stage normally updates the timestamp inside the same
    /// transaction as the item insert (see `insert_feed_items`); this
    /// standalone form exists for sources whose refresh produced no items.
    pub async fn update_last_sync(
        &self,
        source_id: i64,
        timestamp_millis: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE feed_source SET last_sync_timestamp = ? WHERE url_hash = ?")
            .bind(timestamp_millis)
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Set a source's logo URL, discovered from its parsed channel.
    pub async fn update_logo_url(
        &self,
        source_id: i64,
        logo_url: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE feed_source SET logo_url = ? WHERE url_hash = ?")
            .bind(logo_url)
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
