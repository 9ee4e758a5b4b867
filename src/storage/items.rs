use crate::util::now_millis;

use super::schema::Database;
use super::types::{DatabaseError, FeedItem, FeedItemRow};

impl Database {
    /// Persist a refreshed source's items and advance its last-sync
    /// timestamp, atomically.
    ///
    /// Items are upserted on their URL hash: content fields are refreshed,
    /// while `is_read`, `is_bookmarked`, and `is_new` are left alone so a
    /// re-fetch never resurrects an already-read item. The source timestamp
    /// update rides in the same transaction, so a failure leaves the source
    /// due for retry on the next run.
    pub async fn insert_feed_items(
        &self,
        source_id: i64,
        items: &[FeedItem],
        last_sync_millis: i64,
    ) -> Result<(), DatabaseError> {
        let fetched_at = now_millis();
        let mut tx = self.pool.begin().await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO feed_item (
                    url_hash, url, title, subtitle, content, image_url,
                    feed_source_id, pub_date, comments_url, fetched_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(url_hash) DO UPDATE SET
                    title = excluded.title,
                    subtitle = excluded.subtitle,
                    image_url = excluded.image_url,
                    pub_date = excluded.pub_date,
                    comments_url = excluded.comments_url
            "#,
            )
            .bind(item.id)
            .bind(&item.url)
            .bind(&item.title)
            .bind(&item.subtitle)
            .bind(&item.content)
            .bind(&item.image_url)
            .bind(source_id)
            .bind(item.pub_date_millis)
            .bind(&item.comments_url)
            .bind(fetched_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE feed_source SET last_sync_timestamp = ? WHERE url_hash = ?")
            .bind(last_sync_millis)
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Read back all stored items, newest first.
    pub(crate) async fn feed_item_rows(&self) -> Result<Vec<FeedItemRow>, DatabaseError> {
        let rows: Vec<FeedItemRow> = sqlx::query_as(
            r#"
            SELECT
                i.url_hash, i.url, i.title, i.subtitle, i.content, i.image_url,
                i.pub_date, i.comments_url, i.is_read, i.is_bookmarked,
                s.url_hash AS source_id,
                s.url AS source_url,
                s.title AS source_title,
                s.category AS source_category,
                s.logo_url AS source_logo_url,
                s.last_sync_timestamp AS source_last_sync
            FROM feed_item i
            JOIN feed_source s ON i.feed_source_id = s.url_hash
            ORDER BY i.pub_date DESC, i.fetched_at DESC
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Read back all stored items as domain values, newest first.
    pub async fn feed_items(&self) -> Result<Vec<FeedItem>, DatabaseError> {
        let rows = self.feed_item_rows().await?;
        Ok(rows.into_iter().map(FeedItemRow::into_feed_item).collect())
    }

    /// Clear the "new" flag on every stored item.
    ///
    /// Runs at the start of a pipeline run so that only items inserted by
    /// the run itself count as new.
    pub async fn mark_existing_items_not_new(&self) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE feed_item SET is_new = 0 WHERE is_new = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Set the read flag on a batch of items.
    pub async fn update_read_status(
        &self,
        item_ids: &[i64],
        is_read: bool,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for id in item_ids {
            sqlx::query("UPDATE feed_item SET is_read = ? WHERE url_hash = ?")
                .bind(is_read)
                .bind(*id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Mark every stored item as read.
    pub async fn mark_all_read(&self) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE feed_item SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Set the bookmark flag on an item.
    pub async fn update_bookmark_status(
        &self,
        item_id: i64,
        is_bookmarked: bool,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE feed_item SET is_bookmarked = ? WHERE url_hash = ?")
            .bind(is_bookmarked)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Retention sweep: drop items published before the threshold.
    ///
    /// Bookmarked items are kept regardless of age. Items with no publish
    /// date are kept too; there is nothing to age them by.
    pub async fn delete_items_older_than(
        &self,
        threshold_millis: i64,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM feed_item WHERE pub_date IS NOT NULL AND pub_date < ? AND is_bookmarked = 0",
        )
        .bind(threshold_millis)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
