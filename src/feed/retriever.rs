use std::collections::HashSet;
use std::sync::Mutex;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::storage::{Database, DatabaseError, FeedItem, FeedSource, NewFeedSource};
use crate::util::{now_millis, sanitize_feed_url, UrlError};

use super::concurrency::ConcurrencyPolicy;
use super::fetcher::{FeedClient, FetchError};
use super::items::map_feed_items;
use super::parser::ParsedChannel;
use super::staleness::should_refresh;
use super::status::{ErrorState, FeedUpdateStatus};

/// Default retention window for old items: one week.
const DEFAULT_RETENTION_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Errors from adding a subscription.
#[derive(Debug, Error)]
pub enum AddFeedError {
    #[error(transparent)]
    Url(#[from] UrlError),
    /// The URL did not serve a parseable feed
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A parsed channel paired with the source it came from.
///
/// Exists only inside the pipeline, on the channel between the fetch and
/// save stages; never persisted.
struct FetchedChannel {
    channel: ParsedChannel,
    source: FeedSource,
}

/// Orchestrates feed refreshes and owns the observable pipeline state.
///
/// A refresh run (`fetch_feeds`) fans the subscription list out to a bounded
/// pool of fetch workers, pipes parsed channels through an unbounded queue
/// into a bounded pool of save workers, and reports progress through a watch
/// channel. Per-source failures are isolated: a dead feed or a failed write
/// never stops the rest of the run.
///
/// The whole run lives inside the `fetch_feeds` future; dropping that future
/// cancels both stages. The pending set is left dirty in that case, which is
/// fine: the next run rebuilds it from scratch and staleness is judged from
/// persisted last-sync timestamps.
pub struct FeedRetriever {
    db: Database,
    client: FeedClient,
    policy: ConcurrencyPolicy,
    retention_millis: i64,
    update_tx: watch::Sender<FeedUpdateStatus>,
    error_tx: watch::Sender<Option<ErrorState>>,
    /// Sources not yet completed in the current run, keyed by source id.
    /// Each source appears at most once per run.
    pending: Mutex<HashSet<i64>>,
}

impl FeedRetriever {
    pub fn new(db: Database, client: FeedClient) -> Self {
        Self {
            db,
            client,
            policy: ConcurrencyPolicy::default(),
            retention_millis: DEFAULT_RETENTION_MILLIS,
            update_tx: watch::Sender::new(FeedUpdateStatus::Finished),
            error_tx: watch::Sender::new(None),
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the default stage-sizing policy (tests, configuration).
    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the default one-week retention window.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_millis = i64::from(days) * 24 * 60 * 60 * 1000;
        self
    }

    /// Observable refresh progress. Observers see the latest value.
    pub fn update_state(&self) -> watch::Receiver<FeedUpdateStatus> {
        self.update_tx.subscribe()
    }

    /// Observable most-recent pipeline error (overwrite-only side channel).
    pub fn error_state(&self) -> watch::Receiver<Option<ErrorState>> {
        self.error_tx.subscribe()
    }

    // ========================================================================
    // Refresh pipeline
    // ========================================================================

    /// Runs one full refresh cycle over every subscribed source.
    ///
    /// With `report_progress`, the update state walks Started →
    /// InProgress(0, n) → ... → Finished; without it the state stays
    /// Finished for the whole run (silent background refresh). With
    /// `force_refresh`, the staleness window is ignored and every source is
    /// refetched.
    ///
    /// # Errors
    ///
    /// Only storage failures *before* the pipeline starts (listing sources,
    /// resetting new-flags) abort the run. Per-source fetch, parse, and
    /// persistence failures are recorded in the error state and skipped.
    pub async fn fetch_feeds(
        &self,
        report_progress: bool,
        force_refresh: bool,
    ) -> Result<(), DatabaseError> {
        if report_progress {
            self.update_tx.send_replace(FeedUpdateStatus::Started);
        } else {
            self.update_tx.send_replace(FeedUpdateStatus::Finished);
        }

        let sources = match self.db.feed_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list feed sources");
                self.error_tx.send_replace(Some(ErrorState::Database));
                self.update_tx.send_replace(FeedUpdateStatus::Finished);
                return Err(e);
            }
        };

        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.clear();
            pending.extend(sources.iter().map(|source| source.id));
        }

        if sources.is_empty() {
            self.update_tx.send_replace(FeedUpdateStatus::NoSources);
            return Ok(());
        }

        if let Err(e) = self.db.mark_existing_items_not_new().await {
            tracing::error!(error = %e, "Failed to reset new-item flags");
            self.error_tx.send_replace(Some(ErrorState::Database));
            self.update_tx.send_replace(FeedUpdateStatus::Finished);
            return Err(e);
        }

        // Stage sizing is decided once per run, from the total source count.
        let total = sources.len();
        let fetchers = self.policy.fetchers_for(total);
        let savers = self.policy.savers_for(total);
        tracing::debug!(
            total = total,
            fetchers = fetchers,
            savers = savers,
            force_refresh = force_refresh,
            "Starting refresh pipeline"
        );

        if report_progress {
            self.update_tx
                .send_replace(FeedUpdateStatus::InProgress { refreshed: 0, total });
        }

        let now = now_millis();
        let (tx, rx) = mpsc::unbounded_channel::<FetchedChannel>();

        // Fetch stage: sources are handed to workers in FIFO order, up to
        // `fetchers` in flight. Completion order is up to the scheduler.
        let fetch_stage = async move {
            stream::iter(sources)
                .for_each_concurrent(fetchers, |source| {
                    let tx = tx.clone();
                    async move {
                        self.fetch_source(source, force_refresh, now, report_progress, &tx)
                            .await;
                    }
                })
                .await;
            // All fetch workers done; closing the channel lets the save
            // stage drain and finish.
            drop(tx);
        };

        // Save stage: drains the unbounded queue with up to `savers`
        // concurrent writers, so a slow save never blocks fetch dispatch.
        let save_stage = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|fetched| (fetched, rx))
        })
        .for_each_concurrent(savers, |fetched| async move {
            self.save_channel(fetched, report_progress).await;
        });

        tokio::join!(fetch_stage, save_stage);
        Ok(())
    }

    async fn fetch_source(
        &self,
        source: FeedSource,
        force_refresh: bool,
        now_millis: i64,
        report_progress: bool,
        tx: &mpsc::UnboundedSender<FetchedChannel>,
    ) {
        tracing::debug!(url = %source.url, "-> fetching");

        if !should_refresh(source.last_sync_timestamp, now_millis, force_refresh) {
            tracing::debug!(url = %source.url, "Synced within the hour, skipping");
            self.complete_source(source.id, report_progress);
            return;
        }

        match self.client.fetch_and_parse(&source.url).await {
            Ok(channel) => {
                // Send only fails when the save stage is gone, i.e. the run
                // is being torn down.
                let _ = tx.send(FetchedChannel { channel, source });
            }
            Err(e) => {
                tracing::warn!(url = %source.url, error = %e, "Fetch failed, skipping source");
                self.error_tx.send_replace(Some(ErrorState::Feed {
                    source_name: source.title.clone(),
                }));
                self.complete_source(source.id, report_progress);
            }
        }
    }

    async fn save_channel(&self, fetched: FetchedChannel, report_progress: bool) {
        let FetchedChannel { channel, source } = fetched;
        tracing::debug!(title = ?channel.title, url = %source.url, "<- saving");

        self.complete_source(source.id, report_progress);

        let items = map_feed_items(&channel, &source);
        let result = if items.is_empty() {
            self.db.update_last_sync(source.id, now_millis()).await
        } else {
            self.db
                .insert_feed_items(source.id, &items, now_millis())
                .await
        };

        if let Err(e) = result {
            // Persistence failures are isolated per source, exactly like
            // fetch failures; the rest of the run keeps draining.
            tracing::error!(url = %source.url, error = %e, "Failed to persist items");
            self.error_tx.send_replace(Some(ErrorState::Database));
            return;
        }

        if source.logo_url.is_none() {
            if let Some(logo) = channel.logo_url.as_deref() {
                if let Err(e) = self.db.update_logo_url(source.id, logo).await {
                    tracing::warn!(url = %source.url, error = %e, "Failed to store feed logo");
                }
            }
        }
    }

    /// Marks one source as done for this run.
    ///
    /// Every source passes through here exactly once: on staleness skip, on
    /// fetch failure, or on reaching the save stage. The progress update
    /// runs under the watch channel's internal lock, and re-checks the
    /// pending set there so the Finished transition survives any completion
    /// interleaving.
    fn complete_source(&self, source_id: i64, report_progress: bool) {
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(&source_id);
        }

        if report_progress {
            self.update_tx.send_modify(|status| {
                let refreshed = status.refreshed_count() + 1;
                let total = status.total_count();
                let drained = self
                    .pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .is_empty();
                *status = if drained {
                    FeedUpdateStatus::Finished
                } else {
                    FeedUpdateStatus::InProgress { refreshed, total }
                };
            });
        }
    }

    // ========================================================================
    // Subscription and item surface
    // ========================================================================

    /// Reads back all stored items, newest first.
    ///
    /// A storage failure here also surfaces as `ErrorState::Database` so
    /// observers of the error channel hear about read-path trouble.
    pub async fn get_feeds(&self) -> Result<Vec<FeedItem>, DatabaseError> {
        match self.db.feed_items().await {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read feed items");
                self.error_tx.send_replace(Some(ErrorState::Database));
                Err(e)
            }
        }
    }

    /// Subscribes to a feed URL.
    ///
    /// The URL is sanitized, then fetched once to validate that it serves a
    /// parseable feed; the channel title fills in when the caller did not
    /// name the subscription.
    pub async fn add_feed_source(
        &self,
        url: &str,
        title: Option<&str>,
        category: Option<&str>,
    ) -> Result<FeedSource, AddFeedError> {
        let url = sanitize_feed_url(url)?;
        let channel = self.client.fetch_and_parse(&url).await?;

        let title = title
            .map(str::to_owned)
            .or(channel.title)
            .unwrap_or_else(|| url.clone());

        let new_source = NewFeedSource {
            url: url.clone(),
            title,
            category: category.map(str::to_owned),
            logo_url: channel.logo_url,
        };
        self.db.insert_feed_sources(std::slice::from_ref(&new_source)).await?;

        Ok(FeedSource {
            id: crate::util::stable_id(&url),
            url,
            title: new_source.title,
            category: new_source.category,
            logo_url: new_source.logo_url,
            last_sync_timestamp: None,
        })
    }

    /// Removes a subscription and, through the store's cascade, its items.
    pub async fn delete_feed_source(&self, source_id: i64) -> Result<(), DatabaseError> {
        self.db.delete_feed_source(source_id).await
    }

    /// Retention sweep: removes items older than the configured window.
    pub async fn delete_old_feeds(&self) -> Result<u64, DatabaseError> {
        let threshold = now_millis() - self.retention_millis;
        self.db.delete_items_older_than(threshold).await
    }

    /// Marks a batch of items read (or unread).
    pub async fn update_read_status(
        &self,
        item_ids: &[i64],
        is_read: bool,
    ) -> Result<(), DatabaseError> {
        self.db.update_read_status(item_ids, is_read).await
    }

    /// Marks every stored item read.
    pub async fn mark_all_read(&self) -> Result<(), DatabaseError> {
        self.db.mark_all_read().await
    }

    /// Sets an item's bookmark flag.
    pub async fn update_bookmark_status(
        &self,
        item_id: i64,
        is_bookmarked: bool,
    ) -> Result<(), DatabaseError> {
        self.db.update_bookmark_status(item_id, is_bookmarked).await
    }
}
