//! Headless RSS/Atom feed reader core.
//!
//! feedflow keeps a SQLite store of subscriptions and their items, and
//! refreshes them through a concurrent two-stage pipeline: a bounded pool of
//! fetch workers pulls sources off a FIFO queue, applies a one-hour
//! staleness policy, and forwards parsed channels through an unbounded
//! queue to a bounded pool of save workers. Progress and the most recent
//! error are observable through watch channels while a run is in flight;
//! per-source failures never stop the rest of the run.
//!
//! ```no_run
//! use feedflow::feed::{FeedClient, FeedRetriever};
//! use feedflow::storage::Database;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let db = Database::open("feedflow.db").await?;
//! let retriever = FeedRetriever::new(db, FeedClient::new());
//!
//! retriever.add_feed_source("https://example.com/feed.xml", None, None).await?;
//! retriever.fetch_feeds(true, false).await?;
//!
//! for item in retriever.get_feeds().await? {
//!     println!("{}", item.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod feed;
pub mod storage;
pub mod util;

pub use config::Config;
pub use feed::{
    ConcurrencyPolicy, ErrorState, FeedClient, FeedRetriever, FeedUpdateStatus, FetchError,
};
pub use storage::{Database, DatabaseError, FeedItem, FeedSource, NewFeedSource};
