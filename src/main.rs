use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use feedflow::config::Config;
use feedflow::feed::{FeedClient, FeedRetriever, FeedUpdateStatus};
use feedflow::storage::Database;
use feedflow::util::{sanitize_feed_url, stable_id};

/// Get the config directory path (~/.config/feedflow/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedflow"))
}

#[derive(Parser, Debug)]
#[command(name = "feedflow", about = "Headless RSS/Atom feed reader")]
struct Args {
    /// Database file (defaults to ~/.config/feedflow/feedflow.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Subscribe to a feed URL, then exit
    #[arg(long, value_name = "URL")]
    add: Option<String>,

    /// Title for --add (defaults to the channel title)
    #[arg(long, requires = "add")]
    title: Option<String>,

    /// Category for --add
    #[arg(long, requires = "add")]
    category: Option<String>,

    /// Unsubscribe from a feed URL, then exit
    #[arg(long, value_name = "URL")]
    remove: Option<String>,

    /// List subscriptions, then exit
    #[arg(long)]
    list: bool,

    /// Refresh every source regardless of the staleness window
    #[arg(long)]
    force: bool,

    /// Suppress progress reporting (silent refresh)
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    let config = Config::load(&config_dir.join("config.toml")).context("Failed to load config")?;

    let db_path = args.db.unwrap_or_else(|| config_dir.join("feedflow.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = Database::open(db_path_str)
        .await
        .context("Failed to open database")?;

    let retriever = FeedRetriever::new(db.clone(), FeedClient::new())
        .with_policy(config.concurrency.clone().into())
        .with_retention_days(config.retention_days);

    if let Some(url) = &args.add {
        let source = retriever
            .add_feed_source(url, args.title.as_deref(), args.category.as_deref())
            .await
            .with_context(|| format!("Failed to subscribe to {}", url))?;
        println!("Subscribed: {} ({})", source.title, source.url);
        return Ok(());
    }

    if let Some(url) = &args.remove {
        let url = sanitize_feed_url(url)?;
        retriever
            .delete_feed_source(stable_id(&url))
            .await
            .with_context(|| format!("Failed to unsubscribe from {}", url))?;
        println!("Unsubscribed: {}", url);
        return Ok(());
    }

    if args.list {
        let sources = db.feed_sources().await.context("Failed to list sources")?;
        if sources.is_empty() {
            println!("No subscriptions. Add one with --add <URL>.");
        }
        for source in sources {
            match &source.category {
                Some(category) => println!("{}  [{}]  {}", source.title, category, source.url),
                None => println!("{}  {}", source.title, source.url),
            }
        }
        return Ok(());
    }

    let interval = Duration::from_secs(config.refresh_interval_minutes * 60);
    loop {
        run_refresh(&retriever, !args.quiet, args.force).await?;

        if interval.is_zero() {
            break;
        }
        tracing::info!(minutes = config.refresh_interval_minutes, "Sleeping until next refresh");
        tokio::time::sleep(interval).await;
    }

    Ok(())
}

/// One refresh cycle plus the retention sweep, with progress echoed from the
/// retriever's watch channel.
async fn run_refresh(retriever: &FeedRetriever, report_progress: bool, force: bool) -> Result<()> {
    let mut state_rx = retriever.update_state();
    let progress_task = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let status = *state_rx.borrow_and_update();
            match status {
                FeedUpdateStatus::InProgress { refreshed, total } => {
                    eprintln!("Refreshed {}/{}", refreshed, total);
                }
                FeedUpdateStatus::NoSources => {
                    eprintln!("No subscriptions. Add one with --add <URL>.");
                }
                _ => {}
            }
        }
    });

    let result = retriever.fetch_feeds(report_progress, force).await;
    progress_task.abort();
    result.context("Refresh failed")?;

    if let Some(error) = retriever.error_state().borrow().clone() {
        tracing::warn!(?error, "Refresh finished with errors");
    }

    let dropped = retriever
        .delete_old_feeds()
        .await
        .context("Retention sweep failed")?;
    if dropped > 0 {
        tracing::info!(dropped = dropped, "Removed old items");
    }

    Ok(())
}
