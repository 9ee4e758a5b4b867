/// Observable state of a refresh run.
///
/// Published through a `tokio::sync::watch` channel; observers see the
/// latest value only. `Finished` doubles as the idle state before any run,
/// and the state a silent (non-reporting) refresh stays in for its whole
/// duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedUpdateStatus {
    /// No run in flight, or the current run does not report progress.
    #[default]
    Finished,
    /// A run has started; no per-source completion counted yet.
    Started,
    /// `refreshed` of `total` sources have completed (fetched, skipped, or
    /// failed).
    InProgress { refreshed: usize, total: usize },
    /// The store had no subscriptions when the run started.
    NoSources,
}

impl FeedUpdateStatus {
    /// Whether a reporting run is currently in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Started | Self::InProgress { .. })
    }

    pub fn refreshed_count(&self) -> usize {
        match self {
            Self::InProgress { refreshed, .. } => *refreshed,
            _ => 0,
        }
    }

    pub fn total_count(&self) -> usize {
        match self {
            Self::InProgress { total, .. } => *total,
            _ => 0,
        }
    }
}

/// Most recent pipeline error, published as `Option<ErrorState>` through a
/// watch channel.
///
/// Overwrite-only: concurrent failures race and the last writer wins, so
/// observers see the most recent failure, not an aggregate. UIs surface
/// these as transient notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorState {
    /// A storage operation failed; the run keeps going.
    Database,
    /// One source's fetch or parse failed; the run keeps going.
    Feed { source_name: String },
}
