/// Refresh window: a source fetched within the last hour is considered
/// fresh and skipped unless the refresh is forced.
const ONE_HOUR_MILLIS: i64 = 60 * 60 * 1000;

/// Decides whether a feed source is due for a refetch.
///
/// True when the refresh is forced, when the source has never been synced,
/// or when at least an hour has elapsed since the last sync. Pure over its
/// inputs; the caller supplies the clock reading once per pipeline run.
pub fn should_refresh(last_sync_millis: Option<i64>, now_millis: i64, force_refresh: bool) -> bool {
    match last_sync_millis {
        None => true,
        Some(last_sync) => force_refresh || now_millis - last_sync >= ONE_HOUR_MILLIS,
    }
}
