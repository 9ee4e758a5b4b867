/// Worker-pool sizing for the two pipeline stages.
///
/// Subscription lists above `threshold` get the reduced levels, bounding
/// outbound connections and write pressure when a user follows many feeds.
/// The levels are plain data so tests and configuration can inject their
/// own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyPolicy {
    /// Source count above which the reduced levels apply.
    pub threshold: usize,
    pub standard_fetchers: usize,
    pub reduced_fetchers: usize,
    pub standard_savers: usize,
    pub reduced_savers: usize,
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        Self {
            threshold: 40,
            standard_fetchers: 10,
            reduced_fetchers: 5,
            standard_savers: 4,
            reduced_savers: 2,
        }
    }
}

impl ConcurrencyPolicy {
    /// Fetch-stage worker count for a run over `source_count` sources.
    pub fn fetchers_for(&self, source_count: usize) -> usize {
        let level = if source_count > self.threshold {
            self.reduced_fetchers
        } else {
            self.standard_fetchers
        };
        level.max(1)
    }

    /// Save-stage worker count for a run over `source_count` sources.
    pub fn savers_for(&self, source_count: usize) -> usize {
        let level = if source_count > self.threshold {
            self.reduced_savers
        } else {
            self.standard_savers
        };
        level.max(1)
    }
}
