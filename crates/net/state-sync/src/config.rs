use std::{path::PathBuf, time::Duration};

/// Configuration for state sync.
#[derive(Debug, Clone)]
pub struct StateSyncConfig {
    /// The maximum number of node fetches per request batch.
    pub max_request_size: usize,
    /// Number of reset hints after which the round gives up and goes dormant
    /// until a fresh target root arrives.
    pub reset_hint_threshold: u32,
    /// A batch whose answered share, in percent, falls below this counts as
    /// emptish. The requested batch size intentionally exceeds what most
    /// peers serve at once, so short answers are expected up to a point.
    pub emptish_response_percent: u64,
    /// Minimum non-empty responses before a batch can be judged lesser
    /// quality; keeps the signal distinct from plain short answers.
    pub lesser_quality_floor: usize,
    /// How long a round may run with nothing to request before it starts
    /// hinting that the target root went stale.
    pub request_timeout: Duration,
    /// How often queue priorities are recalculated and reported.
    pub priority_recalc_interval: Duration,
    /// Capacity of the already-saved hash cache.
    pub saved_cache_capacity: u32,
    /// Chain identifier the progress record is keyed by.
    pub chain_id: u64,
    /// Where cumulative progress counters are persisted. `None` disables
    /// persistence; correctness is unaffected.
    pub progress_path: Option<PathBuf>,
}

impl Default for StateSyncConfig {
    fn default() -> Self {
        Self {
            max_request_size: 384,
            reset_hint_threshold: 32,
            emptish_response_percent: 28,
            lesser_quality_floor: 64,
            request_timeout: Duration::from_secs(10),
            priority_recalc_interval: Duration::from_secs(60),
            saved_cache_capacity: 1024 * 1024,
            chain_id: 1,
            progress_path: None,
        }
    }
}

impl StateSyncConfig {
    /// Set the maximum number of node fetches per request batch.
    pub fn with_max_request_size(mut self, max_request_size: usize) -> Self {
        self.max_request_size = max_request_size;
        self
    }

    /// Set the number of reset hints after which the round gives up.
    pub fn with_reset_hint_threshold(mut self, reset_hint_threshold: u32) -> Self {
        self.reset_hint_threshold = reset_hint_threshold;
        self
    }

    /// Set how long a round may idle before hinting at a stale root.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Set the capacity of the already-saved hash cache.
    pub fn with_saved_cache_capacity(mut self, saved_cache_capacity: u32) -> Self {
        self.saved_cache_capacity = saved_cache_capacity;
        self
    }

    /// Set the chain identifier the progress record is keyed by.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the progress persistence path.
    pub fn with_progress_path(mut self, progress_path: impl Into<PathBuf>) -> Self {
        self.progress_path = Some(progress_path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning() {
        let config = StateSyncConfig::default();
        assert_eq!(config.max_request_size, 384);
        assert_eq!(config.reset_hint_threshold, 32);
        assert_eq!(config.emptish_response_percent, 28);
        assert_eq!(config.lesser_quality_floor, 64);
        assert!(config.progress_path.is_none());
    }

    #[test]
    fn builder_setters_apply() {
        let config = StateSyncConfig::default()
            .with_max_request_size(16)
            .with_reset_hint_threshold(4)
            .with_chain_id(5)
            .with_progress_path("/tmp/progress.json");
        assert_eq!(config.max_request_size, 16);
        assert_eq!(config.reset_hint_threshold, 4);
        assert_eq!(config.chain_id, 5);
        assert!(config.progress_path.is_some());
    }
}
