use metrics::{register_counter, register_gauge, Counter, Gauge};

/// The state sync metrics.
pub(crate) struct StateSyncMetrics {
    /// Number of node fetches handed out in request batches.
    pub(crate) requested_nodes: Counter,
    /// Number of verified nodes written to the stores.
    pub(crate) saved_nodes: Counter,
    /// Number of responses rejected by hash or shape verification.
    pub(crate) invalid_nodes: Counter,
    /// Number of child schedules short-circuited by the saved cache.
    pub(crate) cached_hits: Counter,
    /// Number of fetches re-queued after going unanswered.
    pub(crate) requeued_nodes: Counter,
    /// Discovered-but-unrequested fetches.
    pub(crate) pending_items: Gauge,
    /// Hashes with parents buffered while awaiting them.
    pub(crate) dependent_items: Gauge,
}

impl std::fmt::Debug for StateSyncMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSyncMetrics").finish_non_exhaustive()
    }
}

impl Default for StateSyncMetrics {
    fn default() -> Self {
        Self {
            requested_nodes: register_counter!("state_sync_requested_nodes"),
            saved_nodes: register_counter!("state_sync_saved_nodes"),
            invalid_nodes: register_counter!("state_sync_invalid_nodes"),
            cached_hits: register_counter!("state_sync_cached_hits"),
            requeued_nodes: register_counter!("state_sync_requeued_nodes"),
            pending_items: register_gauge!("state_sync_pending_items"),
            dependent_items: register_gauge!("state_sync_dependent_items"),
        }
    }
}
