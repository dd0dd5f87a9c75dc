use crate::item::StateSyncItem;
use lith_interfaces::p2p::NodeKind;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::PathBuf,
    sync::atomic::{AtomicU16, AtomicU64, Ordering},
};

/// Cumulative sync counters, persisted after every handled batch so a
/// restarted process resumes reporting continuity. Reporting only; none of
/// these feed correctness decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounterSnapshot {
    /// Node fetches handed out in request batches.
    pub requested_nodes: u64,
    /// Response batches processed to completion.
    pub handled_batches: u64,
    /// Verified nodes written to the stores.
    pub saved_nodes: u64,
    /// Account leaves among the saved nodes.
    pub saved_accounts: u64,
    /// Code blobs among the saved nodes.
    pub saved_code: u64,
    /// Child schedules short-circuited by the already-saved cache.
    pub cached_hits: u64,
    /// Store key-existence probes issued.
    pub db_checks: u64,
    /// Probes and writes that found the node already in the store.
    pub db_duplicates: u64,
    /// Responses rejected by hash or shape verification.
    pub invalid_nodes: u64,
    /// Fetches re-queued after going unanswered or failing verification.
    pub requeued_nodes: u64,
    /// Batches whose responses were all unusable.
    pub empty_batches: u64,
    /// Batches answered well under the requested amount.
    pub emptish_batches: u64,
    /// Batches with enough answers but a majority of invalid ones.
    pub lesser_quality_batches: u64,
    /// Batches the peer layer never assigned to anyone.
    pub unassigned_batches: u64,
    /// Sync rounds started by a root reset.
    pub root_resets: u64,
}

macro_rules! counter_fields {
    ($($field:ident),* $(,)?) => {
        /// Atomic mirror of [`ProgressCounterSnapshot`], updated concurrently
        /// by every batch in flight.
        #[derive(Debug, Default)]
        pub(crate) struct ProgressCounters {
            $(pub(crate) $field: AtomicU64,)*
        }

        impl ProgressCounters {
            /// Takes a point-in-time copy of all counters.
            pub(crate) fn snapshot(&self) -> ProgressCounterSnapshot {
                ProgressCounterSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }

            /// Restores all counters from a persisted snapshot.
            pub(crate) fn restore(&self, snapshot: &ProgressCounterSnapshot) {
                $(self.$field.store(snapshot.$field, Ordering::Relaxed);)*
            }
        }
    };
}

counter_fields!(
    requested_nodes,
    handled_batches,
    saved_nodes,
    saved_accounts,
    saved_code,
    cached_hits,
    db_checks,
    db_duplicates,
    invalid_nodes,
    requeued_nodes,
    empty_batches,
    emptish_batches,
    lesser_quality_batches,
    unassigned_batches,
    root_resets,
);

/// Estimates sync completion from the shape and rightness of persisted
/// account-trie nodes. Advisory only: monotonic and deterministic, but an
/// approximation by construction.
#[derive(Debug, Default)]
pub(crate) struct BranchProgress {
    /// Bitmask of root-branch slots whose node has persisted. Nodes persist
    /// only after their whole subtree did, so a set bit means the slot's
    /// sixteenth of the trie is done.
    level_one: AtomicU16,
    /// Per-root-slot bitmask of persisted second-level nodes, for a finer
    /// estimate early in the round.
    level_two: [AtomicU16; 16],
    /// Rightness of the furthest-right persisted account leaf.
    best_rightness: AtomicU64,
}

impl BranchProgress {
    /// Records a persisted account-trie node near the top of the trie.
    pub(crate) fn observe_saved(&self, item: &StateSyncItem) {
        if item.kind != NodeKind::AccountTrie {
            return
        }
        match (item.level, item.parent_branch_child_index, item.branch_child_index) {
            (1, _, Some(index)) => {
                self.level_one.fetch_or(1 << index, Ordering::Relaxed);
            }
            (2, Some(parent), Some(index)) => {
                self.level_two[parent as usize].fetch_or(1 << index, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Records a persisted account leaf's trie position.
    pub(crate) fn observe_account_leaf(&self, rightness: u64) {
        self.best_rightness.fetch_max(rightness, Ordering::Relaxed);
    }

    /// Estimated completion percentage. Every input only ever grows, so the
    /// estimate is monotonic within a round.
    pub(crate) fn estimate(&self) -> f64 {
        let level_one =
            f64::from(self.level_one.load(Ordering::Relaxed).count_ones()) / 16.0;
        let level_two_bits: u32 =
            self.level_two.iter().map(|mask| mask.load(Ordering::Relaxed).count_ones()).sum();
        let level_two = f64::from(level_two_bits) / 256.0;
        let rightness =
            self.best_rightness.load(Ordering::Relaxed) as f64 / u64::MAX as f64;
        level_one.max(level_two).max(rightness) * 100.0
    }

    /// Forgets everything; used when the sync target changes.
    pub(crate) fn reset(&self) {
        self.level_one.store(0, Ordering::Relaxed);
        for mask in &self.level_two {
            mask.store(0, Ordering::Relaxed);
        }
        self.best_rightness.store(0, Ordering::Relaxed);
    }
}

/// The on-disk progress record. Keyed by chain id so a data directory reused
/// for a different network does not resume foreign counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProgressRecord {
    chain_id: u64,
    counters: ProgressCounterSnapshot,
}

/// Reads and writes the progress record at a fixed path.
#[derive(Debug)]
pub(crate) struct ProgressFile {
    path: PathBuf,
    chain_id: u64,
}

impl ProgressFile {
    pub(crate) fn new(path: PathBuf, chain_id: u64) -> Self {
        Self { path, chain_id }
    }

    /// Loads persisted counters if the file exists and matches the chain.
    pub(crate) fn load(&self) -> Option<ProgressCounterSnapshot> {
        let raw = fs::read(&self.path).ok()?;
        let record: ProgressRecord = serde_json::from_slice(&raw).ok()?;
        (record.chain_id == self.chain_id).then_some(record.counters)
    }

    /// Writes the counters, replacing any previous record.
    pub(crate) fn save(&self, counters: &ProgressCounterSnapshot) -> io::Result<()> {
        let record = ProgressRecord { chain_id: self.chain_id, counters: *counters };
        let encoded = serde_json::to_vec(&record)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(&self.path, encoded)
    }
}
