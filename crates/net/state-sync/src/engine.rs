use crate::{
    cache::AlreadySavedCache,
    config::StateSyncConfig,
    deps::{DependencyGraph, DependentItem},
    error::StateSyncResult,
    item::{StateSyncBatch, StateSyncItem, MAX_TRIE_DEPTH},
    metrics::StateSyncMetrics,
    progress::{BranchProgress, ProgressCounterSnapshot, ProgressCounters, ProgressFile},
    queue::PendingItemQueue,
};
use bytes::Bytes;
use lith_interfaces::{
    db::StateStore,
    p2p::{NodeKind, TrieNodesClient},
};
use lith_primitives::{
    keccak256,
    trie::{ChildRef, TrieNode},
    TrieAccount, EMPTY_ROOT, H256, KECCAK_EMPTY,
};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};
use tracing::{debug, error, info, trace, warn};

/// Outcome of feeding one response batch to [`TreeSync::handle_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResponseOutcome {
    /// The batch was processed, or had already been processed earlier.
    Ok,
    /// The peer answered well under the requested amount.
    Emptish,
    /// Enough answers arrived but over half failed verification.
    LesserQuality,
    /// The batch carried responses but none were usable.
    NoProgress,
    /// The peer layer never produced a response list.
    NotAssigned,
    /// The batch lost its request metadata; an internal bug signal.
    InternalError,
}

/// The engine's position in the root-reset cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No active target: nothing was requested yet, the target was empty or
    /// already synced, or the round gave up waiting for a fresh root.
    Dormant,
    /// Actively requesting nodes for the current target.
    Active,
}

/// Point-in-time view of a sync round, returned by [`TreeSync::progress`].
#[derive(Debug, Clone)]
pub struct SyncProgress {
    /// Engine state.
    pub state: SyncState,
    /// Current target root.
    pub root: H256,
    /// Block number the target root belongs to.
    pub block_number: u64,
    /// Whether the target root has been persisted.
    pub root_saved: bool,
    /// Estimated completion percentage; advisory only.
    pub percent: f64,
    /// Discovered-but-unrequested fetches.
    pub pending_items: usize,
    /// Hashes with parents buffered while awaiting them.
    pub dependent_items: usize,
    /// Cumulative counters.
    pub counters: ProgressCounterSnapshot,
}

/// Round-scoped engine state: the current target and the signals that decide
/// when to give it up.
#[derive(Debug)]
struct RoundState {
    root: H256,
    block_number: u64,
    state: SyncState,
    root_saved: bool,
    reset_hints: u32,
    started_at: Instant,
    last_recalc: Instant,
}

/// Reconstructs a remote Merkle-Patricia state trie from untrusted peers.
///
/// The engine owns the sync frontier: the pending-fetch queue, the
/// dependency graph of verified-but-unpersisted parents, the in-flight batch
/// set and the recency cache of saved hashes. The two persistent stores are
/// referenced collaborators; verified trie nodes go to the state store and
/// contract code to the code store, each under its content hash.
///
/// Multiple `prepare_request`/`handle_response` cycles may be in flight
/// concurrently against one engine; each batch's node-decoding loop runs in
/// a single critical section, while every shared structure keeps its own
/// short-held lock so state-store and code-store writes never block each
/// other.
#[derive(Debug)]
pub struct TreeSync<S, C> {
    config: StateSyncConfig,
    state_store: S,
    code_store: C,
    round: Mutex<RoundState>,
    queue: Mutex<PendingItemQueue>,
    deps: Mutex<DependencyGraph>,
    saved_cache: Mutex<AlreadySavedCache>,
    in_flight: Mutex<HashMap<u64, Vec<StateSyncItem>>>,
    /// Code hashes that equal a storage root: the node fetch already in
    /// flight will serve the code store too, so no code fetch is issued.
    codes_same_as_nodes: Mutex<HashSet<H256>>,
    counters: ProgressCounters,
    branch_progress: BranchProgress,
    metrics: StateSyncMetrics,
    progress_file: Option<ProgressFile>,
    next_batch_id: AtomicU64,
}

impl<S, C> TreeSync<S, C>
where
    S: StateStore,
    C: StateStore,
{
    /// Creates a dormant engine over the given stores, resuming persisted
    /// progress counters when the config points at a snapshot file.
    pub fn new(config: StateSyncConfig, state_store: S, code_store: C) -> Self {
        let progress_file = config
            .progress_path
            .clone()
            .map(|path| ProgressFile::new(path, config.chain_id));
        let counters = ProgressCounters::default();
        if let Some(snapshot) = progress_file.as_ref().and_then(ProgressFile::load) {
            counters.restore(&snapshot);
            debug!(target: "sync::state", "resumed cumulative progress counters");
        }
        let now = Instant::now();
        Self {
            saved_cache: Mutex::new(AlreadySavedCache::new(config.saved_cache_capacity)),
            config,
            state_store,
            code_store,
            round: Mutex::new(RoundState {
                root: H256::zero(),
                block_number: 0,
                state: SyncState::Dormant,
                root_saved: false,
                reset_hints: 0,
                started_at: now,
                last_recalc: now,
            }),
            queue: Mutex::new(PendingItemQueue::default()),
            deps: Mutex::new(DependencyGraph::default()),
            in_flight: Mutex::new(HashMap::new()),
            codes_same_as_nodes: Mutex::new(HashSet::new()),
            counters,
            branch_progress: BranchProgress::default(),
            metrics: StateSyncMetrics::default(),
            progress_file,
            next_batch_id: AtomicU64::new(0),
        }
    }

    /// Points the engine at a new target root.
    ///
    /// An empty or already-stored root completes immediately. Resetting to
    /// the unfinished current root keeps the frontier and only re-queues
    /// whatever was in flight, so no work is lost across reorg-free
    /// restarts. A different root discards the entire frontier; nodes
    /// already persisted stay valid and will short-circuit scheduling.
    pub fn reset_root(&self, block_number: u64, root: H256) -> StateSyncResult<()> {
        let mut round = self.round.lock();

        if root.is_zero() || root == EMPTY_ROOT {
            info!(target: "sync::state", block = block_number, "empty target root, nothing to sync");
            self.clear_frontier();
            round.root = root;
            round.block_number = block_number;
            round.root_saved = true;
            round.reset_hints = 0;
            round.state = SyncState::Dormant;
            return Ok(())
        }

        if self.state_store.contains(root)? {
            info!(target: "sync::state", ?root, block = block_number, "target root already in store");
            self.saved_cache.lock().insert(root);
            self.clear_frontier();
            round.root = root;
            round.block_number = block_number;
            round.root_saved = true;
            round.reset_hints = 0;
            round.state = SyncState::Dormant;
            return Ok(())
        }

        let now = Instant::now();
        if root == round.root && !round.root_saved {
            // Same unfinished target: keep the frontier, re-queue whatever
            // was in flight and went unanswered.
            let unanswered: Vec<StateSyncItem> = {
                let mut in_flight = self.in_flight.lock();
                in_flight.drain().flat_map(|(_, items)| items).collect()
            };
            for item in unanswered {
                self.requeue_missing(item);
            }
            round.block_number = block_number;
            round.reset_hints = 0;
            round.started_at = now;
            round.state = SyncState::Active;
            info!(target: "sync::state", ?root, block = block_number, "resuming state sync round");
            self.update_gauges();
            return Ok(())
        }

        // New target: the whole frontier belongs to the old root.
        self.clear_frontier();
        self.branch_progress.reset();
        round.root = root;
        round.block_number = block_number;
        round.root_saved = false;
        round.reset_hints = 0;
        round.started_at = now;
        round.last_recalc = now;
        round.state = SyncState::Active;
        self.queue.lock().push(StateSyncItem::root(root));
        self.counters.root_resets.fetch_add(1, Ordering::Relaxed);
        self.update_gauges();
        info!(target: "sync::state", ?root, block = block_number, "starting state sync round");
        Ok(())
    }

    /// Pulls the highest-priority pending fetches into a request batch.
    ///
    /// Returns `None` when the engine is dormant or nothing is pending. A
    /// round that has idled past the request timeout starts accumulating
    /// reset hints, since an exhausted frontier with an unsaved root usually
    /// means the target went stale.
    pub fn prepare_request(&self) -> Option<StateSyncBatch> {
        let mut round = self.round.lock();
        if round.state != SyncState::Active {
            return None
        }

        let items = self.queue.lock().take_batch(self.config.max_request_size);
        if items.is_empty() {
            if round.started_at.elapsed() >= self.config.request_timeout {
                self.note_hint(&mut round);
            }
            return None
        }

        self.counters.requested_nodes.fetch_add(items.len() as u64, Ordering::Relaxed);
        self.metrics.requested_nodes.increment(items.len() as u64);
        let id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        self.in_flight.lock().insert(id, items.clone());
        self.update_gauges();
        trace!(target: "sync::state", id, items = items.len(), "prepared request batch");
        Some(StateSyncBatch { id, requested: items, responses: None })
    }

    /// Verifies and dispatches one response batch.
    ///
    /// Replayed batches, and late responses for batches discarded by a root
    /// reset, are no-ops returning [`SyncResponseOutcome::Ok`]. Every
    /// per-item failure is recovered by re-queueing; only store failures
    /// surface as errors.
    pub fn handle_response(&self, batch: StateSyncBatch) -> StateSyncResult<SyncResponseOutcome> {
        let mut round = self.round.lock();

        let Some(tracked) = self.in_flight.lock().remove(&batch.id) else {
            trace!(target: "sync::state", id = batch.id, "ignoring unknown response batch");
            return Ok(SyncResponseOutcome::Ok)
        };

        if batch.requested.is_empty() {
            // The batch lost its request metadata on the way back; put the
            // tracked items back and flag the bug.
            error!(target: "sync::state", id = batch.id, "response batch without request metadata");
            for item in tracked {
                self.requeue_missing(item);
            }
            self.update_gauges();
            return Ok(SyncResponseOutcome::InternalError)
        }

        let Some(responses) = batch.responses else {
            trace!(target: "sync::state", id = batch.id, "batch was never assigned to a peer");
            self.counters.unassigned_batches.fetch_add(1, Ordering::Relaxed);
            for item in batch.requested {
                self.requeue_missing(item);
            }
            self.update_gauges();
            self.write_progress_snapshot();
            return Ok(SyncResponseOutcome::NotAssigned)
        };

        let requested_count = batch.requested.len();
        let mut non_empty = 0u64;
        let mut invalid = 0u64;

        for (index, item) in batch.requested.into_iter().enumerate() {
            let response = responses
                .get(index)
                .and_then(|slot| slot.clone())
                .filter(|bytes| !bytes.is_empty());
            let Some(bytes) = response else {
                self.requeue_missing(item);
                continue
            };
            non_empty += 1;

            if keccak256(&bytes) != item.hash {
                trace!(target: "sync::state", hash = ?item.hash, "response bytes do not hash to the requested node");
                invalid += 1;
                self.counters.invalid_nodes.fetch_add(1, Ordering::Relaxed);
                self.metrics.invalid_nodes.increment(1);
                self.requeue_missing(item);
                continue
            }

            match item.kind {
                NodeKind::Code => self.save_and_cascade(&mut round, &item, &bytes, false)?,
                NodeKind::AccountTrie | NodeKind::StorageTrie => {
                    if !self.process_trie_node(&mut round, &item, &bytes)? {
                        invalid += 1;
                        self.counters.invalid_nodes.fetch_add(1, Ordering::Relaxed);
                        self.metrics.invalid_nodes.increment(1);
                    }
                }
            }
        }

        self.counters.handled_batches.fetch_add(1, Ordering::Relaxed);

        let outcome = if non_empty >= self.config.lesser_quality_floor as u64
            && invalid * 2 > non_empty
        {
            // The peer answers fast but wrong more often than right; a
            // different signal than answering short.
            self.counters.lesser_quality_batches.fetch_add(1, Ordering::Relaxed);
            SyncResponseOutcome::LesserQuality
        } else if non_empty == 0 {
            self.counters.empty_batches.fetch_add(1, Ordering::Relaxed);
            self.note_hint(&mut round);
            SyncResponseOutcome::NoProgress
        } else if non_empty * 100 < requested_count as u64 * self.config.emptish_response_percent {
            self.counters.emptish_batches.fetch_add(1, Ordering::Relaxed);
            self.note_hint(&mut round);
            SyncResponseOutcome::Emptish
        } else {
            SyncResponseOutcome::Ok
        };

        // The periodic priority recalculation rides on the same critical
        // section as the decode loop.
        if round.last_recalc.elapsed() >= self.config.priority_recalc_interval {
            round.last_recalc = Instant::now();
            let report = self.queue.lock().recalculate_priorities();
            debug!(target: "sync::state", ?report, "recalculated queue priorities");
        }

        if round.root_saved && round.state == SyncState::Active {
            self.finish_round(&mut round);
        }

        self.update_gauges();
        self.write_progress_snapshot();
        Ok(outcome)
    }

    /// Runs one full request/fetch/handle cycle against a client.
    ///
    /// Returns `None` when there was nothing to request. A client error
    /// leaves the batch unassigned, which re-queues all of its items.
    pub async fn execute_batch<N>(
        &self,
        client: &N,
    ) -> StateSyncResult<Option<SyncResponseOutcome>>
    where
        N: TrieNodesClient,
    {
        let Some(mut batch) = self.prepare_request() else { return Ok(None) };
        match client.get_trie_nodes(batch.requests()).await {
            Ok(responses) => batch.responses = Some(responses),
            Err(err) => {
                debug!(target: "sync::state", %err, "trie node request failed");
            }
        }
        self.handle_response(batch).map(Some)
    }

    /// Returns the engine's position in the root-reset cycle.
    pub fn state(&self) -> SyncState {
        self.round.lock().state
    }

    /// Returns the fetch the next request batch would start with.
    pub fn peek_next(&self) -> Option<StateSyncItem> {
        self.queue.lock().peek().cloned()
    }

    /// Takes a point-in-time progress snapshot.
    pub fn progress(&self) -> SyncProgress {
        let round = self.round.lock();
        SyncProgress {
            state: round.state,
            root: round.root,
            block_number: round.block_number,
            root_saved: round.root_saved,
            percent: if round.root_saved { 100.0 } else { self.branch_progress.estimate() },
            pending_items: self.queue.lock().len(),
            dependent_items: self.deps.lock().len(),
            counters: self.counters.snapshot(),
        }
    }

    /// Forces a progress snapshot write, if persistence is configured.
    pub fn persist_progress(&self) -> StateSyncResult<()> {
        if let Some(file) = &self.progress_file {
            file.save(&self.counters.snapshot())?;
        }
        Ok(())
    }

    /// Decodes a verified trie node and either persists it or parks it
    /// behind its unresolved children. Returns `false` if the bytes decode
    /// to no known node shape.
    fn process_trie_node(
        &self,
        round: &mut RoundState,
        item: &StateSyncItem,
        bytes: &Bytes,
    ) -> StateSyncResult<bool> {
        debug_assert!(item.kind.is_trie_node());
        let node = match TrieNode::decode(bytes) {
            Ok(node) => node,
            Err(err) => {
                trace!(target: "sync::state", hash = ?item.hash, %err, "undecodable node");
                return Ok(false)
            }
        };

        match node {
            TrieNode::Branch(branch) => {
                let dependent = DependentItem::new(item.clone(), bytes.clone(), false);
                // Identical subtrees can hang off two slots of one branch;
                // fetch them once.
                let mut seen = HashSet::new();
                for (index, child) in branch.children.iter().enumerate() {
                    if let Some(ChildRef::Hash(hash)) = child {
                        if !seen.insert(*hash) {
                            continue
                        }
                        let child_item =
                            StateSyncItem::branch_child(item, index as u8, *hash);
                        self.schedule_child(child_item, &dependent)?;
                    }
                }
                self.settle_dependent(round, dependent)?;
            }
            TrieNode::Extension(extension) => match extension.child {
                // An embedded child travels inside the parent's bytes and
                // needs no fetch of its own.
                ChildRef::Inline(_) => self.save_and_cascade(round, item, bytes, false)?,
                ChildRef::Hash(hash) => {
                    let dependent = DependentItem::new(item.clone(), bytes.clone(), false);
                    let child_item =
                        StateSyncItem::extension_child(item, &extension.path, hash);
                    self.schedule_child(child_item, &dependent)?;
                    self.settle_dependent(round, dependent)?;
                }
            },
            TrieNode::Leaf(leaf) => {
                self.queue.lock().confirm_leaf_depth(item.kind);
                let full_path = item.path.join(&leaf.path);
                if full_path.len() != MAX_TRIE_DEPTH {
                    trace!(target: "sync::state", hash = ?item.hash, path_len = full_path.len(), "leaf with truncated key path");
                    return Ok(false)
                }

                if item.kind == NodeKind::StorageTrie {
                    self.save_and_cascade(round, item, bytes, false)?;
                    return Ok(true)
                }

                let account = match TrieAccount::decode_roots(&leaf.value) {
                    Ok(account) => account,
                    Err(err) => {
                        trace!(target: "sync::state", hash = ?item.hash, %err, "undecodable account record");
                        return Ok(false)
                    }
                };

                let dependent = DependentItem::new(item.clone(), bytes.clone(), true);
                let fetch_storage = account.storage_root != EMPTY_ROOT;
                if account.code_hash != KECCAK_EMPTY {
                    if account.code_hash == account.storage_root && fetch_storage {
                        // The code bytes hash to the same value as the
                        // storage root; the node fetch below serves both
                        // stores, no separate code fetch.
                        self.codes_same_as_nodes.lock().insert(account.code_hash);
                    } else {
                        let code_item = StateSyncItem::code(account.code_hash, item.rightness);
                        self.schedule_child(code_item, &dependent)?;
                    }
                }
                if fetch_storage {
                    let storage_item = StateSyncItem::storage_root(
                        full_path,
                        account.storage_root,
                        item.rightness,
                    );
                    self.schedule_child(storage_item, &dependent)?;
                }
                self.settle_dependent(round, dependent)?;
            }
        }
        Ok(true)
    }

    /// Routes a child fetch: saved children resolve on the spot, children
    /// with an outstanding fetch only gain another waiting parent, and new
    /// ones enter the pending queue.
    fn schedule_child(
        &self,
        child: StateSyncItem,
        dependent: &Arc<DependentItem>,
    ) -> StateSyncResult<()> {
        let cached = self.saved_cache.lock().contains(&child.hash);
        if cached {
            self.counters.cached_hits.fetch_add(1, Ordering::Relaxed);
            self.metrics.cached_hits.increment(1);
            return Ok(())
        }

        self.counters.db_checks.fetch_add(1, Ordering::Relaxed);
        if self.store_contains(child.kind, child.hash)? {
            self.counters.db_duplicates.fetch_add(1, Ordering::Relaxed);
            self.saved_cache.lock().insert(child.hash);
            return Ok(())
        }

        dependent.add_child();
        let already_pending = {
            let mut deps = self.deps.lock();
            let pending = deps.contains(&child.hash);
            deps.register(child.hash, Arc::clone(dependent));
            pending
        };
        if !already_pending {
            self.queue.lock().push(child);
        }
        Ok(())
    }

    /// Persists a parent whose children all resolved during scheduling.
    fn settle_dependent(
        &self,
        round: &mut RoundState,
        dependent: Arc<DependentItem>,
    ) -> StateSyncResult<()> {
        if dependent.pending_children() == 0 {
            self.save_and_cascade(
                round,
                &dependent.item,
                &dependent.bytes,
                dependent.is_account_leaf,
            )?;
        }
        Ok(())
    }

    /// Persists a node, then walks the dependency graph with an explicit
    /// work list: every parent whose last child this resolves is persisted
    /// in turn, which may unblock parents of its own. No recursion, so deep
    /// tries cannot exhaust the call stack.
    fn save_and_cascade(
        &self,
        round: &mut RoundState,
        item: &StateSyncItem,
        bytes: &Bytes,
        is_account_leaf: bool,
    ) -> StateSyncResult<()> {
        self.persist_node(round, item, bytes, is_account_leaf)?;
        let mut worklist = vec![item.hash];
        while let Some(hash) = worklist.pop() {
            let dependents = self.deps.lock().take_dependents(&hash);
            for dependent in dependents {
                if dependent.resolve_child() {
                    self.persist_node(
                        round,
                        &dependent.item,
                        &dependent.bytes,
                        dependent.is_account_leaf,
                    )?;
                    worklist.push(dependent.item.hash);
                }
            }
        }
        Ok(())
    }

    /// Writes one verified node to its store and updates the bookkeeping.
    /// Writing a node that is already present is a harmless no-op.
    fn persist_node(
        &self,
        round: &mut RoundState,
        item: &StateSyncItem,
        bytes: &Bytes,
        is_account_leaf: bool,
    ) -> StateSyncResult<()> {
        let cached = self.saved_cache.lock().contains(&item.hash);
        let duplicate = cached || self.store_contains(item.kind, item.hash)?;
        if duplicate {
            self.counters.db_duplicates.fetch_add(1, Ordering::Relaxed);
        } else {
            self.store_insert(item.kind, item.hash, bytes.clone())?;
        }
        self.saved_cache.lock().insert(item.hash);
        self.counters.saved_nodes.fetch_add(1, Ordering::Relaxed);
        self.metrics.saved_nodes.increment(1);
        trace!(target: "sync::state", hash = ?item.hash, kind = ?item.kind, "node persisted");

        match item.kind {
            NodeKind::Code => {
                self.counters.saved_code.fetch_add(1, Ordering::Relaxed);
            }
            NodeKind::AccountTrie | NodeKind::StorageTrie => {
                self.branch_progress.observe_saved(item);
                if is_account_leaf {
                    self.counters.saved_accounts.fetch_add(1, Ordering::Relaxed);
                    self.branch_progress.observe_account_leaf(item.rightness);
                }
                // A trie write can be owed to the code store when an
                // account's code bytes hash to its storage root.
                let owed_to_code_store = self.codes_same_as_nodes.lock().remove(&item.hash);
                if owed_to_code_store {
                    if !self.code_store.contains(item.hash)? {
                        self.code_store.insert(item.hash, bytes.clone())?;
                    }
                    self.counters.saved_code.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        if item.is_root {
            round.root_saved = true;
            debug!(target: "sync::state", root = ?item.hash, "target root persisted");
        }
        Ok(())
    }

    /// Puts an unanswered or rejected fetch back into the pending queue.
    fn requeue_missing(&self, item: StateSyncItem) {
        self.counters.requeued_nodes.fetch_add(1, Ordering::Relaxed);
        self.metrics.requeued_nodes.increment(1);
        self.queue.lock().push(item);
    }

    /// Counts a no-progress signal; enough of them in one round means the
    /// target root is likely stale, so the engine stops spinning and waits
    /// for the caller to supply a fresh one.
    fn note_hint(&self, round: &mut RoundState) {
        round.reset_hints += 1;
        if round.reset_hints >= self.config.reset_hint_threshold
            && round.state == SyncState::Active
        {
            info!(
                target: "sync::state",
                hints = round.reset_hints,
                root = ?round.root,
                "no sync progress, waiting for a fresh target root"
            );
            round.state = SyncState::Dormant;
        }
    }

    /// Ends a round whose target root persisted, checking the structural
    /// invariant that nothing was left behind.
    fn finish_round(&self, round: &mut RoundState) {
        let pending = self.queue.lock().len();
        let dependencies = self.deps.lock().len();
        if pending != 0 || dependencies != 0 {
            error!(
                target: "sync::state",
                pending,
                dependencies,
                root = ?round.root,
                "sync round finished with leftover frontier state; this is a bug"
            );
        } else {
            info!(
                target: "sync::state",
                root = ?round.root,
                block = round.block_number,
                "state sync complete"
            );
        }
        round.state = SyncState::Dormant;
    }

    fn store_contains(&self, kind: NodeKind, hash: H256) -> StateSyncResult<bool> {
        let exists = match kind {
            NodeKind::Code => self.code_store.contains(hash)?,
            NodeKind::AccountTrie | NodeKind::StorageTrie => self.state_store.contains(hash)?,
        };
        Ok(exists)
    }

    fn store_insert(&self, kind: NodeKind, hash: H256, bytes: Bytes) -> StateSyncResult<()> {
        match kind {
            NodeKind::Code => self.code_store.insert(hash, bytes)?,
            NodeKind::AccountTrie | NodeKind::StorageTrie => {
                self.state_store.insert(hash, bytes)?
            }
        }
        Ok(())
    }

    fn clear_frontier(&self) {
        self.queue.lock().clear();
        self.deps.lock().clear();
        self.in_flight.lock().clear();
        self.codes_same_as_nodes.lock().clear();
    }

    fn update_gauges(&self) {
        self.metrics.pending_items.set(self.queue.lock().len() as f64);
        self.metrics.dependent_items.set(self.deps.lock().len() as f64);
    }

    fn write_progress_snapshot(&self) {
        if let Some(file) = &self.progress_file {
            if let Err(err) = file.save(&self.counters.snapshot()) {
                warn!(target: "sync::state", %err, "failed to persist progress snapshot");
            }
        }
    }
}
