use crate::item::{StateSyncItem, MAX_TRIE_DEPTH};
use lith_interfaces::p2p::NodeKind;
use std::{cmp::Ordering, collections::BinaryHeap};

/// Depth cap a trie stream starts with. Deep enough to reach leaves on
/// typical tries while bounding how far the frontier can fan out before
/// leaves start resolving and draining memory.
const INITIAL_LEVEL_CAP: usize = 10;

/// A pending fetch with its insertion sequence for deterministic tie-breaks.
#[derive(Debug)]
struct PendingItem {
    item: StateSyncItem,
    seq: u64,
}

impl PendingItem {
    fn priority(&self) -> (usize, u64, u64) {
        (self.item.level, self.item.rightness, self.seq)
    }
}

impl PartialEq for PendingItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority() == other.priority()
    }
}

impl Eq for PendingItem {}

impl PartialOrd for PendingItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so shallow, leftmost, oldest
        // items come out first.
        self.priority().cmp(&other.priority()).reverse()
    }
}

/// One independent stream of pending fetches.
#[derive(Debug)]
struct StreamQueue {
    heap: BinaryHeap<PendingItem>,
    level_cap: usize,
}

impl StreamQueue {
    fn new() -> Self {
        Self { heap: BinaryHeap::new(), level_cap: INITIAL_LEVEL_CAP }
    }

    fn push(&mut self, item: StateSyncItem, seq: u64) {
        self.heap.push(PendingItem { item, seq });
    }

    /// Pops the top item if it sits within the stream's depth cap. The heap
    /// orders by level, so a capped top means everything else is capped too.
    fn pop_within_cap(&mut self) -> Option<StateSyncItem> {
        if self.heap.peek()?.item.level > self.level_cap {
            return None
        }
        self.heap.pop().map(|pending| pending.item)
    }

    fn peek_within_cap(&self) -> Option<&StateSyncItem> {
        self.heap.peek().map(|pending| &pending.item).filter(|item| item.level <= self.level_cap)
    }

    fn lift_cap(&mut self) {
        self.level_cap = MAX_TRIE_DEPTH;
    }

    fn is_starved(&self) -> bool {
        !self.heap.is_empty() && self.peek_within_cap().is_none()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.level_cap = INITIAL_LEVEL_CAP;
    }
}

/// Sizes and depth caps of the pending streams, for periodic reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueReport {
    pub(crate) account: usize,
    pub(crate) storage: usize,
    pub(crate) code: usize,
    pub(crate) account_level_cap: usize,
    pub(crate) storage_level_cap: usize,
}

/// The backlog of discovered-but-unrequested node fetches.
///
/// Items are partitioned into independent streams so the account trie, which
/// is the only source of new storage roots and code hashes, is never starved
/// by a large storage backlog. Within a stream, shallow and leftmost items
/// go first; batch assembly drains accounts, then code, then storage.
/// Identical inputs always produce identical batches.
#[derive(Debug)]
pub(crate) struct PendingItemQueue {
    account: StreamQueue,
    storage: StreamQueue,
    code: StreamQueue,
    seq: u64,
}

impl Default for PendingItemQueue {
    fn default() -> Self {
        Self {
            account: StreamQueue::new(),
            storage: StreamQueue::new(),
            code: StreamQueue::new(),
            seq: 0,
        }
    }
}

impl PendingItemQueue {
    fn stream_mut(&mut self, kind: NodeKind) -> &mut StreamQueue {
        match kind {
            NodeKind::AccountTrie => &mut self.account,
            NodeKind::StorageTrie => &mut self.storage,
            NodeKind::Code => &mut self.code,
        }
    }

    /// Adds a fetch to its stream.
    pub(crate) fn push(&mut self, item: StateSyncItem) {
        let seq = self.seq;
        self.seq += 1;
        self.stream_mut(item.kind).push(item, seq);
    }

    /// Takes up to `max` items in priority order.
    ///
    /// If every remaining item sits beyond a depth cap, the caps are lifted
    /// rather than stalling the round on a deeper-than-expected trie.
    pub(crate) fn take_batch(&mut self, max: usize) -> Vec<StateSyncItem> {
        let mut items = self.fill(max);
        if items.is_empty() && !self.is_empty() {
            self.lift_level_caps();
            items = self.fill(max);
        }
        items
    }

    fn lift_level_caps(&mut self) {
        self.account.lift_cap();
        self.storage.lift_cap();
    }

    fn fill(&mut self, max: usize) -> Vec<StateSyncItem> {
        let mut items = Vec::with_capacity(max.min(self.len()));
        for stream in [&mut self.account, &mut self.code, &mut self.storage] {
            while items.len() < max {
                match stream.pop_within_cap() {
                    Some(item) => items.push(item),
                    None => break,
                }
            }
        }
        items
    }

    /// Returns the item the next `take_batch` would yield first.
    pub(crate) fn peek(&self) -> Option<&StateSyncItem> {
        self.account
            .peek_within_cap()
            .or_else(|| self.code.peek_within_cap())
            .or_else(|| self.storage.peek_within_cap())
    }

    /// Records that a stream has resolved a leaf: its depth is now known, so
    /// exploration no longer needs to be capped.
    pub(crate) fn confirm_leaf_depth(&mut self, kind: NodeKind) {
        self.stream_mut(kind).lift_cap();
    }

    /// Re-evaluates stream caps and reports queue shape.
    pub(crate) fn recalculate_priorities(&mut self) -> QueueReport {
        for stream in [&mut self.account, &mut self.storage] {
            if stream.is_starved() {
                stream.lift_cap();
            }
        }
        QueueReport {
            account: self.account.len(),
            storage: self.storage.len(),
            code: self.code.len(),
            account_level_cap: self.account.level_cap,
            storage_level_cap: self.storage.level_cap,
        }
    }

    /// Total queued fetches across all streams.
    pub(crate) fn len(&self) -> usize {
        self.account.len() + self.storage.len() + self.code.len()
    }

    /// Returns whether no fetch is queued.
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all queued fetches and restores the initial depth caps.
    pub(crate) fn clear(&mut self) {
        self.account.clear();
        self.storage.clear();
        self.code.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lith_primitives::{keccak256, trie::Nibbles};

    fn item(kind: NodeKind, level: usize, rightness: u64, tag: u8) -> StateSyncItem {
        StateSyncItem {
            hash: keccak256([tag]),
            kind,
            path: Nibbles::new(),
            account_path: Nibbles::new(),
            level,
            rightness,
            branch_child_index: None,
            parent_branch_child_index: None,
            is_root: false,
        }
    }

    #[test]
    fn shallow_and_leftmost_first_within_a_stream() {
        let mut queue = PendingItemQueue::default();
        queue.push(item(NodeKind::AccountTrie, 2, 0, 0));
        queue.push(item(NodeKind::AccountTrie, 1, 9, 1));
        queue.push(item(NodeKind::AccountTrie, 1, 3, 2));

        let batch = queue.take_batch(16);
        let key: Vec<_> = batch.iter().map(|item| (item.level, item.rightness)).collect();
        assert_eq!(key, vec![(1, 3), (1, 9), (2, 0)]);
    }

    #[test]
    fn account_stream_drains_before_code_and_storage() {
        let mut queue = PendingItemQueue::default();
        queue.push(item(NodeKind::StorageTrie, 0, 0, 0));
        queue.push(item(NodeKind::Code, 0, 0, 1));
        queue.push(item(NodeKind::AccountTrie, 5, 0, 2));

        let kinds: Vec<_> = queue.take_batch(16).into_iter().map(|item| item.kind).collect();
        assert_eq!(kinds, vec![NodeKind::AccountTrie, NodeKind::Code, NodeKind::StorageTrie]);
    }

    #[test]
    fn respects_batch_size_and_stays_deterministic() {
        let mut queue = PendingItemQueue::default();
        for tag in 0..8 {
            queue.push(item(NodeKind::AccountTrie, 1, tag as u64, tag));
        }
        let first = queue.take_batch(3);
        assert_eq!(first.len(), 3);
        assert_eq!(queue.len(), 5);
        let second = queue.take_batch(16);
        assert_eq!(second.len(), 5);
        assert!(first.iter().all(|item| item.rightness < second[0].rightness));
    }

    #[test]
    fn deep_items_wait_until_leaf_depth_is_confirmed() {
        let mut queue = PendingItemQueue::default();
        queue.push(item(NodeKind::AccountTrie, INITIAL_LEVEL_CAP + 1, 0, 0));
        queue.push(item(NodeKind::AccountTrie, 1, 0, 1));

        let batch = queue.take_batch(16);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].level, 1);
        assert_eq!(queue.len(), 1);

        queue.confirm_leaf_depth(NodeKind::AccountTrie);
        assert_eq!(queue.take_batch(16).len(), 1);
    }

    #[test]
    fn lifts_caps_instead_of_stalling() {
        let mut queue = PendingItemQueue::default();
        queue.push(item(NodeKind::AccountTrie, MAX_TRIE_DEPTH - 1, 0, 0));
        // Only beyond-cap work is left; the queue must not report an empty
        // batch while items remain.
        let batch = queue.take_batch(16);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn starved_streams_recover_on_recalculation() {
        let mut queue = PendingItemQueue::default();
        queue.push(item(NodeKind::StorageTrie, INITIAL_LEVEL_CAP + 5, 0, 0));
        assert!(queue.peek().is_none());

        let report = queue.recalculate_priorities();
        assert_eq!(report.storage, 1);
        assert_eq!(report.storage_level_cap, MAX_TRIE_DEPTH);
        assert!(queue.peek().is_some());
    }
}
