use crate::item::StateSyncItem;
use bytes::Bytes;
use lith_primitives::H256;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// A verified-but-unpersisted parent node awaiting its unresolved children.
///
/// Created when a decoded node references children that are not on disk yet;
/// destroyed when the last child resolves and the buffered bytes get
/// persisted, or when the round is reset.
#[derive(Debug)]
pub(crate) struct DependentItem {
    /// The task this parent will complete.
    pub(crate) item: StateSyncItem,
    /// The parent's verified encoding, buffered until persistence.
    pub(crate) bytes: Bytes,
    /// Whether the item is an account leaf, for progress accounting.
    pub(crate) is_account_leaf: bool,
    pending_children: AtomicUsize,
}

impl DependentItem {
    /// Creates a dependent with no children counted yet.
    pub(crate) fn new(item: StateSyncItem, bytes: Bytes, is_account_leaf: bool) -> Arc<Self> {
        Arc::new(Self { item, bytes, is_account_leaf, pending_children: AtomicUsize::new(0) })
    }

    /// Counts one more unresolved child.
    pub(crate) fn add_child(&self) {
        self.pending_children.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks one child resolved. Returns `true` when none remain.
    pub(crate) fn resolve_child(&self) -> bool {
        self.pending_children.fetch_sub(1, Ordering::SeqCst) == 1
    }

    /// Number of children still unresolved.
    pub(crate) fn pending_children(&self) -> usize {
        self.pending_children.load(Ordering::SeqCst)
    }
}

/// Maps a node hash to the set of parents blocked on it.
///
/// An entry exists only while at least one dependent is waiting on the hash,
/// so key presence doubles as "this hash already has an outstanding fetch"
/// and is what deduplicates scheduling.
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    items: HashMap<H256, Vec<Arc<DependentItem>>>,
}

impl DependencyGraph {
    /// Returns whether any dependent is waiting on the hash.
    pub(crate) fn contains(&self, hash: &H256) -> bool {
        self.items.contains_key(hash)
    }

    /// Registers a dependent as waiting on the hash.
    pub(crate) fn register(&mut self, hash: H256, dependent: Arc<DependentItem>) {
        self.items.entry(hash).or_default().push(dependent);
    }

    /// Removes and returns every dependent waiting on the hash.
    pub(crate) fn take_dependents(&mut self, hash: &H256) -> Vec<Arc<DependentItem>> {
        self.items.remove(hash).unwrap_or_default()
    }

    /// Number of hashes with waiting dependents.
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether no dependent is waiting at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops all entries. Buffered parent bytes are discarded with them.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lith_primitives::keccak256;

    fn dependent() -> Arc<DependentItem> {
        DependentItem::new(
            StateSyncItem::root(keccak256(b"parent")),
            Bytes::from_static(b"encoding"),
            false,
        )
    }

    #[test]
    fn counter_reaches_zero_after_all_children_resolve() {
        let parent = dependent();
        parent.add_child();
        parent.add_child();
        assert_eq!(parent.pending_children(), 2);
        assert!(!parent.resolve_child());
        assert!(parent.resolve_child());
        assert_eq!(parent.pending_children(), 0);
    }

    #[test]
    fn entries_live_only_while_dependents_wait() {
        let mut graph = DependencyGraph::default();
        let hash = keccak256(b"child");
        assert!(!graph.contains(&hash));

        let first = dependent();
        let second = dependent();
        graph.register(hash, Arc::clone(&first));
        graph.register(hash, Arc::clone(&second));
        assert!(graph.contains(&hash));
        assert_eq!(graph.len(), 1);

        let taken = graph.take_dependents(&hash);
        assert_eq!(taken.len(), 2);
        assert!(!graph.contains(&hash));
        assert!(graph.is_empty());
        assert!(graph.take_dependents(&hash).is_empty());
    }
}
