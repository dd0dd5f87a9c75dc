use bytes::Bytes;
use lith_interfaces::p2p::{NodeKind, NodeRequest};
use lith_primitives::{trie::Nibbles, H256};

/// Depth of a fully expanded account or storage trie in nibbles.
pub(crate) const MAX_TRIE_DEPTH: usize = 64;

/// A single node-fetch task.
///
/// The hash is immutable once created; two items with equal hashes are
/// semantically interchangeable and get deduplicated on scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSyncItem {
    /// Content hash the response bytes must hash to.
    pub hash: H256,
    /// Which trie (or the code store) the record belongs to.
    pub kind: NodeKind,
    /// Partial key path from the owning trie's root to this node.
    pub path: Nibbles,
    /// For storage-trie items, the path of the owning account leaf.
    pub account_path: Nibbles,
    /// Depth from the owning trie's root, in nibbles.
    pub level: usize,
    /// Fixed-point approximation of the node's lexicographic position among
    /// its siblings. Only feeds progress estimation, never correctness.
    pub rightness: u64,
    /// The branch slot this node occupies under its parent, if any.
    pub branch_child_index: Option<u8>,
    /// The branch slot the parent occupies under the grandparent, if any.
    pub parent_branch_child_index: Option<u8>,
    /// Whether this item carries the sync target root.
    pub is_root: bool,
}

impl StateSyncItem {
    /// Creates the root item of a sync round.
    pub fn root(hash: H256) -> Self {
        Self {
            hash,
            kind: NodeKind::AccountTrie,
            path: Nibbles::new(),
            account_path: Nibbles::new(),
            level: 0,
            rightness: 0,
            branch_child_index: None,
            parent_branch_child_index: None,
            is_root: true,
        }
    }

    /// Creates the fetch for a branch child at the given slot.
    pub fn branch_child(parent: &Self, index: u8, hash: H256) -> Self {
        Self {
            hash,
            kind: parent.kind,
            path: parent.path.join_nibble(index),
            account_path: parent.account_path.clone(),
            level: parent.level + 1,
            rightness: child_rightness(parent.rightness, index, parent.level + 1),
            branch_child_index: Some(index),
            parent_branch_child_index: parent.branch_child_index,
            is_root: false,
        }
    }

    /// Creates the fetch for an extension node's single child. The child
    /// sits a whole path segment deeper than its parent.
    pub fn extension_child(parent: &Self, segment: &Nibbles, hash: H256) -> Self {
        Self {
            hash,
            kind: parent.kind,
            path: parent.path.join(segment),
            account_path: parent.account_path.clone(),
            level: parent.level + segment.len(),
            rightness: parent.rightness,
            branch_child_index: None,
            parent_branch_child_index: parent.branch_child_index,
            is_root: false,
        }
    }

    /// Creates the fetch for the storage root discovered in an account leaf.
    pub fn storage_root(account_path: Nibbles, hash: H256, rightness: u64) -> Self {
        Self {
            hash,
            kind: NodeKind::StorageTrie,
            path: Nibbles::new(),
            account_path,
            level: 0,
            rightness,
            branch_child_index: None,
            parent_branch_child_index: None,
            is_root: false,
        }
    }

    /// Creates the fetch for the code discovered in an account leaf.
    pub fn code(hash: H256, rightness: u64) -> Self {
        Self {
            hash,
            kind: NodeKind::Code,
            path: Nibbles::new(),
            account_path: Nibbles::new(),
            level: 0,
            rightness,
            branch_child_index: None,
            parent_branch_child_index: None,
            is_root: false,
        }
    }

    /// Converts the item into its wire request shape.
    pub fn as_request(&self) -> NodeRequest {
        NodeRequest { hash: self.hash, kind: self.kind }
    }
}

/// The rightness of a branch child: the parent's position plus the slot's
/// share of the keyspace span a node at this depth covers.
pub(crate) fn child_rightness(parent: u64, index: u8, level: usize) -> u64 {
    let shift = (4 * level).min(63) as u32;
    parent.saturating_add((index as u64).saturating_mul(u64::MAX >> shift))
}

/// Pairs an ordered list of requested items with the peer's response slots.
///
/// Response `i` answers request `i`. A short response list, or `None` in a
/// slot, means the peer did not answer that hash.
#[derive(Debug, Clone)]
pub struct StateSyncBatch {
    pub(crate) id: u64,
    /// The requested items, in request order.
    pub requested: Vec<StateSyncItem>,
    /// Peer response slots, parallel to `requested`. `None` until assigned.
    pub responses: Option<Vec<Option<Bytes>>>,
}

impl StateSyncBatch {
    /// Returns the wire requests for this batch.
    pub fn requests(&self) -> Vec<NodeRequest> {
        self.requested.iter().map(StateSyncItem::as_request).collect()
    }
}
