//! Test helper impls

use crate::{
    db::{StateStore, StoreResult},
    p2p::{error::RequestResult, state::NodeRequest, TrieNodesClient},
};
use alloy_rlp::{Encodable, Header};
use bytes::Bytes;
use lith_primitives::{
    keccak256,
    trie::{BranchNode, ChildRef, ExtensionNode, LeafNode, Nibbles, TrieNode},
    H256,
};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// An in-memory content-addressed [`StateStore`].
#[derive(Default, Clone)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<H256, Bytes>>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Debug for MemoryStateStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStateStore").field("len", &self.len()).finish()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, hash: H256) -> StoreResult<Option<Bytes>> {
        Ok(self.inner.read().get(&hash).cloned())
    }

    fn insert(&self, hash: H256, bytes: Bytes) -> StoreResult<()> {
        self.inner.write().insert(hash, bytes);
        Ok(())
    }

    fn contains(&self, hash: H256) -> StoreResult<bool> {
        Ok(self.inner.read().contains_key(&hash))
    }
}

/// A [`TrieNodesClient`] for testing, answering requests with a closure.
pub struct TestTrieNodesClient<F>(Arc<Mutex<F>>);

impl<F> Debug for TestTrieNodesClient<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestTrieNodesClient").finish_non_exhaustive()
    }
}

impl<F> TestTrieNodesClient<F> {
    /// Creates a client that answers with the given closure.
    pub fn new(f: F) -> Self {
        Self(Arc::new(Mutex::new(f)))
    }
}

impl<F> TrieNodesClient for TestTrieNodesClient<F>
where
    F: FnMut(Vec<NodeRequest>) -> RequestResult<Vec<Option<Bytes>>> + Send + Sync,
{
    type Output = futures::future::Ready<RequestResult<Vec<Option<Bytes>>>>;

    fn get_trie_nodes(&self, requests: Vec<NodeRequest>) -> Self::Output {
        futures::future::ready((self.0.lock())(requests))
    }
}

/// RLP encodes an account record.
pub fn encode_account(nonce: u64, balance: u64, storage_root: H256, code_hash: H256) -> Vec<u8> {
    let payload_length = nonce.length() + balance.length() + 33 + 33;
    let mut out = Vec::new();
    Header { list: true, payload_length }.encode(&mut out);
    nonce.encode(&mut out);
    balance.encode(&mut out);
    storage_root.as_bytes().encode(&mut out);
    code_hash.as_bytes().encode(&mut out);
    out
}

/// Assembles synthetic tries bottom-up and plays the remote peer for them.
///
/// Every inserted node is kept under its content hash so the builder can
/// answer arbitrary request batches the way a fully synced peer would.
#[derive(Debug, Default, Clone)]
pub struct TrieBuilder {
    nodes: HashMap<H256, Bytes>,
}

impl TrieBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts raw bytes (e.g. contract code) and returns their hash.
    pub fn insert_raw(&mut self, bytes: impl Into<Bytes>) -> H256 {
        let bytes = bytes.into();
        let hash = keccak256(&bytes);
        self.nodes.insert(hash, bytes);
        hash
    }

    /// Encodes and inserts a node, returning its hash.
    ///
    /// Nodes shorter than a hash would be embedded in their parent in a real
    /// trie, so the builder refuses them.
    pub fn insert_node(&mut self, node: TrieNode) -> H256 {
        let encoded = node.rlp();
        assert!(encoded.len() >= 32, "node would be embedded, not referenced");
        self.insert_raw(encoded)
    }

    /// Inserts a leaf node.
    pub fn leaf(&mut self, path: &[u8], value: Vec<u8>) -> H256 {
        self.insert_node(TrieNode::Leaf(LeafNode { path: Nibbles::from_nibbles(path), value }))
    }

    /// Inserts an account leaf with the given trailing hash fields.
    pub fn account_leaf(&mut self, path: &[u8], storage_root: H256, code_hash: H256) -> H256 {
        self.leaf(path, encode_account(1, 1, storage_root, code_hash))
    }

    /// Inserts a branch node with hash children at the given slots.
    pub fn branch(&mut self, children: &[(u8, H256)]) -> H256 {
        let mut node = BranchNode::default();
        for (index, hash) in children {
            node.children[*index as usize] = Some(ChildRef::Hash(*hash));
        }
        self.insert_node(TrieNode::Branch(node))
    }

    /// Inserts an extension node pointing at a hashed child.
    pub fn extension(&mut self, path: &[u8], child: H256) -> H256 {
        self.insert_node(TrieNode::Extension(ExtensionNode {
            path: Nibbles::from_nibbles(path),
            child: ChildRef::Hash(child),
        }))
    }

    /// Returns the bytes stored under a hash.
    pub fn get(&self, hash: H256) -> Option<Bytes> {
        self.nodes.get(&hash).cloned()
    }

    /// Answers a request batch the way a fully synced peer would.
    pub fn respond_to(&self, requests: &[NodeRequest]) -> Vec<Option<Bytes>> {
        requests.iter().map(|request| self.get(request.hash)).collect()
    }

    /// Returns a client serving this builder's nodes.
    pub fn client(&self) -> TestTrieNodesClient<impl FnMut(Vec<NodeRequest>) -> RequestResult<Vec<Option<Bytes>>>>
    {
        let nodes = self.clone();
        TestTrieNodesClient::new(move |requests: Vec<NodeRequest>| Ok(nodes.respond_to(&requests)))
    }
}
