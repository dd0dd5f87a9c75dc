use crate::p2p::error::RequestResult;
use bytes::Bytes;
use futures::Future;
use lith_primitives::H256;
use std::pin::Pin;

/// The node-data future type.
pub type TrieNodesFut =
    Pin<Box<dyn Future<Output = RequestResult<Vec<Option<Bytes>>>> + Send + Sync>>;

/// The kind of content-addressed record a sync request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A node of the global account trie.
    AccountTrie,
    /// A node of a per-account storage trie.
    StorageTrie,
    /// Contract code bytes.
    Code,
}

impl NodeKind {
    /// Returns `true` for the two trie-node kinds.
    pub fn is_trie_node(&self) -> bool {
        matches!(self, Self::AccountTrie | Self::StorageTrie)
    }
}

/// A single record request, pairing the content hash with the kind of data
/// expected behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRequest {
    /// Content hash the response bytes must hash to.
    pub hash: H256,
    /// What the hash is expected to address.
    pub kind: NodeKind,
}

/// A client capable of downloading trie nodes and contract code.
///
/// Responses are best-effort: the returned list is parallel to the request
/// list and a `None` slot means the peer did not answer that hash. Batches
/// may complete in any order relative to each other.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait TrieNodesClient: Send + Sync {
    /// The node-data response future type.
    type Output: Future<Output = RequestResult<Vec<Option<Bytes>>>> + Send + Sync + Unpin;

    /// Fetches the raw bytes claimed to hash to each of the requested hashes.
    fn get_trie_nodes(&self, requests: Vec<NodeRequest>) -> Self::Output;
}
