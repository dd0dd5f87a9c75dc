/// Shared error types for p2p requests.
pub mod error;

/// Traits for fetching trie nodes and contract code from peers.
pub mod state;

pub use error::{RequestError, RequestResult};
pub use state::{NodeKind, NodeRequest, TrieNodesClient, TrieNodesFut};
