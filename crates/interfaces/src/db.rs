//! Content-addressed store abstraction.
//!
//! State sync writes every verified record under its Keccak-256 hash; the
//! engine relies on that property for verification and never asks the store
//! to re-derive it. Two independent stores back a sync round: one for trie
//! nodes and one for contract code, so writes to one never block the other.

use bytes::Bytes;
use lith_primitives::H256;
use thiserror::Error;

/// Store operation result alias.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error variants a content-addressed store can produce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// A content-addressed key-value store.
///
/// Implementations are internally synchronized; calls are synchronous and
/// expected to be short. Re-inserting an existing key with identical content
/// is a harmless no-op.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait StateStore: Send + Sync {
    /// Returns the value stored under the given hash, if any.
    fn get(&self, hash: H256) -> StoreResult<Option<Bytes>>;

    /// Stores a value under its content hash.
    fn insert(&self, hash: H256, bytes: Bytes) -> StoreResult<()>;

    /// Returns whether a value exists for the hash without fetching it.
    fn contains(&self, hash: H256) -> StoreResult<bool>;
}
