#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Trie-node state sync for lith.
//!
//! Reconstructs a remote Merkle-Patricia state trie by fetching individual
//! content-addressed nodes from untrusted peers. The engine proceeds from a
//! caller-supplied target root:
//!
//! 1. **Request**: [`TreeSync::prepare_request`] drains the highest-priority
//!    pending node fetches into a [`StateSyncBatch`].
//! 2. **Fetch**: the batch is executed against a peer outside the engine
//!    (see `TrieNodesClient` in `lith-interfaces`).
//! 3. **Verify & dispatch**: [`TreeSync::handle_response`] checks every
//!    response against its requested hash, decodes the node shape, persists
//!    nodes whose children are already on disk and parks the rest until
//!    their children resolve.
//!
//! Nothing is ever written to a store before every descendant it references
//! has been verified and written; completion therefore cascades upward and
//! the persisted target root is the terminal signal. Chain reorganizations
//! are handled by [`TreeSync::reset_root`], which discards the in-memory
//! frontier while leaving persisted nodes valid for the next round.

mod cache;
mod config;
mod deps;
mod engine;
mod error;
mod item;
mod metrics;
mod progress;
mod queue;

pub use config::StateSyncConfig;
pub use engine::{SyncProgress, SyncResponseOutcome, SyncState, TreeSync};
pub use error::{StateSyncError, StateSyncResult};
pub use item::{StateSyncBatch, StateSyncItem};
pub use progress::ProgressCounterSnapshot;
