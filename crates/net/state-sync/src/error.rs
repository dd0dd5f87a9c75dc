use lith_interfaces::db::StoreError;
use thiserror::Error;

/// The state sync result type.
pub type StateSyncResult<T> = Result<T, StateSyncError>;

/// Errors the sync engine surfaces to its caller.
///
/// Per-item failures (hash mismatches, malformed nodes, unanswered slots)
/// are recovered internally by re-queueing and never appear here; a single
/// bad response is fatal neither to its batch nor to the round.
#[derive(Debug, Error)]
pub enum StateSyncError {
    /// A store read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The progress snapshot could not be written.
    #[error("failed to persist progress snapshot: {0}")]
    Progress(#[from] std::io::Error),
}
