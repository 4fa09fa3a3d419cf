use crate::storage::StorageError;
use crate::torrent::TorrentError;
use thiserror::Error;

/// Coordinator-level failures. Per-peer failures never surface here;
/// they are absorbed by the session retry policy.
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("invalid torrent descriptor: {0}")]
    Descriptor(#[from] TorrentError),

    /// The output writer failed; an invariant was violated or the disk
    /// is gone, so the download cannot continue.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    /// Every peer producer hung up and no session is running, but
    /// pieces remain outstanding.
    #[error("peer source exhausted with {remaining} pieces outstanding")]
    PeerSourceExhausted { remaining: usize },
}
