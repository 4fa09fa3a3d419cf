use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file layout covers no byte of the piece. The mapper can only
    /// get here through a malformed descriptor, so this is fatal to the
    /// download rather than a retryable I/O condition.
    #[error("no files cover piece {0}")]
    NoFilesForPiece(u32),

    /// Fewer bytes reached disk than the piece holds.
    #[error("short write for piece {piece}: wrote {written} of {expected} bytes")]
    ShortWrite {
        piece: u32,
        written: u64,
        expected: u64,
    },
}
