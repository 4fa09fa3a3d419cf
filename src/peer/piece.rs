//! Piece work items and the per-piece assembly buffer.

use super::error::PeerError;
use bytes::Bytes;
use sha1::{Digest, Sha1};

/// A piece waiting to be downloaded. These are the items on the swarm's
/// work queue; the buffer itself is allocated only once a session starts
/// on the piece, so a re-queued piece always starts from a clean slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceWork {
    /// The piece index.
    pub index: u32,
    /// Expected SHA-1 digest of the piece content.
    pub hash: [u8; 20],
    /// Piece length in bytes; only the torrent's last piece may be short.
    pub length: u32,
}

/// A downloaded, hash-verified piece on its way to the output writer.
#[derive(Debug, Clone)]
pub struct PieceResult {
    /// The piece index.
    pub index: u32,
    /// The verified piece content.
    pub data: Bytes,
}

/// The mutable byte buffer a piece is assembled in.
///
/// Blocks may arrive in any order; `write_at` never extends the buffer,
/// and verification compares the full buffer against the expected hash
/// once every block is in.
#[derive(Debug)]
pub struct PieceBuffer {
    index: u32,
    hash: [u8; 20],
    buf: Vec<u8>,
}

impl PieceBuffer {
    pub fn new(work: &PieceWork) -> Self {
        Self {
            index: work.index,
            hash: work.hash,
            buf: vec![0u8; work.length as usize],
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn len(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Copies a block into the buffer at the given offset. Fails if the
    /// block would fall outside the piece.
    pub fn write_at(&mut self, offset: u32, block: &[u8]) -> Result<(), PeerError> {
        let offset = offset as usize;
        if offset >= self.buf.len() || offset + block.len() > self.buf.len() {
            return Err(PeerError::Protocol(format!(
                "block [{}, {}) outside piece {} of length {}",
                offset,
                offset + block.len(),
                self.index,
                self.buf.len()
            )));
        }
        self.buf[offset..offset + block.len()].copy_from_slice(block);
        Ok(())
    }

    /// Compares the SHA-1 of the assembled buffer with the expected hash.
    pub fn verify(&self) -> bool {
        let mut hasher = Sha1::new();
        hasher.update(&self.buf);
        let digest: [u8; 20] = hasher.finalize().into();
        digest == self.hash
    }

    /// A read-only view into `[begin, end)` of the buffer; used by the
    /// output writer to split a piece across file boundaries.
    pub fn section(&self, begin: usize, end: usize) -> &[u8] {
        &self.buf[begin..end]
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}
