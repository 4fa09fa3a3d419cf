//! The torrent descriptor.
//!
//! Produced by the metainfo collaborator (bencode parsing, magnet
//! resolution and info-hash computation happen outside this crate) and
//! consumed by the swarm coordinator.

use crate::constants::CLIENT_PREFIX;
use crate::storage::FileEntry;
use rand::Rng as _;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TorrentError {
    #[error("piece length must be positive")]
    ZeroPieceLength,

    #[error("expected {expected} piece hashes, got {got}")]
    PieceHashCount { expected: usize, got: usize },

    #[error("file layout does not cover [0, {total}) contiguously")]
    FileLayout { total: u64 },
}

/// The 20-byte identity a peer presents in handshakes and announces.
///
/// Generated ids follow the Azureus convention, the `-RL0001-` prefix
/// followed by twelve random bytes, but nothing downstream depends on
/// that: any exact-20-byte value is accepted, and remote peers follow
/// whatever convention their client uses.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId([u8; 20]);

impl PeerId {
    pub fn generate() -> Self {
        let mut id = [0u8; 20];
        let (prefix, noise) = id.split_at_mut(CLIENT_PREFIX.len());
        prefix.copy_from_slice(CLIENT_PREFIX);
        rand::rng().fill(noise);
        Self(id)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for PeerId {
    // Ids are mostly binary but usually open with a readable client
    // tag; print what's printable and dot out the rest.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PeerId(")?;
        for &byte in &self.0 {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                f.write_str(".")?;
            }
        }
        f.write_str(")")
    }
}

/// Everything the swarm needs to download one torrent.
#[derive(Debug, Clone)]
pub struct Torrent {
    /// SHA-1 of the bencoded info dictionary.
    pub info_hash: [u8; 20],
    /// Nominal piece size; only the last piece may be shorter.
    pub piece_length: u64,
    /// Total content size across all files.
    pub total_length: u64,
    /// Expected SHA-1 digest per piece, in index order.
    pub piece_hashes: Vec<[u8; 20]>,
    /// File layout in torrent-absolute coordinates. A single-file torrent
    /// carries one synthetic entry spanning the whole content.
    pub files: Vec<FileEntry>,
    /// Directory the relative file paths resolve under.
    pub output_root: PathBuf,
    /// The 20-byte ID this client presents in handshakes.
    pub client_id: PeerId,
}

impl Torrent {
    /// Validates the descriptor invariants: positive piece length, a hash
    /// per piece, and a contiguous file layout covering the full length.
    pub fn validate(&self) -> Result<(), TorrentError> {
        if self.piece_length == 0 {
            return Err(TorrentError::ZeroPieceLength);
        }

        let expected = self.total_length.div_ceil(self.piece_length) as usize;
        if self.piece_hashes.len() != expected {
            return Err(TorrentError::PieceHashCount {
                expected,
                got: self.piece_hashes.len(),
            });
        }

        let mut cursor = 0u64;
        for file in &self.files {
            if file.offset != cursor {
                return Err(TorrentError::FileLayout {
                    total: self.total_length,
                });
            }
            cursor += file.length;
        }
        if cursor != self.total_length {
            return Err(TorrentError::FileLayout {
                total: self.total_length,
            });
        }

        Ok(())
    }

    pub fn piece_count(&self) -> usize {
        self.piece_hashes.len()
    }

    /// Where the piece begins and ends in torrent-absolute coordinates.
    /// The end is clamped to the total length, so only the last piece can
    /// come out shorter than `piece_length`.
    pub fn piece_bounds(&self, index: u32) -> (u64, u64) {
        let begin = index as u64 * self.piece_length;
        let end = (begin + self.piece_length).min(self.total_length);
        (begin, end)
    }

    pub fn piece_size(&self, index: u32) -> u64 {
        let (begin, end) = self.piece_bounds(index);
        end - begin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(piece_length: u64, total: u64, files: Vec<FileEntry>) -> Torrent {
        let count = total.div_ceil(piece_length) as usize;
        Torrent {
            info_hash: [0u8; 20],
            piece_length,
            total_length: total,
            piece_hashes: vec![[0u8; 20]; count],
            files,
            output_root: PathBuf::from("."),
            client_id: PeerId::generate(),
        }
    }

    #[test]
    fn test_client_id_convention() {
        let id1 = PeerId::generate();
        let id2 = PeerId::generate();
        assert_ne!(id1.as_bytes(), id2.as_bytes());
        assert!(id1.as_bytes().starts_with(b"-RL0001-"));
    }

    #[test]
    fn test_client_id_accepts_any_exact_20_bytes() {
        assert!(PeerId::from_bytes(&[0u8; 19]).is_none());
        assert!(PeerId::from_bytes(&[0u8; 21]).is_none());

        let id = PeerId::from_bytes(&[7u8; 20]).unwrap();
        assert_eq!(id.as_bytes(), &[7u8; 20]);
    }

    #[test]
    fn test_client_id_debug_dots_unprintable_bytes() {
        let mut raw = *b"-RL0001-____________";
        raw[8] = 0x01;
        raw[9] = 0xFF;
        let id = PeerId::from_bytes(&raw).unwrap();

        let rendered = format!("{:?}", id);
        assert!(rendered.starts_with("PeerId(-RL0001-.."));
    }

    #[test]
    fn test_piece_bounds() {
        let t = descriptor(40, 100, vec![FileEntry::new(PathBuf::from("a"), 100, 0)]);
        assert_eq!(t.piece_count(), 3);
        assert_eq!(t.piece_bounds(0), (0, 40));
        assert_eq!(t.piece_bounds(1), (40, 80));
        assert_eq!(t.piece_bounds(2), (80, 100));
        assert_eq!(t.piece_size(2), 20);
    }

    #[test]
    fn test_only_last_piece_is_short() {
        let t = descriptor(16384, 16384 * 4 + 100, vec![FileEntry::new(
            PathBuf::from("a"),
            16384 * 4 + 100,
            0,
        )]);
        for index in 0..4 {
            assert_eq!(t.piece_size(index), 16384);
        }
        assert_eq!(t.piece_size(4), 100);
    }

    #[test]
    fn test_validate_accepts_contiguous_layout() {
        let t = descriptor(
            40,
            100,
            vec![
                FileEntry::new(PathBuf::from("a"), 60, 0),
                FileEntry::new(PathBuf::from("b"), 40, 60),
            ],
        );
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gaps() {
        let t = descriptor(
            40,
            100,
            vec![
                FileEntry::new(PathBuf::from("a"), 50, 0),
                FileEntry::new(PathBuf::from("b"), 40, 60),
            ],
        );
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_hash_count() {
        let mut t = descriptor(40, 100, vec![FileEntry::new(PathBuf::from("a"), 100, 0)]);
        t.piece_hashes.pop();
        assert!(t.validate().is_err());
    }
}
