use super::error::PeerError;
use bytes::Bytes;

/// A bitfield representing which pieces a peer has.
///
/// Each bit represents whether a piece is available (1) or not (0).
/// Bits are numbered from the high bit of the first byte, so bit k of
/// byte k/8 corresponds to piece k.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitfield {
    bits: Vec<u8>,
    piece_count: usize,
}

impl Bitfield {
    /// Creates a new empty bitfield for the given number of pieces.
    pub fn new(piece_count: usize) -> Self {
        let byte_count = piece_count.div_ceil(8);
        Self {
            bits: vec![0; byte_count],
            piece_count,
        }
    }

    /// Creates a bitfield from a raw wire payload.
    ///
    /// Fails if the payload length is not exactly `ceil(piece_count / 8)`
    /// bytes. Spare bits in the last byte are cleared.
    pub fn from_bytes(bytes: Bytes, piece_count: usize) -> Result<Self, PeerError> {
        let expected = piece_count.div_ceil(8);
        if bytes.len() != expected {
            return Err(PeerError::InvalidMessage(format!(
                "bitfield length {} for {} pieces, expected {}",
                bytes.len(),
                piece_count,
                expected
            )));
        }

        let mut bf = Self {
            bits: bytes.to_vec(),
            piece_count,
        };
        bf.clear_spare_bits();
        Ok(bf)
    }

    /// Returns true if the piece at the given index is available.
    /// Out-of-range indices are simply not available.
    pub fn has(&self, index: usize) -> bool {
        if index >= self.piece_count {
            return false;
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        (self.bits[byte_index] >> bit_index) & 1 == 1
    }

    /// Sets the bit for the piece at the given index. Out-of-range
    /// indices are a silent no-op.
    pub fn set(&mut self, index: usize) {
        if index >= self.piece_count {
            return;
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        self.bits[byte_index] |= 1 << bit_index;
    }

    /// Returns the number of pieces that are available.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Returns true if no pieces are available.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Returns the total number of pieces the bitfield covers.
    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    /// Returns the raw bytes of the bitfield.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Clears any spare bits in the last byte that don't correspond to pieces.
    fn clear_spare_bits(&mut self) {
        let spare = (self.bits.len() * 8) - self.piece_count;
        if spare > 0 && spare < 8 && !self.bits.is_empty() {
            let mask = 0xFFu8 << spare;
            let last = self.bits.len() - 1;
            self.bits[last] &= mask;
        }
    }
}
