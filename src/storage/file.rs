use super::error::StorageError;
use std::path::PathBuf;

/// A file in the torrent's layout, in torrent-absolute coordinates.
///
/// Entries are contiguous and non-overlapping; the first starts at
/// offset 0 and the last ends at the torrent's total length. A
/// single-file torrent carries one synthetic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the output root.
    pub path: PathBuf,
    /// File size in bytes.
    pub length: u64,
    /// Where the file's content starts within the torrent.
    pub offset: u64,
}

impl FileEntry {
    pub fn new(path: PathBuf, length: u64, offset: u64) -> Self {
        Self {
            path,
            length,
            offset,
        }
    }

    pub fn byte_range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.length
    }

    pub fn contains_offset(&self, offset: u64) -> bool {
        offset >= self.offset && offset < self.offset + self.length
    }
}

/// One write the output writer must perform for a piece: `length` bytes
/// taken from `piece_offset` within the piece, landing at `file_offset`
/// within `files[file_index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpan {
    pub file_index: usize,
    pub file_offset: u64,
    pub piece_offset: u64,
    pub length: u64,
}

/// Computes the writes covering piece `[piece_begin, piece_end)`.
///
/// Spans come out in file order and are contiguous within each file;
/// their lengths sum to the piece length. A piece crossing a file
/// boundary produces two or more spans. An empty result means the
/// descriptor is broken and surfaces as [`StorageError::NoFilesForPiece`].
pub fn piece_file_spans(
    files: &[FileEntry],
    piece_index: u32,
    piece_begin: u64,
    piece_end: u64,
) -> Result<Vec<FileSpan>, StorageError> {
    let mut spans = Vec::new();
    let mut cursor = piece_begin;
    let mut remaining = piece_end - piece_begin;

    for (file_index, file) in files.iter().enumerate() {
        if remaining == 0 {
            break;
        }

        let file_end = file.offset + file.length;
        if cursor >= file.offset && cursor < file_end {
            let take = remaining.min(file_end - cursor);

            spans.push(FileSpan {
                file_index,
                file_offset: cursor - file.offset,
                piece_offset: cursor - piece_begin,
                length: take,
            });

            cursor += take;
            remaining -= take;
        }
    }

    if spans.is_empty() || remaining != 0 {
        return Err(StorageError::NoFilesForPiece(piece_index));
    }

    Ok(spans)
}
