//! Disk storage: piece-to-file mapping and the output writer.
//!
//! Torrents split content into fixed-size pieces, and a piece may cross
//! file boundaries in a multi-file layout. This module computes which
//! byte ranges of which files a piece covers, and writes verified pieces
//! into those files at absolute offsets.
//!
//! Files are written sparsely: pieces arrive in whatever order the swarm
//! completes them, and holes of unwritten bytes are fine until the
//! remaining pieces land.
//!
//! # Example
//!
//! ```
//! use rleech::storage::{piece_file_spans, FileEntry};
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("a.bin"), 50, 0),
//!     FileEntry::new(PathBuf::from("b.bin"), 30, 50),
//! ];
//!
//! // Piece [40, 80) straddles the boundary: two writes.
//! let spans = piece_file_spans(&files, 1, 40, 80).unwrap();
//! assert_eq!(spans.len(), 2);
//! ```

mod error;
mod file;
mod writer;

pub use error::StorageError;
pub use file::{piece_file_spans, FileEntry, FileSpan};
pub use writer::OutputWriter;

#[cfg(test)]
mod tests;
