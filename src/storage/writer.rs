use super::error::StorageError;
use super::file::{piece_file_spans, FileEntry};
use crate::swarm::Progress;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

/// Writes verified pieces into the output files.
///
/// Files are opened per write and closed immediately; nothing is pooled.
/// Writes land at absolute offsets, so pieces may arrive in any index
/// order and files fill in sparsely.
pub struct OutputWriter {
    root: PathBuf,
    files: Vec<FileEntry>,
    progress: Progress,
}

impl OutputWriter {
    pub fn new(root: PathBuf, files: Vec<FileEntry>) -> Self {
        Self {
            root,
            files,
            progress: Progress::disabled(),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Writes one piece into every file it covers and reports the bytes
    /// to the progress sink. Returns the number of bytes written.
    pub async fn write_piece(
        &self,
        index: u32,
        piece_begin: u64,
        data: &[u8],
    ) -> Result<u64, StorageError> {
        let piece_end = piece_begin + data.len() as u64;
        let spans = piece_file_spans(&self.files, index, piece_begin, piece_end)?;

        let mut written = 0u64;
        for span in &spans {
            let path = self.root.join(&self.files[span.file_index].path);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .await?;

            let section =
                &data[span.piece_offset as usize..(span.piece_offset + span.length) as usize];
            file.seek(SeekFrom::Start(span.file_offset)).await?;
            file.write_all(section).await?;
            file.flush().await?;

            written += span.length;
        }

        if written != data.len() as u64 {
            return Err(StorageError::ShortWrite {
                piece: index,
                written,
                expected: data.len() as u64,
            });
        }

        debug!(piece = index, bytes = written, spans = spans.len(), "piece written");
        self.progress.record(data);

        Ok(written)
    }
}
