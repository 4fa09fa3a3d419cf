use super::*;
use crate::swarm::Progress;
use parking_lot::Mutex;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn boundary_files() -> Vec<FileEntry> {
    vec![
        FileEntry::new(PathBuf::from("test0"), 50, 0),
        FileEntry::new(PathBuf::from("test1"), 30, 50),
        FileEntry::new(PathBuf::from("test2"), 20, 80),
    ]
}

#[test]
fn test_spans_across_file_boundary() {
    // Piece 1 of a 40-byte-piece torrent covers [40, 80).
    let spans = piece_file_spans(&boundary_files(), 1, 40, 80).unwrap();

    assert_eq!(
        spans,
        vec![
            FileSpan {
                file_index: 0,
                file_offset: 40,
                piece_offset: 0,
                length: 10,
            },
            FileSpan {
                file_index: 1,
                file_offset: 0,
                piece_offset: 10,
                length: 30,
            },
        ]
    );
}

#[test]
fn test_spans_within_single_file() {
    let spans = piece_file_spans(&boundary_files(), 0, 0, 40).unwrap();

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].file_index, 0);
    assert_eq!(spans[0].file_offset, 0);
    assert_eq!(spans[0].length, 40);
}

#[test]
fn test_spans_cover_piece_exactly_once() {
    let files = boundary_files();
    let piece_length = 40u64;
    let total = 100u64;
    let piece_count = total.div_ceil(piece_length);

    for index in 0..piece_count {
        let begin = index * piece_length;
        let end = (begin + piece_length).min(total);
        let spans = piece_file_spans(&files, index as u32, begin, end).unwrap();

        // Totality: lengths sum to the piece length.
        let covered: u64 = spans.iter().map(|s| s.length).sum();
        assert_eq!(covered, end - begin);

        // Disjointness: piece offsets tile [0, len) in order, no overlap.
        let mut cursor = 0u64;
        for span in &spans {
            assert_eq!(span.piece_offset, cursor);
            cursor += span.length;
        }
        assert_eq!(cursor, end - begin);
    }
}

#[test]
fn test_spans_three_files_for_wide_piece() {
    let spans = piece_file_spans(&boundary_files(), 0, 40, 100).unwrap();
    assert_eq!(spans.len(), 3);
}

#[test]
fn test_no_files_for_piece() {
    assert!(matches!(
        piece_file_spans(&[], 2, 80, 100),
        Err(StorageError::NoFilesForPiece(2))
    ));

    // A layout that stops short of the piece is just as broken.
    let files = vec![FileEntry::new(PathBuf::from("only"), 50, 0)];
    assert!(matches!(
        piece_file_spans(&files, 1, 40, 80),
        Err(StorageError::NoFilesForPiece(1))
    ));
}

#[test]
fn test_file_entry_ranges() {
    let file = FileEntry::new(PathBuf::from("x"), 30, 50);
    assert_eq!(file.byte_range(), 50..80);
    assert!(file.contains_offset(50));
    assert!(file.contains_offset(79));
    assert!(!file.contains_offset(80));
    assert!(!file.contains_offset(49));
}

#[derive(Clone)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_writer_single_file() {
    let temp = TempDir::new().unwrap();
    let files = vec![FileEntry::new(PathBuf::from("out.dat"), 100, 0)];
    let writer = OutputWriter::new(temp.path().to_path_buf(), files);

    let data: Vec<u8> = (0..40u32).map(|i| i as u8).collect();
    let written = writer.write_piece(0, 0, &data).await.unwrap();
    assert_eq!(written, 40);

    let on_disk = std::fs::read(temp.path().join("out.dat")).unwrap();
    assert_eq!(on_disk, data);
}

#[tokio::test]
async fn test_writer_splits_piece_across_files() {
    let temp = TempDir::new().unwrap();
    let writer = OutputWriter::new(temp.path().to_path_buf(), boundary_files());

    let content: Vec<u8> = (0..100u32).map(|i| (i * 3) as u8).collect();

    // Deliver pieces out of index order; files fill in sparsely.
    writer.write_piece(2, 80, &content[80..100]).await.unwrap();
    writer.write_piece(0, 0, &content[0..40]).await.unwrap();
    writer.write_piece(1, 40, &content[40..80]).await.unwrap();

    assert_eq!(
        std::fs::read(temp.path().join("test0")).unwrap(),
        &content[0..50]
    );
    assert_eq!(
        std::fs::read(temp.path().join("test1")).unwrap(),
        &content[50..80]
    );
    assert_eq!(
        std::fs::read(temp.path().join("test2")).unwrap(),
        &content[80..100]
    );
}

#[tokio::test]
async fn test_writer_creates_nested_directories() {
    let temp = TempDir::new().unwrap();
    let files = vec![FileEntry::new(PathBuf::from("a/b/c.dat"), 10, 0)];
    let writer = OutputWriter::new(temp.path().to_path_buf(), files);

    writer.write_piece(0, 0, &[7u8; 10]).await.unwrap();

    let on_disk = std::fs::read(temp.path().join("a/b/c.dat")).unwrap();
    assert_eq!(on_disk, vec![7u8; 10]);
}

#[tokio::test]
async fn test_writer_rewrite_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let files = vec![FileEntry::new(PathBuf::from("out.dat"), 40, 0)];
    let writer = OutputWriter::new(temp.path().to_path_buf(), files);

    let data = vec![0x5Au8; 40];
    writer.write_piece(0, 0, &data).await.unwrap();
    writer.write_piece(0, 0, &data).await.unwrap();

    let on_disk = std::fs::read(temp.path().join("out.dat")).unwrap();
    assert_eq!(on_disk, data);
}

#[tokio::test]
async fn test_writer_reports_progress() {
    let temp = TempDir::new().unwrap();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = SharedSink(observed.clone());

    let files = vec![FileEntry::new(PathBuf::from("out.dat"), 80, 0)];
    let writer = OutputWriter::new(temp.path().to_path_buf(), files)
        .with_progress(Progress::sink(Box::new(sink)));

    writer.write_piece(0, 0, &[1u8; 40]).await.unwrap();
    writer.write_piece(1, 40, &[2u8; 40]).await.unwrap();

    assert_eq!(observed.lock().len(), 80);
}
