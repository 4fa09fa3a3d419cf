use super::*;
use crate::config::SwarmConfig;
use crate::peer::{Bitfield, Handshake, Message, PeerTransport, TerminationCause};
use crate::storage::FileEntry;
use crate::torrent::{PeerId, Torrent};
use bytes::Bytes;
use parking_lot::Mutex;
use sha1::{Digest, Sha1};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn sha1_of(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn test_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31) % 251) as u8).collect()
}

fn build_torrent(
    output_root: PathBuf,
    piece_length: u64,
    files: Vec<FileEntry>,
    content: &[u8],
) -> Torrent {
    let total_length = content.len() as u64;
    let piece_hashes = content
        .chunks(piece_length as usize)
        .map(sha1_of)
        .collect();

    Torrent {
        info_hash: [0x42; 20],
        piece_length,
        total_length,
        piece_hashes,
        files,
        output_root,
        client_id: PeerId::generate(),
    }
}

/// Serves one leech connection with the full content, optionally
/// corrupting the very first block once to exercise the hash-mismatch
/// re-queue path.
async fn spawn_seeder(
    info_hash: [u8; 20],
    piece_length: u64,
    content: Arc<Vec<u8>>,
    corrupt_once: bool,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut transport = PeerTransport::new(stream);
        transport.set_read_deadline(TEST_TIMEOUT);

        let _ = transport.receive_handshake().await.unwrap();
        let mut reply = Handshake::new(info_hash, *PeerId::generate().as_bytes());
        reply.reserved = [0u8; 8];
        transport.send_handshake(&reply).await.unwrap();

        let piece_count = content.len().div_ceil(piece_length as usize);
        let mut bitfield = Bitfield::new(piece_count);
        for i in 0..piece_count {
            bitfield.set(i);
        }
        transport
            .send_message(&Message::Bitfield(Bytes::copy_from_slice(
                bitfield.as_bytes(),
            )))
            .await
            .unwrap();
        transport.send_message(&Message::Unchoke).await.unwrap();

        let mut corrupted = false;
        loop {
            let message = match transport.receive_message().await {
                Ok(message) => message,
                Err(_) => break,
            };

            if let Message::Request {
                index,
                begin,
                length,
            } = message
            {
                let start = index as usize * piece_length as usize + begin as usize;
                let mut block = content[start..start + length as usize].to_vec();

                if corrupt_once && !corrupted && index == 0 && begin == 0 {
                    block[0] ^= 0xFF;
                    corrupted = true;
                }

                transport
                    .send_message(&Message::Piece {
                        index,
                        begin,
                        data: Bytes::from(block),
                    })
                    .await
                    .unwrap();
            }
        }
    });

    addr
}

#[derive(Clone)]
struct CountingSink(Arc<Mutex<u64>>);

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        *self.0.lock() += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_download_multi_file_torrent() {
    let temp = TempDir::new().unwrap();
    let content = test_content(65000);
    let files = vec![
        FileEntry::new(PathBuf::from("a.bin"), 40000, 0),
        FileEntry::new(PathBuf::from("sub/b.bin"), 25000, 40000),
    ];
    let torrent = build_torrent(temp.path().to_path_buf(), 32768, files, &content);
    let info_hash = torrent.info_hash;

    let addr = spawn_seeder(info_hash, 32768, Arc::new(content.clone()), false).await;

    let observed = Arc::new(Mutex::new(0u64));
    let swarm = Swarm::new(torrent, SwarmConfig::default())
        .with_progress(Progress::sink(Box::new(CountingSink(observed.clone()))));
    let peers = swarm.peer_source();
    peers.send(addr).unwrap();
    drop(peers);

    swarm.run().await.unwrap();

    assert_eq!(
        std::fs::read(temp.path().join("a.bin")).unwrap(),
        &content[..40000]
    );
    assert_eq!(
        std::fs::read(temp.path().join("sub/b.bin")).unwrap(),
        &content[40000..]
    );
    assert_eq!(*observed.lock(), 65000);
}

#[tokio::test]
async fn test_download_survives_hash_mismatch() {
    let temp = TempDir::new().unwrap();
    let content = test_content(50000);
    let files = vec![FileEntry::new(PathBuf::from("out.bin"), 50000, 0)];
    let torrent = build_torrent(temp.path().to_path_buf(), 16384, files, &content);
    let info_hash = torrent.info_hash;

    // The first block of piece 0 arrives corrupted once; the piece goes
    // back on the queue and the second attempt succeeds.
    let addr = spawn_seeder(info_hash, 16384, Arc::new(content.clone()), true).await;

    let swarm = Swarm::new(torrent, SwarmConfig::default());
    let peers = swarm.peer_source();
    peers.send(addr).unwrap();
    drop(peers);

    swarm.run().await.unwrap();

    assert_eq!(std::fs::read(temp.path().join("out.bin")).unwrap(), content);
}

#[tokio::test]
async fn test_empty_peer_source_is_an_error() {
    let temp = TempDir::new().unwrap();
    let content = test_content(100);
    let files = vec![FileEntry::new(PathBuf::from("out.bin"), 100, 0)];
    let torrent = build_torrent(temp.path().to_path_buf(), 100, files, &content);

    let swarm = Swarm::new(torrent, SwarmConfig::default());

    match swarm.run().await {
        Err(SwarmError::PeerSourceExhausted { remaining }) => assert_eq!(remaining, 1),
        other => panic!("expected exhausted peer source, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_unreachable_peer_is_dropped() {
    let temp = TempDir::new().unwrap();
    let content = test_content(100);
    let files = vec![FileEntry::new(PathBuf::from("out.bin"), 100, 0)];
    let torrent = build_torrent(temp.path().to_path_buf(), 100, files, &content);

    // A peer that refuses the connection is not retried, so once the
    // source hangs up the swarm reports exhaustion.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let swarm = Swarm::new(torrent, SwarmConfig::default());
    let peers = swarm.peer_source();
    peers.send(dead_addr).unwrap();
    drop(peers);

    assert!(matches!(
        swarm.run().await,
        Err(SwarmError::PeerSourceExhausted { remaining: 1 })
    ));
}

#[tokio::test]
async fn test_rejects_invalid_descriptor() {
    let temp = TempDir::new().unwrap();
    let content = test_content(100);
    let files = vec![FileEntry::new(PathBuf::from("out.bin"), 90, 0)];
    let torrent = build_torrent(temp.path().to_path_buf(), 100, files, &content);

    let swarm = Swarm::new(torrent, SwarmConfig::default());
    assert!(matches!(
        swarm.run().await,
        Err(SwarmError::Descriptor(_))
    ));
}

#[test]
fn test_termination_policy() {
    assert!(!TerminationCause::ConnectFailed.returns_peer_to_pool());
    assert!(!TerminationCause::HandshakeFailed.returns_peer_to_pool());
    assert!(!TerminationCause::BootstrapFailed.returns_peer_to_pool());
    assert!(TerminationCause::Io.returns_peer_to_pool());
    assert!(TerminationCause::Protocol.returns_peer_to_pool());
    assert!(TerminationCause::Finished.returns_peer_to_pool());
}

#[test]
fn test_disabled_progress_is_a_no_op() {
    let progress = Progress::disabled();
    progress.record(&[1, 2, 3]);
}
