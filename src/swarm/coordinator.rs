use super::error::SwarmError;
use super::progress::Progress;
use crate::clock::{system_clock, Clock};
use crate::config::SwarmConfig;
use crate::constants::SOURCE_POLL_INTERVAL;
use crate::peer::{PeerSession, PieceResult, PieceWork, TerminationCause};
use crate::storage::OutputWriter;
use crate::torrent::Torrent;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

struct SessionEnd {
    addr: SocketAddr,
    cause: TerminationCause,
}

/// The download coordinator.
///
/// Peers flow in through the source channel (fed by tracker and DHT
/// collaborators, and re-fed by the coordinator itself when a session
/// ends recoverably); pieces flow out through sessions into the output
/// writer. `run` returns once every piece is verified and on disk, or
/// with an error when progress has become impossible.
pub struct Swarm {
    torrent: Arc<Torrent>,
    config: Arc<SwarmConfig>,
    clock: Arc<dyn Clock>,
    progress: Progress,
    peer_tx: flume::Sender<SocketAddr>,
    peer_rx: flume::Receiver<SocketAddr>,
}

impl Swarm {
    pub fn new(torrent: Torrent, config: SwarmConfig) -> Self {
        // One liberally-buffered channel for every peer producer: the
        // announcer, the DHT, and our own timed re-queues all share it.
        // Duplicate endpoints are tolerated; handshakes are idempotent.
        let (peer_tx, peer_rx) = flume::unbounded();
        Self {
            torrent: Arc::new(torrent),
            config: Arc::new(config),
            clock: system_clock(),
            progress: Progress::disabled(),
            peer_tx,
            peer_rx,
        }
    }

    /// A handle collaborators use to feed candidate peers into the swarm.
    pub fn peer_source(&self) -> flume::Sender<SocketAddr> {
        self.peer_tx.clone()
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the download to completion.
    pub async fn run(self) -> Result<(), SwarmError> {
        self.torrent.validate()?;

        let piece_count = self.torrent.piece_count();
        let (work_tx, work_rx) = flume::bounded::<PieceWork>(piece_count);
        for index in 0..piece_count as u32 {
            let work = PieceWork {
                index,
                hash: self.torrent.piece_hashes[index as usize],
                length: self.torrent.piece_size(index) as u32,
            };
            // The queue has exactly piece_count capacity and we hold the
            // receiver, so this cannot fail or block.
            let _ = work_tx.send(work);
        }

        // Rendezvous channel: a session blocks on delivery until the
        // coordinator drains its result, which throttles sessions to the
        // writer's pace.
        let (result_tx, result_rx) = flume::bounded::<PieceResult>(0);
        let (term_tx, term_rx) = flume::unbounded::<SessionEnd>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let writer = OutputWriter::new(
            self.torrent.output_root.clone(),
            self.torrent.files.clone(),
        )
        .with_progress(self.progress.clone());

        let mut done: HashSet<u32> = HashSet::with_capacity(piece_count);
        let mut active_sessions = 0usize;

        info!(
            pieces = piece_count,
            total_bytes = self.torrent.total_length,
            "download starting"
        );

        while done.len() < piece_count {
            if self.source_exhausted(active_sessions) {
                return Err(SwarmError::PeerSourceExhausted {
                    remaining: piece_count - done.len(),
                });
            }

            tokio::select! {
                result = result_rx.recv_async() => {
                    // We hold the original sender, so this cannot disconnect.
                    let Ok(result) = result else { continue };

                    if done.contains(&result.index) {
                        debug!(piece = result.index, "duplicate result discarded");
                        continue;
                    }

                    let (piece_begin, _) = self.torrent.piece_bounds(result.index);
                    writer
                        .write_piece(result.index, piece_begin, &result.data)
                        .await?;

                    done.insert(result.index);
                    debug!(
                        piece = result.index,
                        done = done.len(),
                        total = piece_count,
                        "piece retired"
                    );
                }

                end = term_rx.recv_async() => {
                    let Ok(end) = end else { continue };
                    active_sessions -= 1;

                    if end.cause.returns_peer_to_pool() {
                        debug!(peer = %end.addr, cause = ?end.cause, "returning peer to pool");
                        let _ = self.peer_tx.send_async(end.addr).await;
                    } else {
                        debug!(peer = %end.addr, cause = ?end.cause, "dropping peer");
                    }
                }

                peer = self.peer_rx.recv_async() => {
                    let Ok(addr) = peer else { continue };

                    if active_sessions < self.config.max_connections {
                        active_sessions += 1;
                        let session = PeerSession::new(
                            self.torrent.clone(),
                            self.config.clone(),
                            self.clock.clone(),
                            work_tx.clone(),
                            work_rx.clone(),
                            result_tx.clone(),
                            shutdown_rx.clone(),
                        );
                        let term_tx = term_tx.clone();
                        tokio::spawn(async move {
                            let cause = session.run(addr).await;
                            let _ = term_tx.send_async(SessionEnd { addr, cause }).await;
                        });
                    } else {
                        debug!(peer = %addr, "session cap reached, backing off");
                        let peer_tx = self.peer_tx.clone();
                        let backoff = self.config.backoff_full;
                        tokio::spawn(async move {
                            tokio::time::sleep(backoff).await;
                            let _ = peer_tx.send_async(addr).await;
                        });
                    }
                }

                // Periodic wake-up so a peer source that closed while we
                // were blocked still surfaces as exhaustion.
                _ = tokio::time::sleep(SOURCE_POLL_INTERVAL) => {}
            }
        }

        info!(pieces = piece_count, "download complete");

        // Close the work queue and wake any session blocked on it;
        // sessions mid-delivery observe the dropped result receiver.
        let _ = shutdown_tx.send(true);

        Ok(())
    }

    /// True when no session is running, no candidate peer is waiting,
    /// and only our own re-queue handle keeps the source channel open.
    /// Backoff re-queues in flight hold a sender clone, so they keep the
    /// swarm alive until they deliver.
    fn source_exhausted(&self, active_sessions: usize) -> bool {
        active_sessions == 0 && self.peer_rx.is_empty() && self.peer_rx.sender_count() <= 1
    }
}
