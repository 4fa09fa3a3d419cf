//! The per-peer session: one worker driving one TCP connection.

use super::connection::PeerConnection;
use super::error::{EstablishError, PieceError};
use super::message::Message;
use super::piece::{PieceResult, PieceWork};
use super::pipeline::download_piece;
use crate::clock::Clock;
use crate::config::SwarmConfig;
use crate::torrent::Torrent;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Why a session ended. The coordinator uses this to decide whether the
/// peer goes back into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// TCP dial failed; the peer is unreachable.
    ConnectFailed,
    /// Handshake failed, timed out, or carried a foreign info hash.
    HandshakeFailed,
    /// The peer did not lead with its bitfield.
    BootstrapFailed,
    /// Transport failure or deadline expiry mid-session.
    Io,
    /// The peer violated framing or message invariants mid-session.
    Protocol,
    /// The work queue drained or the coordinator shut the swarm down.
    Finished,
}

impl TerminationCause {
    /// Unreachable or misbehaving-at-the-door peers are dropped; peers
    /// that failed mid-transfer may recover and are retried later.
    pub fn returns_peer_to_pool(&self) -> bool {
        matches!(
            self,
            TerminationCause::Io | TerminationCause::Protocol | TerminationCause::Finished
        )
    }
}

impl From<&EstablishError> for TerminationCause {
    fn from(error: &EstablishError) -> Self {
        match error {
            EstablishError::Connect(_) => TerminationCause::ConnectFailed,
            EstablishError::Handshake(_) => TerminationCause::HandshakeFailed,
            EstablishError::Bootstrap(_) => TerminationCause::BootstrapFailed,
        }
    }
}

/// A worker that connects to one peer and works through the swarm's
/// piece queue until the queue drains or the connection dies.
///
/// A session holds at most one piece at a time. Pieces the peer does not
/// have go straight back onto the queue; pieces that fail verification
/// go back with a fresh buffer; pieces interrupted by an I/O failure go
/// back before the session reports its termination.
pub struct PeerSession {
    torrent: Arc<Torrent>,
    config: Arc<SwarmConfig>,
    clock: Arc<dyn Clock>,
    work_tx: flume::Sender<PieceWork>,
    work_rx: flume::Receiver<PieceWork>,
    results: flume::Sender<PieceResult>,
    shutdown: watch::Receiver<bool>,
}

impl PeerSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        torrent: Arc<Torrent>,
        config: Arc<SwarmConfig>,
        clock: Arc<dyn Clock>,
        work_tx: flume::Sender<PieceWork>,
        work_rx: flume::Receiver<PieceWork>,
        results: flume::Sender<PieceResult>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            torrent,
            config,
            clock,
            work_tx,
            work_rx,
            results,
            shutdown,
        }
    }

    /// Runs the session to completion. The socket is released on every
    /// exit path; the returned cause feeds the coordinator's peer policy.
    pub async fn run(self, addr: SocketAddr) -> TerminationCause {
        let Self {
            torrent,
            config,
            clock,
            work_tx,
            work_rx,
            results,
            mut shutdown,
        } = self;

        let mut conn = match PeerConnection::establish(
            addr,
            torrent.info_hash,
            torrent.client_id,
            torrent.piece_count(),
            &config,
            clock,
        )
        .await
        {
            Ok(conn) => conn,
            Err(e) => {
                warn!(peer = %addr, error = %e, "session setup failed");
                return (&e).into();
            }
        };

        debug!(peer = %addr, peer_id = ?conn.peer_id(), "session established");

        loop {
            let work = tokio::select! {
                work = work_rx.recv_async() => match work {
                    Ok(work) => work,
                    Err(_) => return TerminationCause::Finished,
                },
                _ = shutdown.changed() => return TerminationCause::Finished,
            };

            if !conn.bitfield().has(work.index as usize) {
                if work_tx.send_async(work).await.is_err() {
                    return TerminationCause::Finished;
                }
                // Let other sessions grab the piece before we see it again.
                tokio::task::yield_now().await;
                continue;
            }

            match download_piece(&mut conn, &work, &config).await {
                Ok(data) => {
                    let have_failed = conn
                        .send(Message::Have { piece: work.index })
                        .await
                        .is_err();

                    let result = PieceResult {
                        index: work.index,
                        data,
                    };
                    if results.send_async(result).await.is_err() {
                        return TerminationCause::Finished;
                    }

                    if have_failed {
                        warn!(peer = %addr, piece = work.index, "have announcement failed");
                        return TerminationCause::Io;
                    }
                }
                Err(PieceError::HashMismatch(index)) => {
                    warn!(peer = %addr, piece = index, "piece failed verification, re-queuing");
                    if work_tx.send_async(work).await.is_err() {
                        return TerminationCause::Finished;
                    }
                }
                Err(PieceError::Peer(e)) => {
                    warn!(peer = %addr, piece = work.index, error = %e, "piece download failed");
                    if work_tx.send_async(work).await.is_err() {
                        return TerminationCause::Finished;
                    }
                    return if e.is_protocol_violation() {
                        TerminationCause::Protocol
                    } else {
                        TerminationCause::Io
                    };
                }
            }
        }
    }
}
