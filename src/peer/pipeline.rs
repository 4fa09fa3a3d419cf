//! The per-piece request pipeline.
//!
//! One pipeline downloads one piece over one connection: it keeps a
//! bounded backlog of in-flight block requests and assembles the blocks
//! as they come back, in whatever order the peer sends them.

use super::connection::PeerConnection;
use super::error::{PeerError, PieceError};
use super::message::Message;
use super::piece::{PieceBuffer, PieceWork};
use crate::config::SwarmConfig;
use crate::constants::IDLE_READ_TIMEOUT;
use bytes::Bytes;
use tokio::time::timeout;
use tracing::debug;

/// Downloads and verifies one piece.
///
/// The whole exchange runs under the configured piece deadline; expiry
/// surfaces as [`PeerError::Timeout`] and fails the session. A hash
/// mismatch after assembly surfaces as [`PieceError::HashMismatch`],
/// which the session treats as re-queue-and-continue.
pub async fn download_piece(
    conn: &mut PeerConnection,
    work: &PieceWork,
    config: &SwarmConfig,
) -> Result<Bytes, PieceError> {
    // The piece deadline goes onto the connection for the duration of
    // this exchange; the idle deadline comes back when it's done.
    conn.set_read_deadline(config.piece_deadline);
    let result = match timeout(config.piece_deadline, drive(conn, work, config)).await {
        Ok(result) => result,
        Err(_) => Err(PieceError::Peer(PeerError::Timeout)),
    };
    conn.set_read_deadline(IDLE_READ_TIMEOUT);
    result
}

async fn drive(
    conn: &mut PeerConnection,
    work: &PieceWork,
    config: &SwarmConfig,
) -> Result<Bytes, PieceError> {
    let mut piece = PieceBuffer::new(work);
    let mut requested: u32 = 0;
    let mut downloaded: u32 = 0;
    let mut backlog: u32 = 0;

    while downloaded < work.length {
        // Top up the backlog with block requests, strictly ascending.
        if !conn.am_choked() {
            while backlog < config.max_backlog && requested < work.length {
                let block = (work.length - requested).min(config.block_size);
                conn.send(Message::Request {
                    index: work.index,
                    begin: requested,
                    length: block,
                })
                .await?;
                backlog += 1;
                requested += block;
            }
        }

        match conn.read_message().await {
            Ok(Message::Have { piece: index }) => conn.record_have(index as usize),
            Ok(Message::Piece { index, begin, data }) => {
                if index != work.index {
                    return Err(PieceError::Peer(PeerError::Protocol(format!(
                        "piece {} delivered while downloading piece {}",
                        index, work.index
                    ))));
                }
                piece.write_at(begin, &data)?;
                downloaded += data.len() as u32;
                backlog = backlog.saturating_sub(1);
            }
            // Choke and Unchoke are folded into the connection state by
            // read_message. A choked pipeline keeps reading: in-flight
            // requests may still be answered.
            Ok(_) => {}
            Err(PeerError::UnknownMessageId(id)) => {
                debug!(id, "dropping unknown message");
            }
            Err(e) => return Err(PieceError::Peer(e)),
        }
    }

    if !piece.verify() {
        return Err(PieceError::HashMismatch(work.index));
    }

    Ok(piece.into_bytes())
}
