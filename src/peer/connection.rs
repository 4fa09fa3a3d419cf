use super::bitfield::Bitfield;
use super::error::{EstablishError, PeerError};
use super::extension::ExtensionHandshake;
use super::message::{Handshake, Message};
use super::transport::PeerTransport;
use crate::clock::Clock;
use crate::config::SwarmConfig;
use crate::constants::{EXTENSION_HANDSHAKE_ID, IDLE_READ_TIMEOUT};
use crate::torrent::PeerId;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// One fully-established connection to a remote peer.
///
/// `establish` walks the whole session bootstrap: TCP dial, handshake
/// exchange, optional BEP-10 capability probe, and the mandatory leading
/// bitfield. Afterwards the connection is in the negotiated state (we
/// have sent Unchoke and Interested) and ready to drive a pipeline.
///
/// The choke flag is updated exclusively from incoming Choke/Unchoke
/// messages, inside [`PeerConnection::read_message`].
pub struct PeerConnection {
    addr: SocketAddr,
    peer_id: Option<PeerId>,
    am_choked: bool,
    am_interested: bool,
    bitfield: Bitfield,
    peer_supports_extension: bool,
    peer_supports_metadata: bool,
    connected_at: Instant,
    last_message_at: Instant,
    clock: Arc<dyn Clock>,
    transport: PeerTransport,
}

impl PeerConnection {
    pub async fn establish(
        addr: SocketAddr,
        info_hash: [u8; 20],
        client_id: PeerId,
        piece_count: usize,
        config: &SwarmConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EstablishError> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| EstablishError::Connect(PeerError::Timeout))?
            .map_err(|e| EstablishError::Connect(PeerError::Io(e)))?;

        let mut transport = PeerTransport::new(stream);
        transport.set_read_deadline(config.handshake_timeout);

        let theirs = timeout(config.handshake_timeout, async {
            let ours = Handshake::new(info_hash, *client_id.as_bytes());
            transport.send_handshake(&ours).await?;
            transport.receive_handshake().await
        })
        .await
        .map_err(|_| EstablishError::Handshake(PeerError::Timeout))?
        .map_err(EstablishError::Handshake)?;

        if theirs.info_hash != info_hash {
            return Err(EstablishError::Handshake(PeerError::InfoHashMismatch));
        }

        let peer_supports_extension = theirs.supports_extension_protocol();
        if peer_supports_extension {
            let payload = ExtensionHandshake::ours()
                .encode()
                .map_err(EstablishError::Handshake)?;
            transport
                .send_message(&Message::Extended {
                    id: EXTENSION_HANDSHAKE_ID,
                    payload: payload.into(),
                })
                .await
                .map_err(EstablishError::Handshake)?;
        }

        let (bitfield, peer_supports_metadata) = timeout(
            config.handshake_timeout,
            Self::bootstrap_bitfield(&mut transport, piece_count),
        )
        .await
        .map_err(|_| EstablishError::Bootstrap(PeerError::Timeout))?
        .map_err(EstablishError::Bootstrap)?;

        // Bootstrap is over; fall back to the idle per-message deadline
        // until a pipeline installs the piece deadline.
        transport.set_read_deadline(IDLE_READ_TIMEOUT);

        transport
            .send_message(&Message::Unchoke)
            .await
            .map_err(EstablishError::Bootstrap)?;
        transport
            .send_message(&Message::Interested)
            .await
            .map_err(EstablishError::Bootstrap)?;

        let now = clock.now();
        Ok(Self {
            addr,
            peer_id: PeerId::from_bytes(&theirs.peer_id),
            am_choked: true,
            am_interested: true,
            bitfield,
            peer_supports_extension,
            peer_supports_metadata,
            connected_at: now,
            last_message_at: now,
            clock,
            transport,
        })
    }

    /// Reads the mandatory leading bitfield. A single extended handshake
    /// is tolerated ahead of it (peers commonly send their BEP-10 frame
    /// first); anything else fails the bootstrap.
    async fn bootstrap_bitfield(
        transport: &mut PeerTransport,
        piece_count: usize,
    ) -> Result<(Bitfield, bool), PeerError> {
        let mut supports_metadata = false;
        let mut seen_extension = false;

        loop {
            match transport.receive_message().await? {
                Message::Bitfield(bits) => {
                    let bitfield = Bitfield::from_bytes(bits, piece_count)?;
                    return Ok((bitfield, supports_metadata));
                }
                Message::Extended { id, payload }
                    if id == EXTENSION_HANDSHAKE_ID && !seen_extension =>
                {
                    seen_extension = true;
                    // Permissive: a peer with a garbled extension dict is
                    // still a usable data source.
                    if let Ok(hs) = ExtensionHandshake::decode(&payload) {
                        supports_metadata = hs.supports_metadata();
                    }
                }
                other => {
                    return Err(PeerError::Protocol(format!(
                        "expected bitfield during bootstrap, got {:?}",
                        other
                    )));
                }
            }
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn peer_id(&self) -> Option<PeerId> {
        self.peer_id
    }

    pub fn am_choked(&self) -> bool {
        self.am_choked
    }

    pub fn am_interested(&self) -> bool {
        self.am_interested
    }

    pub fn supports_extension(&self) -> bool {
        self.peer_supports_extension
    }

    pub fn supports_metadata(&self) -> bool {
        self.peer_supports_metadata
    }

    pub fn bitfield(&self) -> &Bitfield {
        &self.bitfield
    }

    /// Records a Have announcement in the peer's bitfield.
    pub fn record_have(&mut self, index: usize) {
        self.bitfield.set(index);
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    pub fn last_message_at(&self) -> Instant {
        self.last_message_at
    }

    /// Moves the connection between read-deadline phases: the idle
    /// per-message deadline, or the piece deadline while a pipeline is
    /// running.
    pub fn set_read_deadline(&mut self, deadline: Duration) {
        self.transport.set_read_deadline(deadline);
    }

    pub async fn send(&mut self, message: Message) -> Result<(), PeerError> {
        self.transport.send_message(&message).await
    }

    /// Reads one message under the current deadline, folding
    /// Choke/Unchoke into the connection state before handing the
    /// message back.
    pub async fn read_message(&mut self) -> Result<Message, PeerError> {
        let message = self.transport.receive_message().await?;
        self.last_message_at = self.clock.now();

        match &message {
            Message::Choke => self.am_choked = true,
            Message::Unchoke => self.am_choked = false,
            _ => {}
        }

        Ok(message)
    }
}
