use thiserror::Error;

/// Errors that can occur during peer communication.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Network I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent an invalid handshake.
    #[error("invalid handshake")]
    InvalidHandshake,

    /// The peer's info hash doesn't match ours.
    #[error("info hash mismatch")]
    InfoHashMismatch,

    /// Received a malformed protocol message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Received a message ID we don't understand. Non-fatal outside the
    /// session bootstrap: the session logs it and drops the frame.
    #[error("unknown message id: {0}")]
    UnknownMessageId(u8),

    /// The connection was closed mid-frame.
    #[error("connection closed")]
    ConnectionClosed,

    /// Operation timed out.
    #[error("timeout")]
    Timeout,

    /// Protocol violation by the peer.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Error decoding bencode in extension messages.
    #[error("bencode error: {0}")]
    Bencode(#[from] serde_bencode::Error),
}

impl PeerError {
    /// Whether this error is a framing or semantics violation rather than
    /// a transport failure. The coordinator treats both the same way, but
    /// logs them differently.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            PeerError::InvalidHandshake
                | PeerError::InvalidMessage(_)
                | PeerError::Protocol(_)
                | PeerError::Bencode(_)
        )
    }
}

/// Failure while bringing a peer session up, keyed by the phase that
/// failed so the coordinator can apply its retry policy.
#[derive(Debug, Error)]
pub enum EstablishError {
    /// TCP dial failed or timed out; the peer is unreachable.
    #[error("connect failed: {0}")]
    Connect(#[source] PeerError),

    /// Handshake exchange failed, timed out, or announced a foreign
    /// info hash.
    #[error("handshake failed: {0}")]
    Handshake(#[source] PeerError),

    /// The peer did not lead with its bitfield.
    #[error("bitfield bootstrap failed: {0}")]
    Bootstrap(#[source] PeerError),
}

/// Failure while downloading a single piece.
#[derive(Debug, Error)]
pub enum PieceError {
    /// The assembled piece did not hash to the expected digest. Non-fatal
    /// to the session: the piece is re-queued and the session moves on.
    #[error("piece {0} failed hash verification")]
    HashMismatch(u32),

    /// Transport or protocol failure; fatal to the session.
    #[error(transparent)]
    Peer(#[from] PeerError),
}
