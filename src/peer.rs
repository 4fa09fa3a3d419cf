//! Peer wire protocol (BEP-3) and per-peer download machinery.
//!
//! This module implements the leech side of the peer wire protocol: the
//! handshake and message codec, the per-connection state, the bounded
//! request pipeline, and the session loop that works through the swarm's
//! piece queue over one TCP connection.

mod bitfield;
mod connection;
mod error;
mod extension;
mod message;
mod piece;
mod pipeline;
mod session;
mod transport;

pub use bitfield::Bitfield;
pub use connection::PeerConnection;
pub use error::{EstablishError, PeerError, PieceError};
pub use extension::ExtensionHandshake;
pub use message::{Handshake, Message, MessageId};
pub use piece::{PieceBuffer, PieceResult, PieceWork};
pub use pipeline::download_piece;
pub use session::{PeerSession, TerminationCause};
pub use transport::PeerTransport;
