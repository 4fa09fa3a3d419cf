//! Swarm tuning options.

use crate::constants;
use std::time::Duration;

/// Recognized options for a download run.
///
/// All fields default to the protocol's classic values; override the ones
/// you care about before handing the config to [`crate::swarm::Swarm`].
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    /// TCP dial deadline.
    pub connect_timeout: Duration,
    /// Handshake exchange deadline (send plus read combined), also used
    /// for the bitfield bootstrap read.
    pub handshake_timeout: Duration,
    /// Per-piece download deadline, first request to final block.
    pub piece_deadline: Duration,
    /// Cap on concurrent peer sessions.
    pub max_connections: usize,
    /// In-flight block requests per session.
    pub max_backlog: u32,
    /// Bytes per block request.
    pub block_size: u32,
    /// Delay before re-queuing a peer when the session cap is reached.
    pub backoff_full: Duration,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            connect_timeout: constants::CONNECT_TIMEOUT,
            handshake_timeout: constants::HANDSHAKE_TIMEOUT,
            piece_deadline: constants::PIECE_DEADLINE,
            max_connections: constants::MAX_CONNECTIONS,
            max_backlog: constants::MAX_BACKLOG,
            block_size: constants::BLOCK_SIZE,
            backoff_full: constants::PEER_BACKOFF,
        }
    }
}
