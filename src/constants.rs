//! Protocol constants and tuning parameters.
//!
//! Defaults follow the classic reference values for a leech-only client:
//! 16 KiB blocks, a backlog of five in-flight requests per peer, and ten
//! concurrent peer sessions.

use std::time::Duration;

// ============================================================================
// Client identification
// ============================================================================

/// Client ID prefix for peer ID generation (Azureus-style)
pub const CLIENT_PREFIX: &[u8] = b"-RL0001-";

/// User agent string for HTTP requests
pub const USER_AGENT: &str = "rleech/0.1.0";

/// Default BitTorrent listen port reported to trackers
pub const DEFAULT_PORT: u16 = 6881;

// ============================================================================
// Protocol constants
// ============================================================================

/// BitTorrent protocol string
pub const PROTOCOL_STRING: &[u8] = b"BitTorrent protocol";

/// Length of the handshake frame in bytes
pub const HANDSHAKE_LEN: usize = 68;

/// Extension protocol bit in reserved byte 5 (BEP-10)
pub const EXTENSION_BIT: u8 = 0x10;

/// Extension handshake message ID (BEP-10)
pub const EXTENSION_HANDSHAKE_ID: u8 = 0;

/// ut_metadata extension ID we advertise
pub const UT_METADATA_ID: u8 = 1;

/// Maximum accepted message size (16MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

// ============================================================================
// Block and piece sizes
// ============================================================================

/// Standard block size (16KB)
pub const BLOCK_SIZE: u32 = 16384;

/// Maximum in-flight block requests per peer session
pub const MAX_BACKLOG: u32 = 5;

// ============================================================================
// Connection limits
// ============================================================================

/// Maximum concurrent peer sessions
pub const MAX_CONNECTIONS: usize = 10;

// ============================================================================
// Timeouts
// ============================================================================

/// TCP connection timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Handshake exchange timeout, also applied to the bitfield bootstrap read
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for downloading one piece, first request to final block
pub const PIECE_DEADLINE: Duration = Duration::from_secs(30);

/// Per-message read deadline while a session is otherwise idle
pub const IDLE_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Write timeout for outgoing messages
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before re-queuing a peer when the session cap is reached
pub const PEER_BACKOFF: Duration = Duration::from_secs(3);

/// How often the coordinator re-checks for an exhausted peer source
pub const SOURCE_POLL_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Tracker
// ============================================================================

/// HTTP tracker request timeout
pub const HTTP_TRACKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default announce interval when the tracker doesn't name one
pub const TRACKER_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(1800);

/// Minimum announce interval we honor
pub const TRACKER_MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Delay before retrying a failed announce
pub const TRACKER_RETRY_INTERVAL: Duration = Duration::from_secs(30);
