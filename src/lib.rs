//! rleech - a BitTorrent leech engine
//!
//! This library downloads the content described by a torrent descriptor
//! from a swarm of remote peers, verifies it piece by piece, and writes
//! it to disk under the original file layout. It deliberately stops
//! there: no seeding, no endgame mode, no piece-selection strategy
//! beyond a FIFO work queue.
//!
//! # Modules
//!
//! - [`torrent`] - The torrent descriptor handed in by the metainfo collaborator
//! - [`peer`] - BEP-3 peer wire protocol, per-peer sessions and the request pipeline
//! - [`storage`] - Piece-to-file mapping and the output writer
//! - [`swarm`] - The download coordinator: work queue, peer pool, session cap
//! - [`tracker`] - BEP-3 HTTP tracker announce (peer-source collaborator)
//!
//! # Example
//!
//! ```no_run
//! use rleech::config::SwarmConfig;
//! use rleech::swarm::Swarm;
//! # async fn example(torrent: rleech::torrent::Torrent) -> Result<(), Box<dyn std::error::Error>> {
//! let swarm = Swarm::new(torrent, SwarmConfig::default());
//! let peers = swarm.peer_source();
//!
//! // Collaborators (tracker announcer, DHT) feed endpoints into `peers`.
//! peers.send("203.0.113.7:6881".parse()?)?;
//!
//! swarm.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod constants;
pub mod peer;
pub mod storage;
pub mod swarm;
pub mod torrent;
pub mod tracker;

pub use clock::{Clock, SystemClock};
pub use config::SwarmConfig;
pub use peer::{Bitfield, Handshake, Message, PeerConnection, PeerError};
pub use storage::{piece_file_spans, FileEntry, FileSpan, OutputWriter, StorageError};
pub use swarm::{Progress, Swarm, SwarmError};
pub use torrent::{PeerId, Torrent};
pub use tracker::{AnnounceResponse, Announcer, HttpTracker, TrackerError};
