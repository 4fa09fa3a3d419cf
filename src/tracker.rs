//! HTTP tracker announce ([BEP-3]).
//!
//! The tracker is a peer-source collaborator: the swarm core only
//! consumes endpoints from a channel, and this module is one way to fill
//! it. It composes the announce URL, decodes the bencoded response, and
//! parses the compact peers blob into socket addresses.
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod announcer;
mod error;
mod http;
mod response;

pub use announcer::Announcer;
pub use error::TrackerError;
pub use http::HttpTracker;
pub use response::{parse_compact_peers, AnnounceResponse};

#[cfg(test)]
mod tests;
