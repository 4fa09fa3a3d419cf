use super::error::TrackerError;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// A decoded announce response.
#[derive(Debug, Clone)]
pub struct AnnounceResponse {
    /// Seconds the tracker wants us to wait before re-announcing.
    pub interval: Option<u64>,
    /// Peer endpoints from the compact peers blob.
    pub peers: Vec<SocketAddr>,
}

/// The bencoded response as it comes off the wire. Trackers attach all
/// sorts of extra keys; unknown ones are ignored.
#[derive(Debug, Deserialize)]
pub(super) struct RawAnnounce {
    #[serde(default)]
    pub interval: Option<i64>,

    /// Compact peers blob: 6 bytes per peer, 4 for the IPv4 address and
    /// 2 for the big-endian port.
    #[serde(default)]
    pub peers: Option<serde_bytes::ByteBuf>,

    #[serde(rename = "failure reason", default)]
    pub failure_reason: Option<String>,
}

impl RawAnnounce {
    pub fn into_response(self) -> Result<AnnounceResponse, TrackerError> {
        if let Some(reason) = self.failure_reason {
            return Err(TrackerError::Failure(reason));
        }

        let peers = match &self.peers {
            Some(blob) => parse_compact_peers(blob)?,
            None => Vec::new(),
        };

        Ok(AnnounceResponse {
            interval: self.interval.and_then(|i| u64::try_from(i).ok()),
            peers,
        })
    }
}

/// Parses a compact peers blob into socket addresses.
///
/// Fails on a blob whose length is not a multiple of six; a truncated
/// blob means the response is corrupt, not that it holds fewer peers.
pub fn parse_compact_peers(data: &[u8]) -> Result<Vec<SocketAddr>, TrackerError> {
    if data.len() % 6 != 0 {
        return Err(TrackerError::InvalidResponse(format!(
            "compact peers blob of {} bytes",
            data.len()
        )));
    }

    Ok(data
        .chunks_exact(6)
        .map(|chunk| {
            let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
            let port = u16::from_be_bytes([chunk[4], chunk[5]]);
            SocketAddr::new(IpAddr::V4(ip), port)
        })
        .collect())
}
