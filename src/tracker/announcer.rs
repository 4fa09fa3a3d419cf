use super::http::HttpTracker;
use crate::constants::{
    TRACKER_ANNOUNCE_INTERVAL, TRACKER_MIN_INTERVAL, TRACKER_RETRY_INTERVAL,
};
use crate::torrent::PeerId;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A periodic announce loop that feeds discovered peers into the
/// swarm's peer source.
///
/// Endpoints already handed to the swarm are not re-sent; duplicates
/// from the tracker are harmless but noisy. The loop ends when the
/// swarm (the receiving side of the channel) goes away.
pub struct Announcer {
    tracker: HttpTracker,
    info_hash: [u8; 20],
    client_id: PeerId,
    port: u16,
    left: u64,
}

impl Announcer {
    pub fn new(
        tracker: HttpTracker,
        info_hash: [u8; 20],
        client_id: PeerId,
        port: u16,
        left: u64,
    ) -> Self {
        Self {
            tracker,
            info_hash,
            client_id,
            port,
            left,
        }
    }

    /// Spawns the announce loop.
    pub fn spawn(self, peers: flume::Sender<SocketAddr>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut known: HashSet<SocketAddr> = HashSet::new();

            loop {
                if peers.is_disconnected() {
                    return;
                }

                let delay = match self
                    .tracker
                    .announce(
                        &self.info_hash,
                        self.client_id.as_bytes(),
                        self.port,
                        0,
                        0,
                        self.left,
                    )
                    .await
                {
                    Ok(response) => {
                        debug!(
                            tracker = self.tracker.url(),
                            peers = response.peers.len(),
                            "announce ok"
                        );

                        for addr in response.peers {
                            if known.insert(addr) && peers.send_async(addr).await.is_err() {
                                return;
                            }
                        }

                        next_interval(response.interval)
                    }
                    Err(e) => {
                        warn!(tracker = self.tracker.url(), error = %e, "announce failed");
                        TRACKER_RETRY_INTERVAL
                    }
                };

                tokio::time::sleep(delay).await;
            }
        })
    }
}

/// The tracker's requested interval, clamped below so a broken tracker
/// cannot make us hammer it, with a sane default when it sends none.
pub(super) fn next_interval(interval: Option<u64>) -> Duration {
    match interval {
        Some(seconds) => Duration::from_secs(seconds).max(TRACKER_MIN_INTERVAL),
        None => TRACKER_ANNOUNCE_INTERVAL,
    }
}
