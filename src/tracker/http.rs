use super::error::TrackerError;
use super::response::{AnnounceResponse, RawAnnounce};
use crate::constants::{HTTP_TRACKER_TIMEOUT, USER_AGENT};
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;

/// Everything except the unreserved characters, matching the escaping
/// trackers expect for binary query values.
const URL_UNSAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// An HTTP tracker client ([BEP-3]).
///
/// # Examples
///
/// ```no_run
/// use rleech::tracker::HttpTracker;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tracker = HttpTracker::new("http://tracker.example.com/announce")?;
/// let response = tracker
///     .announce(&[0u8; 20], &[0u8; 20], 6881, 0, 0, 1000)
///     .await?;
/// println!("found {} peers", response.peers.len());
/// # Ok(())
/// # }
/// ```
///
/// [BEP-3]: http://bittorrent.org/beps/bep_0003.html
pub struct HttpTracker {
    client: Client,
    url: String,
}

impl HttpTracker {
    pub fn new(url: &str) -> Result<Self, TrackerError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TrackerError::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .timeout(HTTP_TRACKER_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(TrackerError::Http)?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Composes the announce URL. Parameters are emitted in sorted key
    /// order with compact peer lists requested.
    pub fn announce_url(
        &self,
        info_hash: &[u8; 20],
        peer_id: &[u8; 20],
        port: u16,
        uploaded: u64,
        downloaded: u64,
        left: u64,
    ) -> String {
        format!(
            "{}?compact=1&downloaded={}&info_hash={}&left={}&peer_id={}&port={}&uploaded={}",
            self.url,
            downloaded,
            url_encode(info_hash),
            left,
            url_encode(peer_id),
            port,
            uploaded
        )
    }

    /// Announces to the tracker and returns the peers it knows about.
    pub async fn announce(
        &self,
        info_hash: &[u8; 20],
        peer_id: &[u8; 20],
        port: u16,
        uploaded: u64,
        downloaded: u64,
        left: u64,
    ) -> Result<AnnounceResponse, TrackerError> {
        let url = self.announce_url(info_hash, peer_id, port, uploaded, downloaded, left);

        let response = self.client.get(&url).send().await?;
        let bytes = response.bytes().await?;

        let raw: RawAnnounce = serde_bencode::from_bytes(&bytes)?;
        raw.into_response()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn url_encode(bytes: &[u8]) -> String {
    percent_encode(bytes, URL_UNSAFE).to_string()
}
