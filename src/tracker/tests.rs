use super::*;

#[test]
fn test_announce_url_composition() {
    let tracker = HttpTracker::new("http://bttracker.debian.org:6969/announce").unwrap();

    let info_hash: [u8; 20] = [
        0xD8, 0xF7, 0x39, 0xCE, 0xC3, 0x28, 0x95, 0x6C, 0xCC, 0x5B, 0xBF, 0x1F, 0x86, 0xD9, 0xFD,
        0xCF, 0xDB, 0xA8, 0xCE, 0xB6,
    ];
    let peer_id: [u8; 20] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
        0x10, 0x11, 0x12, 0x13, 0x14,
    ];

    let url = tracker.announce_url(&info_hash, &peer_id, 6882, 0, 0, 351272960);

    assert_eq!(
        url,
        "http://bttracker.debian.org:6969/announce?compact=1&downloaded=0&info_hash=%D8%F79%CE%C3%28%95l%CC%5B%BF%1F%86%D9%FD%CF%DB%A8%CE%B6&left=351272960&peer_id=%01%02%03%04%05%06%07%08%09%0A%0B%0C%0D%0E%0F%10%11%12%13%14&port=6882&uploaded=0"
    );
}

#[test]
fn test_rejects_non_http_url() {
    assert!(HttpTracker::new("udp://tracker.example.com:6969").is_err());
    assert!(HttpTracker::new("tracker.example.com").is_err());
}

#[test]
fn test_parse_compact_peers() {
    let blob = [192, 0, 2, 1, 0x1A, 0xE1, 198, 51, 100, 7, 0x1A, 0xE9];
    let peers = parse_compact_peers(&blob).unwrap();

    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0], "192.0.2.1:6881".parse().unwrap());
    assert_eq!(peers[1], "198.51.100.7:6889".parse().unwrap());
}

#[test]
fn test_parse_compact_peers_rejects_truncated_blob() {
    let blob = [192, 0, 2, 1, 0x1A];
    assert!(parse_compact_peers(&blob).is_err());
}

#[test]
fn test_announce_response_decode() {
    let body = b"d8:intervali1800e5:peers6:\xc0\x00\x02\x01\x1a\xe1e";
    let raw: super::response::RawAnnounce = serde_bencode::from_bytes(body).unwrap();
    let response = raw.into_response().unwrap();

    assert_eq!(response.interval, Some(1800));
    assert_eq!(response.peers, vec!["192.0.2.1:6881".parse().unwrap()]);
}

#[test]
fn test_next_interval_clamping() {
    use super::announcer::next_interval;
    use crate::constants::{TRACKER_ANNOUNCE_INTERVAL, TRACKER_MIN_INTERVAL};
    use std::time::Duration;

    assert_eq!(next_interval(Some(1800)), Duration::from_secs(1800));
    assert_eq!(next_interval(Some(5)), TRACKER_MIN_INTERVAL);
    assert_eq!(next_interval(None), TRACKER_ANNOUNCE_INTERVAL);
}

#[test]
fn test_announce_response_failure() {
    let body = b"d14:failure reason9:not founde";
    let raw: super::response::RawAnnounce = serde_bencode::from_bytes(body).unwrap();
    assert!(matches!(
        raw.into_response(),
        Err(TrackerError::Failure(_))
    ));
}
