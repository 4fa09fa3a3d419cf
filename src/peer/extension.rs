use super::error::PeerError;
use crate::constants::{UT_METADATA_ID, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The BEP-10 extended handshake dictionary, carried as extended message
/// ID 0.
///
/// The dictionary is forward-compatible: peers put arbitrary keys in it,
/// so decoding is permissive and unknown keys are ignored. This crate
/// only uses it as a capability probe for the metadata extension; the
/// metadata exchange itself is a collaborator's concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionHandshake {
    /// Extension name to local message ID.
    #[serde(default)]
    pub m: BTreeMap<String, i64>,

    /// Number of outstanding requests the peer tolerates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reqq: Option<i64>,

    /// Client name and version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
}

impl ExtensionHandshake {
    /// The handshake this client sends: it advertises `ut_metadata`.
    pub fn ours() -> Self {
        let mut m = BTreeMap::new();
        m.insert("ut_metadata".to_string(), UT_METADATA_ID as i64);
        Self {
            m,
            reqq: None,
            v: Some(USER_AGENT.to_string()),
        }
    }

    /// Returns `true` if the peer registered the metadata extension.
    pub fn supports_metadata(&self) -> bool {
        self.m.get("ut_metadata").is_some_and(|&id| id > 0)
    }

    pub fn encode(&self) -> Result<Vec<u8>, PeerError> {
        Ok(serde_bencode::to_bytes(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PeerError> {
        Ok(serde_bencode::from_bytes(data)?)
    }
}
