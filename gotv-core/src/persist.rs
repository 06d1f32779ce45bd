//! The gzip + JSON persisted-match format used by `save`/`load`. Encoding is
//! CPU-bound and synchronous; callers on an async runtime should wrap it in
//! `tokio::task::spawn_blocking`.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::frame::{DeltaMeta, FrameKind, FullMeta, StartMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStart {
    pub fragment: u32,
    pub meta: StartMeta,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedFull {
    pub fragment: u32,
    pub meta: FullMeta,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedDelta {
    pub fragment: u32,
    pub meta: DeltaMeta,
    pub body: Vec<u8>,
}

/// A self-describing, byte-for-byte record of a Match: every frame's body is
/// carried inline so `load` needs nothing but the blob itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedMatch {
    pub token: String,
    pub id: Option<String>,
    pub signup_fragment: u32,
    pub tps: f64,
    pub map: String,
    pub protocol: u32,
    pub starts: Vec<PersistedStart>,
    pub fulls: Vec<PersistedFull>,
    pub deltas: Vec<PersistedDelta>,
}

impl PersistedMatch {
    /// The `(fragment, kind)` pairs needed to reassemble the frame bodies,
    /// used by the caller to know what to fetch from the backing store.
    #[must_use]
    pub fn fragment_keys(&self) -> Vec<(u32, FrameKind)> {
        self.starts
            .iter()
            .map(|f| (f.fragment, FrameKind::Start))
            .chain(self.fulls.iter().map(|f| (f.fragment, FrameKind::Full)))
            .chain(self.deltas.iter().map(|f| (f.fragment, FrameKind::Delta)))
            .collect()
    }
}

/// Serializes a Match to gzip-compressed JSON.
pub fn encode(m: &PersistedMatch) -> Result<Vec<u8>, EngineError> {
    let json = serde_json::to_vec(m).map_err(|e| EngineError::Io(e.to_string()))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    encoder.finish().map_err(EngineError::from)
}

/// Deserializes a gzip-compressed JSON blob produced by `encode`.
pub fn decode(bytes: &[u8]) -> Result<PersistedMatch, EngineError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    serde_json::from_slice(&json).map_err(|e| EngineError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    #[test]
    fn round_trips_a_match() {
        let original = PersistedMatch {
            token: "s90152525936315402t1635312048".to_string(),
            id: Some("m1".to_string()),
            signup_fragment: 100,
            tps: 128.0,
            map: "de_dust2".to_string(),
            protocol: 4,
            starts: vec![PersistedStart {
                fragment: 100,
                meta: StartMeta { at: SystemTime::now() },
                body: vec![0xDE, 0xAD],
            }],
            fulls: vec![PersistedFull {
                fragment: 100,
                meta: FullMeta {
                    at: SystemTime::now(),
                    tick: 500,
                },
                body: vec![0xFF, 0x01],
            }],
            deltas: vec![PersistedDelta {
                fragment: 100,
                meta: DeltaMeta {
                    at: SystemTime::now(),
                    endtick: 600,
                    final_fragment: false,
                },
                body: vec![0x02, 0x03],
            }],
        };

        let bytes = encode(&original).unwrap();
        let restored = decode(&bytes).unwrap();

        assert_eq!(restored.token, original.token);
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.signup_fragment, original.signup_fragment);
        assert_eq!(restored.starts[0].body, original.starts[0].body);
        assert_eq!(restored.fulls[0].body, original.fulls[0].body);
        assert_eq!(restored.deltas[0].body, original.deltas[0].body);
    }
}
