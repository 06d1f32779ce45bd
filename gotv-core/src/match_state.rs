use std::collections::HashMap;
use std::sync::RwLock;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::frame::{DeltaMeta, FullMeta, StartMeta};

/// Everything about a live Match except its token, which is immutable and
/// therefore kept outside the lock.
struct MatchInner {
    id: Option<String>,
    signup_fragment: u32,
    tps: f64,
    map: String,
    protocol: u32,
    receive_age: SystemTime,
    latest: u32,
    start_frames: HashMap<u32, StartMeta>,
    full_frames: HashMap<u32, FullMeta>,
    delta_frames: HashMap<u32, DeltaMeta>,
}

/// A summary snapshot of a Match, safe to hand out without holding the lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub token: String,
    pub id: Option<String>,
    pub signup_fragment: u32,
    pub latest: u32,
    pub map: String,
    pub protocol: u32,
    pub tps: f64,
}

/// A live broadcast. All three fragment mappings and all scalar fields share
/// a single reader/writer lock: writes (`on_start`/`on_full`/`on_delta`) take
/// the writer, reads take the reader, and `sync` takes the reader for its
/// entire computation so `latest`, the frame maps, and `receive_age` are
/// observed consistently.
pub struct Match {
    token: String,
    inner: RwLock<MatchInner>,
}

impl Match {
    pub(crate) fn new(token: String, id: Option<String>, fragment: u32, meta: StartMeta) -> Self {
        let mut start_frames = HashMap::new();
        start_frames.insert(fragment, meta);
        Match {
            token,
            inner: RwLock::new(MatchInner {
                id,
                signup_fragment: fragment,
                tps: 0.0,
                map: String::new(),
                protocol: 0,
                receive_age: SystemTime::UNIX_EPOCH,
                latest: 0,
                start_frames,
                full_frames: HashMap::new(),
                delta_frames: HashMap::new(),
            }),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.inner.read().unwrap().id.clone()
    }

    pub(crate) fn set_id(&self, id: String) {
        self.inner.write().unwrap().id = Some(id);
    }

    pub(crate) fn on_start(&self, fragment: u32, meta: StartMeta, tps: f64, map: String, protocol: u32) {
        let mut inner = self.inner.write().unwrap();
        inner.start_frames.insert(fragment, meta);
        inner.signup_fragment = fragment;
        inner.tps = tps;
        inner.map = map;
        inner.protocol = protocol;
    }

    pub(crate) fn on_full(&self, fragment: u32, meta: FullMeta) {
        let mut inner = self.inner.write().unwrap();
        inner.receive_age = meta.at;
        inner.full_frames.insert(fragment, meta);
        inner.latest = fragment;
    }

    pub(crate) fn on_delta(&self, fragment: u32, meta: DeltaMeta) {
        let mut inner = self.inner.write().unwrap();
        inner.delta_frames.insert(fragment, meta);
    }

    #[must_use]
    pub fn latest(&self) -> u32 {
        self.inner.read().unwrap().latest
    }

    #[must_use]
    pub fn signup_fragment(&self) -> u32 {
        self.inner.read().unwrap().signup_fragment
    }

    #[must_use]
    pub fn has_start(&self, fragment: u32) -> bool {
        self.inner.read().unwrap().start_frames.contains_key(&fragment)
    }

    #[must_use]
    pub fn start_meta(&self, fragment: u32) -> Option<StartMeta> {
        self.inner.read().unwrap().start_frames.get(&fragment).cloned()
    }

    #[must_use]
    pub fn full_meta(&self, fragment: u32) -> Option<FullMeta> {
        self.inner.read().unwrap().full_frames.get(&fragment).cloned()
    }

    #[must_use]
    pub fn delta_meta(&self, fragment: u32) -> Option<DeltaMeta> {
        self.inner.read().unwrap().delta_frames.get(&fragment).cloned()
    }

    /// A fragment number is sync-ready iff both a full and a delta have been
    /// ingested for it.
    #[must_use]
    pub fn is_sync_ready(&self, fragment: u32) -> bool {
        let inner = self.inner.read().unwrap();
        inner.full_frames.contains_key(&fragment) && inner.delta_frames.contains_key(&fragment)
    }

    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        let inner = self.inner.read().unwrap();
        MatchSummary {
            token: self.token.clone(),
            id: inner.id.clone(),
            signup_fragment: inner.signup_fragment,
            latest: inner.latest,
            map: inner.map.clone(),
            protocol: inner.protocol,
            tps: inner.tps,
        }
    }

    /// All fragment numbers for which a start/full/delta frame is present,
    /// used by persistence to know which backing-store keys to read.
    #[must_use]
    pub fn fragment_numbers(&self) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
        let inner = self.inner.read().unwrap();
        let mut starts: Vec<u32> = inner.start_frames.keys().copied().collect();
        let mut fulls: Vec<u32> = inner.full_frames.keys().copied().collect();
        let mut deltas: Vec<u32> = inner.delta_frames.keys().copied().collect();
        starts.sort_unstable();
        fulls.sort_unstable();
        deltas.sort_unstable();
        (starts, fulls, deltas)
    }

    #[must_use]
    pub fn receive_age(&self) -> SystemTime {
        self.inner.read().unwrap().receive_age
    }

    #[must_use]
    pub fn map(&self) -> String {
        self.inner.read().unwrap().map.clone()
    }

    #[must_use]
    pub fn protocol(&self) -> u32 {
        self.inner.read().unwrap().protocol
    }

    #[must_use]
    pub fn tps(&self) -> f64 {
        self.inner.read().unwrap().tps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_never_drops_below_signup_fragment() {
        let m = Match::new("tok".to_string(), None, 10, StartMeta { at: SystemTime::now() });
        assert_eq!(m.signup_fragment(), 10);
        assert_eq!(m.latest(), 0);

        m.on_full(10, FullMeta { at: SystemTime::now(), tick: 100 });
        assert!(m.latest() >= m.signup_fragment());

        m.on_full(12, FullMeta { at: SystemTime::now(), tick: 120 });
        assert_eq!(m.latest(), 12);
        assert!(m.latest() >= m.signup_fragment());
    }

    #[test]
    fn full_then_delta_makes_a_fragment_sync_ready() {
        let m = Match::new("tok".to_string(), None, 1, StartMeta { at: SystemTime::now() });
        assert!(!m.is_sync_ready(1));

        m.on_full(1, FullMeta { at: SystemTime::now(), tick: 10 });
        assert!(!m.is_sync_ready(1));

        m.on_delta(
            1,
            DeltaMeta {
                at: SystemTime::now(),
                endtick: 20,
                final_fragment: false,
            },
        );
        assert!(m.is_sync_ready(1));
    }

    #[test]
    fn most_recent_write_wins_for_a_given_fragment() {
        let m = Match::new("tok".to_string(), None, 1, StartMeta { at: SystemTime::now() });
        m.on_full(1, FullMeta { at: SystemTime::now(), tick: 10 });
        m.on_full(1, FullMeta { at: SystemTime::now(), tick: 99 });
        assert_eq!(m.full_meta(1).unwrap().tick, 99);
    }
}
