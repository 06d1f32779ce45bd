use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use metrics::gauge;
use tracing::instrument;

use crate::error::EngineError;
use crate::frame::{DeltaMeta, FrameKind, FullMeta, StartMeta};
use crate::match_state::{Match, MatchSummary};
use crate::persist::{PersistedDelta, PersistedFull, PersistedMatch, PersistedStart};
use crate::store::BackingStore;
use crate::sync::{Sync, compute_sync};

/// Process-wide registry of live Matches, keyed by token. `id` lookups are a
/// linear scan over the same table — correct at the expected cardinality of
/// tens of concurrently live broadcasts (see design notes).
#[derive(Default)]
struct Registry {
    by_token: RwLock<HashMap<String, Arc<Match>>>,
}

impl Registry {
    fn get(&self, token: &str) -> Option<Arc<Match>> {
        self.by_token.read().unwrap().get(token).cloned()
    }

    fn get_or_insert_with(&self, token: &str, create: impl FnOnce() -> Match) -> Arc<Match> {
        if let Some(m) = self.get(token) {
            return m;
        }
        let mut table = self.by_token.write().unwrap();
        table
            .entry(token.to_string())
            .or_insert_with(|| Arc::new(create()))
            .clone()
    }

    fn get_by_id(&self, id: &str) -> Option<Arc<Match>> {
        self.by_token
            .read()
            .unwrap()
            .values()
            .find(|m| m.id().as_deref() == Some(id))
            .cloned()
    }

    fn delete(&self, token: &str) -> bool {
        self.by_token.write().unwrap().remove(token).is_some()
    }

    fn list_tokens(&self) -> Vec<String> {
        self.by_token.read().unwrap().keys().cloned().collect()
    }

    fn list_matches(&self) -> Vec<Arc<Match>> {
        self.by_token.read().unwrap().values().cloned().collect()
    }

    fn insert(&self, m: Arc<Match>) {
        self.by_token
            .write()
            .unwrap()
            .insert(m.token().to_string(), m);
    }

    fn len(&self) -> usize {
        self.by_token.read().unwrap().len()
    }
}

/// The match/fragment engine: registry + pluggable backing store + process
/// configuration. Constructed once per process and shared behind an `Arc`.
pub struct Engine {
    registry: Registry,
    store: Arc<dyn BackingStore>,
    auth: String,
    delay: u32,
    keyframe_interval: f64,
}

impl Engine {
    #[must_use]
    pub fn new(store: Arc<dyn BackingStore>, auth: String, delay: u32, keyframe_interval: f64) -> Self {
        Self {
            registry: Registry::default(),
            store,
            auth,
            delay,
            keyframe_interval,
        }
    }

    /// Compares `secret` against the configured shared secret.
    #[must_use]
    pub fn auth(&self, secret: &str) -> bool {
        self.auth == secret
    }

    // ---- Store contract (write path) ----

    #[instrument(skip(self, body))]
    pub async fn on_start(
        &self,
        token: &str,
        fragment: u32,
        body: Vec<u8>,
        tps: f64,
        map: String,
        protocol: u32,
        id: Option<String>,
    ) -> Result<(), EngineError> {
        self.store.put(token, fragment, FrameKind::Start, body).await?;
        let at = SystemTime::now();
        let m = self
            .registry
            .get_or_insert_with(token, || Match::new(token.to_string(), id.clone(), fragment, StartMeta { at }));
        m.on_start(fragment, StartMeta { at }, tps, map, protocol);
        if let Some(id) = id {
            m.set_id(id.clone());
            self.relegate_by_id(&id, token);
        }
        gauge!("gotv_live_matches").set(self.registry.len() as f64);
        Ok(())
    }

    #[instrument(skip(self, body))]
    pub async fn on_full(&self, token: &str, fragment: u32, tick: u64, body: Vec<u8>) -> Result<(), EngineError> {
        let m = self.registry.get(token).ok_or(EngineError::MatchNotFound)?;
        self.store.put(token, fragment, FrameKind::Full, body).await?;
        m.on_full(fragment, FullMeta { at: SystemTime::now(), tick });

        match compute_sync(&m, None, self.delay, self.keyframe_interval) {
            Ok(sync) => self.store.put_sync(token, &sync).await?,
            Err(EngineError::FragmentNotFound) => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }

    #[instrument(skip(self, body))]
    pub async fn on_delta(
        &self,
        token: &str,
        fragment: u32,
        endtick: u64,
        final_fragment: bool,
        body: Vec<u8>,
    ) -> Result<(), EngineError> {
        let m = self.registry.get(token).ok_or(EngineError::MatchNotFound)?;
        self.store.put(token, fragment, FrameKind::Delta, body).await?;
        m.on_delta(
            fragment,
            DeltaMeta {
                at: SystemTime::now(),
                endtick,
                final_fragment,
            },
        );
        Ok(())
    }

    // ---- Broadcaster contract (read path) ----

    pub async fn get_start(&self, token: &str, fragment: u32) -> Result<Vec<u8>, EngineError> {
        let m = self.registry.get(token).ok_or(EngineError::MatchNotFound)?;
        if !m.has_start(fragment) {
            return Err(EngineError::FragmentNotFound);
        }
        self.store.get(token, fragment, FrameKind::Start).await
    }

    pub async fn get_full(&self, token: &str, fragment: u32) -> Result<Vec<u8>, EngineError> {
        let m = self.registry.get(token).ok_or(EngineError::MatchNotFound)?;
        m.full_meta(fragment).ok_or(EngineError::FragmentNotFound)?;
        self.store.get(token, fragment, FrameKind::Full).await
    }

    pub async fn get_delta(&self, token: &str, fragment: u32) -> Result<Vec<u8>, EngineError> {
        let m = self.registry.get(token).ok_or(EngineError::MatchNotFound)?;
        m.delta_meta(fragment).ok_or(EngineError::FragmentNotFound)?;
        self.store.get(token, fragment, FrameKind::Delta).await
    }

    pub fn get_sync(&self, token: &str, fragment: Option<u32>) -> Result<Sync, EngineError> {
        let m = self.registry.get(token).ok_or(EngineError::MatchNotFound)?;
        compute_sync(&m, fragment, self.delay, self.keyframe_interval)
    }

    // ---- Control plane ----

    #[must_use]
    pub fn list_tokens(&self) -> Vec<String> {
        self.registry.list_tokens()
    }

    #[must_use]
    pub fn list_matches(&self) -> Vec<MatchSummary> {
        self.registry.list_matches().iter().map(|m| m.summary()).collect()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<MatchSummary> {
        self.registry.get_by_id(id).map(|m| m.summary())
    }

    pub fn delete(&self, token: &str) -> Result<(), EngineError> {
        if self.registry.delete(token) {
            gauge!("gotv_live_matches").set(self.registry.len() as f64);
            Ok(())
        } else {
            Err(EngineError::MatchNotFound)
        }
    }

    pub fn tag_id(&self, token: &str, id: &str) -> Result<(), EngineError> {
        let m = self.registry.get(token).ok_or(EngineError::MatchNotFound)?;
        m.set_id(id.to_string());
        Ok(())
    }

    /// Demotes every Match tagged with `id` other than `keep_token` by
    /// appending `"/" + its own token` to its `id`, so `id` alone resolves
    /// only to the live broadcast under `keep_token`.
    pub fn relegate_by_id(&self, id: &str, keep_token: &str) {
        for m in self.registry.list_matches() {
            if m.token() != keep_token && m.id().as_deref() == Some(id) {
                m.set_id(format!("{id}/{}", m.token()));
            }
        }
    }

    /// Serializes the Match identified by `token_or_id` — resolved first as a
    /// plain token, then as an administrative id — fetching every fragment
    /// body from the backing store under the Match's real token, into the
    /// gzip+JSON format in [`crate::persist`].
    pub async fn save(&self, token_or_id: &str) -> Result<Vec<u8>, EngineError> {
        let m = self
            .registry
            .get(token_or_id)
            .or_else(|| self.registry.get_by_id(token_or_id))
            .ok_or(EngineError::MatchNotFound)?;
        let token = m.token();
        let (start_nums, full_nums, delta_nums) = m.fragment_numbers();

        let mut starts = Vec::with_capacity(start_nums.len());
        for fragment in start_nums {
            let meta = m.start_meta(fragment).ok_or(EngineError::FragmentNotFound)?;
            let body = self.store.get(token, fragment, FrameKind::Start).await?;
            starts.push(PersistedStart { fragment, meta, body });
        }

        let mut fulls = Vec::with_capacity(full_nums.len());
        for fragment in full_nums {
            let meta = m.full_meta(fragment).ok_or(EngineError::FragmentNotFound)?;
            let body = self.store.get(token, fragment, FrameKind::Full).await?;
            fulls.push(PersistedFull { fragment, meta, body });
        }

        let mut deltas = Vec::with_capacity(delta_nums.len());
        for fragment in delta_nums {
            let meta = m.delta_meta(fragment).ok_or(EngineError::FragmentNotFound)?;
            let body = self.store.get(token, fragment, FrameKind::Delta).await?;
            deltas.push(PersistedDelta { fragment, meta, body });
        }

        let record = PersistedMatch {
            token: m.token().to_string(),
            id: m.id(),
            signup_fragment: m.signup_fragment(),
            tps: m.tps(),
            map: m.map(),
            protocol: m.protocol(),
            starts,
            fulls,
            deltas,
        };
        crate::persist::encode(&record)
    }

    /// Deserializes a blob produced by [`Engine::save`], writes every
    /// fragment body back to the backing store, and registers the Match
    /// under its original token. Returns that token.
    pub async fn load(&self, bytes: &[u8]) -> Result<String, EngineError> {
        let record = crate::persist::decode(bytes)?;
        let token = record.token.clone();

        let first_start = record.starts.first().ok_or(EngineError::FragmentNotFound)?;
        let m = Arc::new(Match::new(
            record.token.clone(),
            record.id.clone(),
            first_start.fragment,
            first_start.meta.clone(),
        ));

        for start in &record.starts {
            self.store
                .put(&token, start.fragment, FrameKind::Start, start.body.clone())
                .await?;
            m.on_start(
                start.fragment,
                start.meta.clone(),
                record.tps,
                record.map.clone(),
                record.protocol,
            );
        }
        for full in &record.fulls {
            self.store
                .put(&token, full.fragment, FrameKind::Full, full.body.clone())
                .await?;
            m.on_full(full.fragment, full.meta.clone());
        }
        for delta in &record.deltas {
            self.store
                .put(&token, delta.fragment, FrameKind::Delta, delta.body.clone())
                .await?;
            m.on_delta(delta.fragment, delta.meta.clone());
        }

        self.registry.insert(m);
        Ok(token)
    }
}
