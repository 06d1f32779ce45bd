use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::EngineError;
use crate::frame::FrameKind;
use crate::store::BackingStore;
use crate::sync::Sync;

/// Filesystem-backed store. Each fragment body lives at
/// `{dir}/{token}_{fragment}_{kind}.bin`; the sync sidecar used by
/// persistence lives alongside it as `{dir}/{token}_sync.json`.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, token: &str, fragment: u32, kind: FrameKind) -> PathBuf {
        self.dir.join(format!("{token}_{fragment}_{}.bin", kind.as_str()))
    }

    fn sync_path_for(&self, token: &str) -> PathBuf {
        self.dir.join(format!("{token}_sync.json"))
    }
}

#[async_trait]
impl BackingStore for DiskStore {
    async fn put(&self, token: &str, fragment: u32, kind: FrameKind, body: Vec<u8>) -> Result<(), EngineError> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path_for(token, fragment, kind), body).await?;
        Ok(())
    }

    async fn get(&self, token: &str, fragment: u32, kind: FrameKind) -> Result<Vec<u8>, EngineError> {
        Ok(fs::read(self.path_for(token, fragment, kind)).await?)
    }

    async fn put_sync(&self, token: &str, sync: &Sync) -> Result<(), EngineError> {
        let json = serde_json::to_vec(sync).map_err(|e| EngineError::Io(e.to_string()))?;
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.sync_path_for(token), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = std::env::temp_dir().join(format!("gotv-disk-store-test-{}", std::process::id()));
        let store = DiskStore::new(&dir);
        store
            .put("tok", 2, FrameKind::Delta, vec![9, 8, 7])
            .await
            .unwrap();
        let body = store.get("tok", 2, FrameKind::Delta).await.unwrap();
        assert_eq!(body, vec![9, 8, 7]);
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_fragment_is_not_found() {
        let dir = std::env::temp_dir().join(format!("gotv-disk-store-test-missing-{}", std::process::id()));
        let store = DiskStore::new(&dir);
        let err = store.get("tok", 1, FrameKind::Full).await.unwrap_err();
        assert!(matches!(err, EngineError::FragmentNotFound));
    }

    #[tokio::test]
    async fn put_sync_writes_the_sidecar_file() {
        let dir = std::env::temp_dir().join(format!("gotv-disk-store-test-sync-{}", std::process::id()));
        let store = DiskStore::new(&dir);
        let sync = Sync {
            tick: 500,
            endtick: 600,
            rtdelay: 0.1,
            rcvage: 0.2,
            fragment: 100,
            signup_fragment: 100,
            tps: 128,
            keyframe_interval: 3.0,
            token_redirect: String::new(),
            map: "de_dust2".to_string(),
            protocol: 4,
        };
        store.put_sync("tok", &sync).await.unwrap();

        let written = fs::read(dir.join("tok_sync.json")).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(parsed["tick"], 500);
        let _ = fs::remove_dir_all(&dir).await;
    }
}
