use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};

use crate::error::EngineError;
use crate::frame::FrameKind;
use crate::store::BackingStore;
use crate::sync::Sync;

/// Object-store-backed store, e.g. S3/GCS/local via the `object_store`
/// crate's unified API. Same key schema as `DiskStore`, expressed as object
/// keys instead of file paths.
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl BlobStore {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn path_for(&self, token: &str, fragment: u32, kind: FrameKind) -> Path {
        Path::from(format!("{}/{token}_{fragment}_{}.bin", self.prefix, kind.as_str()))
    }

    fn sync_path_for(&self, token: &str) -> Path {
        Path::from(format!("{}/{token}_sync.json", self.prefix))
    }
}

impl From<object_store::Error> for EngineError {
    fn from(e: object_store::Error) -> Self {
        match e {
            object_store::Error::NotFound { .. } => EngineError::FragmentNotFound,
            other => EngineError::Io(other.to_string()),
        }
    }
}

#[async_trait]
impl BackingStore for BlobStore {
    async fn put(&self, token: &str, fragment: u32, kind: FrameKind, body: Vec<u8>) -> Result<(), EngineError> {
        self.store
            .put(&self.path_for(token, fragment, kind), PutPayload::from(body))
            .await?;
        Ok(())
    }

    async fn get(&self, token: &str, fragment: u32, kind: FrameKind) -> Result<Vec<u8>, EngineError> {
        let result = self.store.get(&self.path_for(token, fragment, kind)).await?;
        let mut stream = result.into_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(body)
    }

    async fn put_sync(&self, token: &str, sync: &Sync) -> Result<(), EngineError> {
        let json = serde_json::to_vec(sync).map_err(|e| EngineError::Io(e.to_string()))?;
        self.store.put(&self.sync_path_for(token), PutPayload::from(json)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = BlobStore::new(Arc::new(InMemory::new()), "matches");
        store
            .put("tok", 3, FrameKind::Start, vec![4, 5, 6])
            .await
            .unwrap();
        let body = store.get("tok", 3, FrameKind::Start).await.unwrap();
        assert_eq!(body, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn missing_fragment_is_not_found() {
        let store = BlobStore::new(Arc::new(InMemory::new()), "matches");
        let err = store.get("tok", 1, FrameKind::Full).await.unwrap_err();
        assert!(matches!(err, EngineError::FragmentNotFound));
    }

    #[tokio::test]
    async fn put_sync_writes_the_sidecar_object() {
        let store = BlobStore::new(Arc::new(InMemory::new()), "matches");
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

        let result = store.store.get(&store.sync_path_for("tok")).await.unwrap();
        let bytes = result.bytes().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["tick"], 500);
    }
}
