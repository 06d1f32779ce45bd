use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::frame::FrameKind;
use crate::store::BackingStore;

/// RAM-backed store. Zero I/O; bounded only by origin behavior. This is the
/// default variant and requires no feature flag.
#[derive(Default)]
pub struct MemoryStore {
    bodies: RwLock<HashMap<(String, u32, FrameKind), Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn put(&self, token: &str, fragment: u32, kind: FrameKind, body: Vec<u8>) -> Result<(), EngineError> {
        self.bodies
            .write()
            .unwrap()
            .insert((token.to_string(), fragment, kind), body);
        Ok(())
    }

    async fn get(&self, token: &str, fragment: u32, kind: FrameKind) -> Result<Vec<u8>, EngineError> {
        self.bodies
            .read()
            .unwrap()
            .get(&(token.to_string(), fragment, kind))
            .cloned()
            .ok_or(EngineError::FragmentNotFound)
    }
}
