//! The pluggable backing-store capability behind the engine's Match
//! accessors. Three variants are provided: `memory` (always available),
//! `disk` (behind the `disk-store` feature), and `blob` (behind the
//! `blob-store` feature, backed by the `object_store` crate).
//!
//! Authentication and the frame metadata (tick/endtick/latest/etc.) live on
//! the engine's in-memory `Match`, regardless of variant; a `BackingStore`
//! only stores and retrieves fragment *bodies*, keyed by `(token, fragment,
//! FrameKind)`.

mod memory;

#[cfg(feature = "disk-store")]
mod disk;

#[cfg(feature = "blob-store")]
mod blob;

pub use memory::MemoryStore;

#[cfg(feature = "disk-store")]
pub use disk::DiskStore;

#[cfg(feature = "blob-store")]
pub use blob::BlobStore;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::frame::FrameKind;
use crate::sync::Sync;

/// Whole-object PUT/GET over fragment bodies. Implementors map their own
/// not-found condition to `EngineError::FragmentNotFound`; anything else
/// propagates as `EngineError::Io`.
///
/// `put_sync` additionally writes the precomputed `/sync` descriptor as a
/// sidecar next to the fragment bodies, so a persistent variant can serve it
/// without recomputing from in-memory state after a restart. The default
/// implementation is a no-op, which is correct for `MemoryStore`: there's no
/// restart to survive, so caching the descriptor buys nothing.
#[async_trait]
pub trait BackingStore: Send + Sync {
    async fn put(&self, token: &str, fragment: u32, kind: FrameKind, body: Vec<u8>) -> Result<(), EngineError>;
    async fn get(&self, token: &str, fragment: u32, kind: FrameKind) -> Result<Vec<u8>, EngineError>;

    async fn put_sync(&self, _token: &str, _sync: &Sync) -> Result<(), EngineError> {
        Ok(())
    }
}
