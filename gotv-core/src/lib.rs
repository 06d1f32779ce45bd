#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

//! The GOTV+ broadcast relay's match/fragment engine: the in-memory data
//! model for a live match, the Store/Broadcaster capability split, the sync
//! readiness rule, the pluggable backing-store abstraction, and the
//! persisted-match format. Contains no networking; `gotv-server` is the HTTP
//! adapter built on top of this crate.

mod error;
mod frame;
mod match_state;
mod persist;
mod registry;
mod store;
mod sync;
mod token;

pub use error::EngineError;
pub use frame::{DeltaMeta, FrameKind, FullMeta, StartMeta};
pub use match_state::{Match, MatchSummary};
pub use persist::{PersistedDelta, PersistedFull, PersistedMatch, PersistedStart, decode, encode};
pub use registry::Engine;
pub use store::{BackingStore, MemoryStore};
#[cfg(feature = "disk-store")]
pub use store::DiskStore;
#[cfg(feature = "blob-store")]
pub use store::BlobStore;
pub use sync::{Sync, compute_sync};
pub use token::{ParsedToken, parse_token};
