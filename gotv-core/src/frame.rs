use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Fragment kind, also used as the third component of a backing-store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    Start,
    Full,
    Delta,
}

impl FrameKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FrameKind::Start => "start",
            FrameKind::Full => "full",
            FrameKind::Delta => "delta",
        }
    }
}

/// In-memory metadata captured for a `start` fragment. The body itself lives
/// in the backing store, keyed by `(token, fragment, FrameKind::Start)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMeta {
    pub at: SystemTime,
}

/// In-memory metadata captured for a `full` (keyframe) fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullMeta {
    pub at: SystemTime,
    pub tick: u64,
}

/// In-memory metadata captured for a `delta` fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaMeta {
    pub at: SystemTime,
    pub endtick: u64,
    /// Recorded but never consulted by the read path; preserved for wire completeness.
    pub final_fragment: bool,
}
