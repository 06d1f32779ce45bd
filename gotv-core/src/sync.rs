use std::time::SystemTime;

use serde::Serialize;

use crate::error::EngineError;
use crate::match_state::Match;

/// The `/sync` wire descriptor. Field names match the GOTV+ wire contract
/// exactly. `endtick` is omitted when zero and `token_redirect` when empty;
/// every other field always serializes.
#[derive(Debug, Clone, Serialize)]
pub struct Sync {
    pub tick: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub endtick: u64,
    pub rtdelay: f64,
    pub rcvage: f64,
    pub fragment: u32,
    pub signup_fragment: u32,
    pub tps: u32,
    pub keyframe_interval: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_redirect: String,
    pub map: String,
    pub protocol: u32,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Walks down from `start` looking for the greatest sync-ready fragment
/// number, stopping once it passes below zero or above `m.latest()`.
fn find_ready_fragment(m: &Match, start: u32) -> Result<u32, EngineError> {
    let latest = m.latest();
    if start > latest {
        return Err(EngineError::FragmentNotFound);
    }
    let mut fragment = start;
    loop {
        if m.is_sync_ready(fragment) {
            return Ok(fragment);
        }
        match fragment.checked_sub(1) {
            Some(next) => fragment = next,
            None => return Err(EngineError::FragmentNotFound),
        }
    }
}

/// Builds the `Sync` descriptor for a Match.
///
/// With `requested = None` ("latest" mode), the engine starts its probe at
/// `latest - delay` and walks downward until it finds a sync-ready fragment.
/// With `requested = Some(n)`, only fragment `n` itself is checked.
pub fn compute_sync(
    m: &Match,
    requested: Option<u32>,
    delay: u32,
    keyframe_interval: f64,
) -> Result<Sync, EngineError> {
    let fragment = match requested {
        Some(n) => {
            if !m.is_sync_ready(n) {
                return Err(EngineError::FragmentNotFound);
            }
            n
        }
        None => {
            let start = m.latest().saturating_sub(delay);
            find_ready_fragment(m, start)?
        }
    };

    let full = m.full_meta(fragment).ok_or(EngineError::FragmentNotFound)?;
    let delta = m
        .delta_meta(fragment)
        .ok_or(EngineError::FragmentNotFound)?;

    let now = SystemTime::now();
    let rtdelay = now
        .duration_since(full.at)
        .unwrap_or_default()
        .as_secs_f64();
    let rcvage = now
        .duration_since(m.receive_age())
        .unwrap_or_default()
        .as_secs_f64();

    Ok(Sync {
        tick: full.tick,
        endtick: delta.endtick,
        rtdelay,
        rcvage,
        fragment,
        signup_fragment: m.signup_fragment(),
        tps: m.tps().round() as u32,
        keyframe_interval,
        token_redirect: format!("token/{}", m.token()),
        map: m.map(),
        protocol: m.protocol(),
    })
}

#[cfg(test)]
mod tests {
    use crate::frame::{DeltaMeta, FullMeta, StartMeta};
    use crate::match_state::Match;

    use super::*;

    fn ready_match(token: &str, last_ready: u32) -> Match {
        let m = Match::new(token.to_string(), None, last_ready, StartMeta { at: SystemTime::now() });
        for fragment in 0..=last_ready {
            m.on_full(fragment, FullMeta { at: SystemTime::now(), tick: u64::from(fragment) * 10 });
            m.on_delta(
                fragment,
                DeltaMeta {
                    at: SystemTime::now(),
                    endtick: u64::from(fragment) * 10 + 5,
                    final_fragment: false,
                },
            );
        }
        m
    }

    #[test]
    fn latest_mode_returns_a_sync_ready_fragment_at_or_below_latest() {
        let m = ready_match("tok", 20);
        let sync = compute_sync(&m, None, 8, 3.0).unwrap();
        assert!(sync.fragment <= m.latest());
        assert!(m.is_sync_ready(sync.fragment));
        assert_eq!(sync.fragment, 12);
    }

    #[test]
    fn explicit_mode_echoes_the_requested_fragment() {
        let m = ready_match("tok", 20);
        let sync = compute_sync(&m, Some(5), 8, 3.0).unwrap();
        assert_eq!(sync.fragment, 5);
    }

    #[test]
    fn explicit_mode_rejects_a_fragment_that_is_not_ready() {
        let m = Match::new("tok".to_string(), None, 0, StartMeta { at: SystemTime::now() });
        let result = compute_sync(&m, Some(0), 0, 3.0);
        assert!(result.is_err());
    }
}
