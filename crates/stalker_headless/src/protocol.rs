//! JSON lines emitted by the headless runner.
//!
//! The runner writes one JSON object per line on stdout; logs go to
//! stderr.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","scenario":"duel","seed":12345}
//! <- {"type":"tick","time_ms":200,"state":"move","hp":450,"position":[0.0,0.0,0.0],"target":1,"mode":"direct"}
//! <- {"type":"attack","time_ms":1400,"kind":"sweep"}
//! <- {"type":"parry_window","time_ms":3200,"open":true}
//! <- {"type":"death","time_ms":14000}
//! <- {"type":"finished","time_ms":30000,"hash":1234567890}
//! ```

use serde::{Deserialize, Serialize};

use stalker_core::prelude::*;

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Lines emitted by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// The arena is set up.
    Ready {
        /// Protocol version.
        version: String,
        /// Scenario name.
        scenario: String,
        /// Agent seed.
        seed: u64,
    },

    /// Agent state after a tick (only with `--auto-state`).
    Tick(TickSummary),

    /// The agent started an attack.
    Attack {
        /// Arena time.
        time_ms: TimeMs,
        /// Attack name.
        kind: String,
    },

    /// The parry telegraph turned on or off.
    ParryWindow {
        /// Arena time.
        time_ms: TimeMs,
        /// Window state.
        open: bool,
    },

    /// The agent died.
    Death {
        /// Arena time.
        time_ms: TimeMs,
    },

    /// The run ended.
    Finished {
        /// Arena time.
        time_ms: TimeMs,
        /// Final state hash.
        hash: u64,
    },
}

/// Agent state summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Arena time.
    pub time_ms: TimeMs,
    /// Combat state name.
    pub state: String,
    /// Hit points.
    pub hp: u32,
    /// Estimated position, if known.
    pub position: Option<[f64; 3]>,
    /// Locked target slot.
    pub target: Option<u8>,
    /// Movement mode.
    pub mode: String,
}

impl TickSummary {
    /// Summarize `agent` at `time_ms`.
    #[must_use]
    pub fn of(agent: &Agent, time_ms: TimeMs) -> Self {
        Self {
            time_ms,
            state: agent.state().name().to_string(),
            hp: agent.hit_points(),
            position: agent.position().map(|p| [p.x, p.y, p.z]),
            target: agent.target().map(PlayerId::slot),
            mode: mode_name(agent.mode()).to_string(),
        }
    }
}

/// Protocol name of a movement mode.
#[must_use]
pub fn mode_name(mode: MovementMode) -> &'static str {
    match mode {
        MovementMode::Idle => "idle",
        MovementMode::Direct => "direct",
        MovementMode::PathFollow => "path_follow",
    }
}

/// Protocol name of an attack.
#[must_use]
pub fn attack_name(kind: AttackKind) -> &'static str {
    match kind {
        AttackKind::Overhead => "overhead",
        AttackKind::Sweep => "sweep",
        AttackKind::Lunge => "lunge",
        AttackKind::Flurry => "flurry",
        AttackKind::Slam => "slam",
    }
}

impl Response {
    /// Serialize as one line of JSON.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {e}"}}"#)
        })
    }
}
