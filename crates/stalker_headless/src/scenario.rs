//! Scenario loading and configuration.
//!
//! A scenario describes one arena: where the agent spawns, which players
//! are around, which of them are hidden behind cover and a script of
//! external signals delivered at fixed times.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stalker_core::messages::{
    parse_damage, parse_duration_secs, parse_path_reply, parse_pattern_order, parse_vectors,
};
use stalker_core::prelude::*;
use std::result::Result;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario refers to something that cannot exist.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// The agent rejected its configuration.
    #[error("Agent setup failed: {0}")]
    Agent(#[from] AgentError),
}

/// One player present in the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Player slot.
    pub slot: u32,
    /// Team.
    pub team: Team,
    /// Held weapon.
    #[serde(default)]
    pub weapon: WeaponSlot,
    /// Starting position.
    pub position: Vec3,
    /// Whether the player starts alive.
    #[serde(default = "default_alive")]
    pub alive: bool,
}

fn default_alive() -> bool {
    true
}

impl PlayerSetup {
    /// The snapshot the agent sees.
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            slot: self.slot,
            alive: self.alive,
            team: self.team,
            weapon: self.weapon,
            position: self.position,
        }
    }
}

/// An external signal the arena delivers on schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptAction {
    /// Damage the agent.
    Damage(u32),
    /// Arm the sonar debuff.
    Sonar,
    /// Press "parry now".
    Parry,
    /// Pre-arm a parry for this many milliseconds.
    PrearmParry(TimeMs),
    /// Change standing orders.
    Pattern(PatternOrder),
    /// Replace the patrol route.
    Patrol(Vec<Vec3>),
    /// Hand the agent over to a scripted sequence.
    EnterScene,
    /// Return control to the agent.
    LeaveScene,
    /// Teleport a player.
    MovePlayer {
        /// Player slot.
        slot: u32,
        /// New position.
        position: Vec3,
    },
    /// Set whether a player is alive.
    SetAlive {
        /// Player slot.
        slot: u32,
        /// New state.
        alive: bool,
    },
    /// Hide a player from visibility traces, or reveal them again.
    SetOccluded {
        /// Player slot.
        slot: u32,
        /// New state.
        occluded: bool,
    },
    /// A string-encoded message as a map script would send it.
    ///
    /// Channels: `damage`, `sonar`, `parry`, `prearm` (seconds),
    /// `pattern`, `patrol` (flattened coordinates), `path` (path reply).
    Raw {
        /// Message channel.
        channel: String,
        /// Encoded payload.
        payload: String,
    },
}

const RAW_CHANNELS: [&str; 7] = ["damage", "sonar", "parry", "prearm", "pattern", "patrol", "path"];

/// Decode a string-encoded message into an agent event.
pub fn decode_raw(channel: &str, payload: &str) -> Result<AgentEvent, ScenarioError> {
    let event = match channel {
        "damage" => AgentEvent::Damage(parse_damage(payload)?),
        "sonar" => AgentEvent::SonarTrigger,
        "parry" => AgentEvent::ParryAttempt,
        "prearm" => AgentEvent::ParryPrearm {
            duration_ms: parse_duration_secs(payload)?,
        },
        "pattern" => AgentEvent::SetPatternOrder(parse_pattern_order(payload)?),
        "patrol" => AgentEvent::SetPatrolWaypoints(parse_vectors(payload)?),
        "path" => AgentEvent::PathReply(parse_path_reply(payload)?),
        other => return Err(ScenarioError::Invalid(format!("unknown channel '{other}'"))),
    };
    Ok(event)
}

/// A script entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedSignal {
    /// Arena time of delivery.
    pub at_ms: TimeMs,
    /// What happens.
    pub action: ScriptAction,
}

/// A complete arena setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Seed for the agent's generator.
    #[serde(default)]
    pub seed: u64,
    /// Default run length.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    /// Agent spawn point (visual centre). The floor sits at its height.
    pub spawn: Vec3,
    /// Agent tuning. Missing fields take their defaults.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Players in the arena.
    #[serde(default)]
    pub players: Vec<PlayerSetup>,
    /// Slots whose visibility traces never connect.
    #[serde(default)]
    pub occluded: Vec<u32>,
    /// External signals, in any order.
    #[serde(default)]
    pub script: Vec<ScriptedSignal>,
}

fn default_duration_secs() -> u64 {
    60
}

impl Default for Scenario {
    fn default() -> Self {
        Self::duel()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a scenario from a RON string.
    pub fn from_ron_str(contents: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check player slots and the agent config.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.agent.validate()?;
        let max = self.agent.max_player_slots;
        let mut seen = Vec::with_capacity(self.players.len());
        for player in &self.players {
            if player.slot >= max {
                return Err(ScenarioError::Invalid(format!(
                    "player slot {} outside 0..{max}",
                    player.slot
                )));
            }
            if seen.contains(&player.slot) {
                return Err(ScenarioError::Invalid(format!(
                    "player slot {} used twice",
                    player.slot
                )));
            }
            seen.push(player.slot);
        }
        for entry in &self.script {
            if let ScriptAction::Raw { channel, .. } = &entry.action {
                if !RAW_CHANNELS.contains(&channel.as_str()) {
                    return Err(ScenarioError::Invalid(format!(
                        "script at {} ms uses unknown channel '{channel}'",
                        entry.at_ms
                    )));
                }
            }
            if let ScriptAction::MovePlayer { slot, .. }
            | ScriptAction::SetAlive { slot, .. }
            | ScriptAction::SetOccluded { slot, .. } = entry.action
            {
                if !seen.contains(&slot) {
                    return Err(ScenarioError::Invalid(format!(
                        "script at {} ms refers to unknown slot {slot}",
                        entry.at_ms
                    )));
                }
            }
        }
        Ok(())
    }

    /// Built-in one-on-one: a melee player stands 400 units away, takes
    /// a few swings at the agent and tries a couple of parries.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            description: "One melee player against the stalker".to_string(),
            seed: 12345,
            duration_secs: 30,
            spawn: Vec3::new(0.0, 0.0, 0.0),
            agent: AgentConfig::default(),
            players: vec![PlayerSetup {
                slot: 1,
                team: Team::Blue,
                weapon: WeaponSlot::Melee,
                position: Vec3::new(400.0, 0.0, 0.0),
                alive: true,
            }],
            occluded: Vec::new(),
            script: vec![
                ScriptedSignal {
                    at_ms: 4000,
                    action: ScriptAction::Damage(60),
                },
                ScriptedSignal {
                    at_ms: 6000,
                    action: ScriptAction::PrearmParry(300),
                },
                ScriptedSignal {
                    at_ms: 9000,
                    action: ScriptAction::Sonar,
                },
                ScriptedSignal {
                    at_ms: 10_000,
                    action: ScriptAction::Damage(60),
                },
                ScriptedSignal {
                    at_ms: 14_000,
                    action: ScriptAction::Parry,
                },
            ],
        }
    }

    /// Built-in patrol: nobody around, the agent walks a square.
    #[must_use]
    pub fn patrol() -> Self {
        let route = vec![
            Vec3::new(300.0, 0.0, 0.0),
            Vec3::new(300.0, 300.0, 0.0),
            Vec3::new(0.0, 300.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        Self {
            name: "patrol".to_string(),
            description: "Empty arena with a four-point patrol".to_string(),
            seed: 7,
            duration_secs: 20,
            spawn: Vec3::ZERO,
            agent: AgentConfig::default(),
            players: Vec::new(),
            occluded: Vec::new(),
            script: vec![
                ScriptedSignal {
                    at_ms: 0,
                    action: ScriptAction::Pattern(PatternOrder::Patrol),
                },
                ScriptedSignal {
                    at_ms: 0,
                    action: ScriptAction::Patrol(route),
                },
            ],
        }
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "duel" => Some(Self::duel()),
            "patrol" => Some(Self::patrol()),
            _ => None,
        }
    }

    /// Resolve a scenario argument: a built-in name or a RON file path.
    pub fn resolve(arg: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(arg) {
            Some(scenario) => Ok(scenario),
            None => Self::load(arg),
        }
    }
}
