//! # Stalker Core
//!
//! Deterministic controller for an autonomous melee NPC.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond loading a config file
//! - No system randomness (a seeded ChaCha generator per agent)
//! - No threads: everything runs inside scheduled callbacks
//!
//! The agent talks to the world exclusively through typed messages: it
//! receives [`agent::AgentEvent`]s and emits [`collaborators::Outbound`]
//! signals. A host (see the `stalker_headless` crate) plays the range
//! sensors, the path service, physics and the players.
//!
//! ## Crate Structure
//!
//! - [`math`] - Vectors, look angles, the 3×3 solver
//! - [`ranging`] - Multilateration position estimate
//! - [`targeting`] - Target lock and visibility window
//! - [`movement`] - Pursuit, path following, patrol, stuck and jump
//! - [`attacks`] - The five attack choreographies
//! - [`combat`] - Combat state, attack eligibility, parry window
//! - [`health`] - Hit points, sonar debuff, health bar
//! - [`agent`] - The controller itself
//! - [`runtime`] - Clock, event queue and outbox for one agent

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod attacks;
pub mod collaborators;
pub mod combat;
pub mod config;
pub mod error;
pub mod health;
pub mod math;
pub mod messages;
pub mod movement;
pub mod path;
pub mod ranging;
pub mod runtime;
pub mod scheduler;
pub mod targeting;
pub mod time;
pub mod timeline;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, AgentEvent, AttackStep, Ctx, DeathCue};
    pub use crate::attacks::{AttackCue, AttackKind};
    pub use crate::collaborators::{
        Clip, CollaboratorHandles, CollaboratorId, CollaboratorKind, HurtboxSlot, InstanceId,
        Outbound, Signal,
    };
    pub use crate::combat::{CombatState, PatternOrder};
    pub use crate::config::{cube_references, AgentConfig, SENSOR_COUNT};
    pub use crate::error::{AgentError, Result};
    pub use crate::math::{LookAngles, Vec3};
    pub use crate::movement::{JumpCue, MovementMode};
    pub use crate::path::{PathReply, PathRequest};
    pub use crate::runtime::AgentRuntime;
    pub use crate::targeting::{PlayerId, PlayerSnapshot, Team, WeaponSlot};
    pub use crate::time::TimeMs;
}
