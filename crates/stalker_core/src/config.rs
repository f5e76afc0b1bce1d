//! Agent tuning.
//!
//! Every constant the controller compares against lives in [`AgentConfig`].
//! Configs are plain data and deserialize from RON, so arenas can ship their
//! own tuning next to their scenario files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::math::Vec3;
use crate::targeting::Team;
use crate::time::TimeMs;

/// Number of range sensors (and reference points).
pub const SENSOR_COUNT: usize = 8;

/// Tunable constants for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Tick period.
    pub tick_ms: TimeMs,
    /// The position solve runs this long before the next tick.
    pub solve_lead_ms: TimeMs,
    /// Starting and maximum hit points.
    pub max_hit_points: u32,
    /// Team the agent fights for.
    pub team: Team,

    /// Horizontal radius for acquiring a target.
    pub target_search_distance: f64,
    /// Vertical band for acquiring or keeping a target.
    pub target_search_distance_z: f64,
    /// Extra horizontal slack granted to an existing lock.
    pub target_keep_margin: f64,
    /// How long a lock holds before re-rolling.
    pub target_duration_ms: TimeMs,
    /// How long a positive trace keeps the target sighted.
    pub see_delay_ms: TimeMs,
    /// Highest valid player slot plus one.
    pub max_player_slots: u32,

    /// 3D reach for starting an attack.
    pub attack_range: f64,
    /// Minimum gap between the end of one attack and the start of the next.
    pub attack_delay_ms: TimeMs,

    /// Damage amplification debuff length.
    pub sonar_duration_ms: TimeMs,
    /// Damage multiplier while the debuff is active.
    pub sonar_multiplier: u32,

    /// Jump cooldown.
    pub jump_time_ms: TimeMs,
    /// A jump starts once jump need exceeds this.
    pub jump_need_threshold: u32,
    /// Vertical impulse applied mid-jump.
    pub jump_impulse: f64,
    /// Consecutive low-displacement ticks before the agent counts as stuck.
    pub stuck_value: u32,
    /// Displacement per tick below which a tick counts toward stuck.
    pub stuck_displacement: f64,
    /// Patrol arrival radius and path request threshold.
    pub waypoint_proximity: f64,
    /// Vertical gap to the next waypoint that indicates a ledge.
    pub ledge_height: f64,
    /// Horizontal gap under which a tall waypoint counts as a ledge.
    pub ledge_reach: f64,
    /// Height difference that triggers the fixed pitch.
    pub raised_target_height: f64,
    /// Fixed downward pitch used for raised move targets, in degrees.
    pub raised_target_pitch_deg: f64,

    /// Default speed multiplier.
    pub default_speed: f64,
    /// Upper bound for the speed multiplier.
    pub max_speed: f64,
    /// Forward thrust at speed multiplier 1.0.
    pub thrust_force: f64,

    /// Reference points for the range sensors, in sensor order.
    pub references: Vec<Vec3>,
    /// Added to the solved position to move from the sensor bundle to the
    /// visual centre.
    pub sensor_vertical_offset: f64,

    /// Number of health bar segments.
    pub health_bar_segments: u8,
    /// Delay from death to the explosion effect.
    pub death_explosion_ms: TimeMs,
    /// Delay from death to final removal.
    pub death_removal_ms: TimeMs,

    /// Push a debug summary string each tick.
    pub debug_text: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            solve_lead_ms: 40,
            max_hit_points: 450,
            team: Team::Red,

            target_search_distance: 2048.0,
            target_search_distance_z: 512.0,
            target_keep_margin: 512.0,
            target_duration_ms: 25_000,
            see_delay_ms: 500,
            max_player_slots: 64,

            attack_range: 128.0,
            attack_delay_ms: 300,

            sonar_duration_ms: 15_000,
            sonar_multiplier: 2,

            jump_time_ms: 1000,
            jump_need_threshold: 2,
            jump_impulse: 280.0,
            stuck_value: 5,
            stuck_displacement: 4.0,
            waypoint_proximity: 32.0,
            ledge_height: 8.0,
            ledge_reach: 32.0,
            raised_target_height: 64.0,
            raised_target_pitch_deg: 30.0,

            default_speed: 1.0,
            max_speed: 1.5,
            thrust_force: 320.0,

            references: cube_references(Vec3::ZERO, Vec3::new(1024.0, 1024.0, 512.0)),
            sensor_vertical_offset: 32.0,

            health_bar_segments: 16,
            death_explosion_ms: 3000,
            death_removal_ms: 5000,

            debug_text: false,
        }
    }
}

impl AgentConfig {
    /// Parse a config from RON and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| AgentError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a RON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| AgentError::ConfigRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&contents)
    }

    /// Delay from tick start to the position solve.
    #[must_use]
    pub const fn solve_delay_ms(&self) -> TimeMs {
        self.tick_ms.saturating_sub(self.solve_lead_ms)
    }

    /// Check invariants the controller relies on.
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(AgentError::InvalidConfig("tick_ms must be positive".into()));
        }
        if self.solve_lead_ms >= self.tick_ms {
            return Err(AgentError::InvalidConfig(format!(
                "solve_lead_ms ({}) must be smaller than tick_ms ({})",
                self.solve_lead_ms, self.tick_ms
            )));
        }
        if self.max_hit_points == 0 {
            return Err(AgentError::InvalidConfig(
                "max_hit_points must be positive".into(),
            ));
        }
        if self.references.len() != SENSOR_COUNT {
            return Err(AgentError::InvalidConfig(format!(
                "expected {SENSOR_COUNT} reference points, got {}",
                self.references.len()
            )));
        }
        if !(0.0..=self.max_speed).contains(&self.default_speed) {
            return Err(AgentError::InvalidConfig(format!(
                "default_speed {} outside 0..={}",
                self.default_speed, self.max_speed
            )));
        }
        if self.health_bar_segments == 0 {
            return Err(AgentError::InvalidConfig(
                "health_bar_segments must be positive".into(),
            ));
        }
        if self.max_player_slots == 0 || self.max_player_slots > u32::from(u8::MAX) + 1 {
            return Err(AgentError::InvalidConfig(format!(
                "max_player_slots {} outside 1..=256",
                self.max_player_slots
            )));
        }
        Ok(())
    }
}

/// The eight corners of an axis-aligned box, in a fixed sensor order.
#[must_use]
pub fn cube_references(center: Vec3, half_extent: Vec3) -> Vec<Vec3> {
    let mut corners = Vec::with_capacity(SENSOR_COUNT);
    for sz in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sx in [-1.0, 1.0] {
                corners.push(Vec3::new(
                    center.x + sx * half_extent.x,
                    center.y + sy * half_extent.y,
                    center.z + sz * half_extent.z,
                ));
            }
        }
    }
    corners
}
