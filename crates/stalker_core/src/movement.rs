//! Movement planning.
//!
//! Each tick the planner picks one of three ways to move:
//!
//! - **Patrol**: no target and patrol orders; cycle through waypoints.
//! - **Path-follow**: a path is known and the target is not in sight; steer
//!   from waypoint 0 toward waypoint 1 of the latest path.
//! - **Direct**: the target is in sight, or no path is known; head straight
//!   for the goal.
//!
//! It also watches for the agent getting stuck and decides when to jump.
//! The planner only decides; the agent turns the plan into collaborator
//! signals.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::PatternOrder;
use crate::config::AgentConfig;
use crate::math::{look_angles, LookAngles, Vec3};
use crate::path::{Path, PathReply};
use crate::time::TimeMs;
use crate::timeline::Timeline;

/// How the agent is moving this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementMode {
    /// Standing still.
    #[default]
    Idle,
    /// Heading straight for the goal.
    Direct,
    /// Following the latest path.
    PathFollow,
}

/// Where the goal came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Goal {
    /// Last known position of the locked target.
    Target {
        /// Where the target was last reported.
        position: Vec3,
        /// Target traced within the sight window.
        sighted: bool,
    },
    /// Current patrol waypoint.
    Patrol(Vec3),
}

impl Goal {
    /// The goal position.
    #[must_use]
    pub const fn position(self) -> Vec3 {
        match self {
            Self::Target { position, .. } | Self::Patrol(position) => position,
        }
    }
}

/// Outcome of one planning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementPlan {
    /// Chosen mode.
    pub mode: MovementMode,
    /// Point to steer toward, if moving.
    pub move_target: Option<Vec3>,
    /// Facing toward the move target.
    pub facing: Option<LookAngles>,
    /// Goal to send to the path service this tick.
    pub path_goal: Option<Vec3>,
    /// Displacement stayed low for long enough this tick.
    pub stuck: bool,
    /// Start the jump manoeuvre now.
    pub start_jump: bool,
    /// A jump is cooling down; the tick must not touch thrust.
    pub thrust_suppressed: bool,
}

impl MovementPlan {
    fn idle(thrust_suppressed: bool) -> Self {
        Self {
            mode: MovementMode::Idle,
            move_target: None,
            facing: None,
            path_goal: None,
            stuck: false,
            start_jump: false,
            thrust_suppressed,
        }
    }
}

/// Steps of the jump manoeuvre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumpCue {
    /// Brief reverse thrust to back off the obstacle.
    Reverse,
    /// Vertical impulse.
    Launch,
    /// Forward thrust again.
    Restore,
}

/// The jump manoeuvre, at rate 1.0.
#[must_use]
pub fn jump_timeline() -> Timeline<JumpCue> {
    Timeline::new([
        (0, JumpCue::Reverse),
        (100, JumpCue::Launch),
        (400, JumpCue::Restore),
    ])
}

/// Movement state carried between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementPlanner {
    previous_position: Option<Vec3>,
    stuck_counter: u32,
    jump_need: u32,
    jump_cooldown_until: TimeMs,
    patrol: Vec<Vec3>,
    patrol_cursor: usize,
    path: Option<Path>,
}

impl MovementPlanner {
    /// Create an empty planner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the patrol route and restart it from the first waypoint.
    ///
    /// A route with any non-finite waypoint is rejected whole and the
    /// previous route stays in place.
    pub fn set_patrol(&mut self, waypoints: Vec<Vec3>) {
        if waypoints.iter().any(|p| !p.is_finite()) {
            debug!(waypoints = waypoints.len(), "Dropping malformed patrol route");
            return;
        }
        self.patrol = waypoints;
        self.patrol_cursor = 0;
        self.path = None;
    }

    /// Current patrol route.
    #[must_use]
    pub fn patrol(&self) -> &[Vec3] {
        &self.patrol
    }

    /// Index of the patrol waypoint being approached.
    #[must_use]
    pub const fn patrol_cursor(&self) -> usize {
        self.patrol_cursor
    }

    /// Latest path, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Accept a path service reply. The latest well-formed reply wins;
    /// `NoPath` and empty lists clear the path.
    pub fn apply_path_reply(&mut self, reply: PathReply) {
        if !reply.is_well_formed() {
            debug!("Dropping malformed path reply");
            return;
        }
        self.path = reply.into_path();
        debug!(
            waypoints = self.path.as_ref().map_or(0, |p| p.waypoints().len()),
            "Path updated"
        );
    }

    /// Forget the current path (the goal changed).
    pub fn clear_path(&mut self) {
        self.path = None;
    }

    /// Consecutive low-displacement ticks so far.
    #[must_use]
    pub const fn stuck_counter(&self) -> u32 {
        self.stuck_counter
    }

    /// Accumulated jump need.
    #[must_use]
    pub const fn jump_need(&self) -> u32 {
        self.jump_need
    }

    /// When the current jump cooldown ends.
    #[must_use]
    pub const fn jump_cooldown_until(&self) -> TimeMs {
        self.jump_cooldown_until
    }

    /// True while a jump is cooling down.
    #[must_use]
    pub const fn is_jump_cooling(&self, now: TimeMs) -> bool {
        now < self.jump_cooldown_until
    }

    /// Record this tick's position and return the displacement since the
    /// last recorded one.
    pub fn observe(&mut self, position: Vec3) -> Option<f64> {
        self.previous_position
            .replace(position)
            .map(|prev| prev.distance(position))
    }

    /// Plan this tick's movement.
    pub fn plan(
        &mut self,
        now: TimeMs,
        position: Vec3,
        target: Option<(Vec3, bool)>,
        pattern: PatternOrder,
        config: &AgentConfig,
    ) -> MovementPlan {
        let cooling = self.is_jump_cooling(now);
        let displacement = self.observe(position);

        let Some(goal) = self.choose_goal(position, target, pattern, config) else {
            self.stuck_counter = 0;
            self.jump_need = 0;
            return MovementPlan::idle(cooling);
        };

        if pattern == PatternOrder::Hold {
            self.stuck_counter = 0;
            return MovementPlan {
                facing: Some(look_angles(position, goal.position())),
                ..MovementPlan::idle(cooling)
            };
        }

        let stuck = self.update_stuck(displacement, cooling, config);

        let (mode, path_goal) = match goal {
            Goal::Target { position: goal_pos, sighted } => {
                let mode = if sighted || self.path.is_none() {
                    MovementMode::Direct
                } else {
                    MovementMode::PathFollow
                };
                (mode, (!sighted).then_some(goal_pos))
            }
            Goal::Patrol(waypoint) => {
                let mode = if self.path.is_some() {
                    MovementMode::PathFollow
                } else {
                    MovementMode::Direct
                };
                let far = position.distance_2d(waypoint) > config.waypoint_proximity;
                (mode, far.then_some(waypoint))
            }
        };
        let mode = if stuck { MovementMode::Direct } else { mode };

        let move_target = match (mode, self.path.as_ref()) {
            (MovementMode::PathFollow, Some(path)) => path.steering_target(),
            _ => goal.position(),
        };

        if !cooling {
            match mode {
                MovementMode::PathFollow => {
                    let ledge = move_target.z - position.z > config.ledge_height
                        && position.distance_2d(move_target) < config.ledge_reach;
                    if ledge {
                        self.jump_need += 1;
                    }
                }
                MovementMode::Direct if stuck => {
                    // A stuck event already integrates several ticks of evidence.
                    self.jump_need = self.jump_need.max(config.jump_need_threshold + 1);
                }
                _ => {}
            }
        }

        let start_jump = !cooling && self.jump_need > config.jump_need_threshold;
        if start_jump {
            self.jump_need = 0;
            self.stuck_counter = 0;
            self.jump_cooldown_until = now + config.jump_time_ms;
            debug!(cooldown_until = self.jump_cooldown_until, "Jump triggered");
        }

        let mut facing = look_angles(position, move_target);
        if move_target.z - position.z > config.raised_target_height {
            facing.pitch = config.raised_target_pitch_deg;
        }

        MovementPlan {
            mode,
            move_target: Some(move_target),
            facing: Some(facing),
            path_goal,
            stuck,
            start_jump,
            thrust_suppressed: cooling || start_jump,
        }
    }

    fn choose_goal(
        &mut self,
        position: Vec3,
        target: Option<(Vec3, bool)>,
        pattern: PatternOrder,
        config: &AgentConfig,
    ) -> Option<Goal> {
        if let Some((target_pos, sighted)) = target {
            return Some(Goal::Target {
                position: target_pos,
                sighted,
            });
        }
        if pattern != PatternOrder::Patrol || self.patrol.is_empty() {
            return None;
        }

        self.patrol_cursor %= self.patrol.len();
        if position.distance_2d(self.patrol[self.patrol_cursor]) <= config.waypoint_proximity {
            self.patrol_cursor = (self.patrol_cursor + 1) % self.patrol.len();
            self.path = None;
            debug!(cursor = self.patrol_cursor, "Patrol waypoint reached");
        }
        Some(Goal::Patrol(self.patrol[self.patrol_cursor]))
    }

    fn update_stuck(&mut self, displacement: Option<f64>, cooling: bool, config: &AgentConfig) -> bool {
        if cooling {
            self.stuck_counter = 0;
            return false;
        }
        match displacement {
            Some(d) if d < config.stuck_displacement => self.stuck_counter += 1,
            _ => self.stuck_counter = 0,
        }
        if self.stuck_counter >= config.stuck_value {
            self.stuck_counter = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AgentConfig {
        AgentConfig::default()
    }

    #[test]
    fn test_idle_without_goal() {
        let mut planner = MovementPlanner::new();
        let plan = planner.plan(0, Vec3::ZERO, None, PatternOrder::Hold, &config());
        assert_eq!(plan.mode, MovementMode::Idle);
        assert!(plan.move_target.is_none());
        assert!(plan.path_goal.is_none());
    }

    #[test]
    fn test_sighted_target_is_direct() {
        let mut planner = MovementPlanner::new();
        planner.apply_path_reply(PathReply::Waypoints(vec![Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)]));
        let target = Vec3::new(500.0, 0.0, 0.0);
        let plan = planner.plan(0, Vec3::ZERO, Some((target, true)), PatternOrder::None, &config());
        assert_eq!(plan.mode, MovementMode::Direct);
        assert_eq!(plan.move_target, Some(target));
        assert_eq!(plan.path_goal, None);
    }

    #[test]
    fn test_unsighted_target_follows_path_and_requests_refresh() {
        let mut planner = MovementPlanner::new();
        let next = Vec3::new(50.0, 10.0, 0.0);
        planner.apply_path_reply(PathReply::Waypoints(vec![Vec3::ZERO, next]));
        let target = Vec3::new(500.0, 0.0, 0.0);
        let plan = planner.plan(0, Vec3::ZERO, Some((target, false)), PatternOrder::None, &config());
        assert_eq!(plan.mode, MovementMode::PathFollow);
        assert_eq!(plan.move_target, Some(next));
        assert_eq!(plan.path_goal, Some(target));
    }

    #[test]
    fn test_unsighted_without_path_is_direct() {
        let mut planner = MovementPlanner::new();
        let target = Vec3::new(500.0, 0.0, 0.0);
        let plan = planner.plan(0, Vec3::ZERO, Some((target, false)), PatternOrder::None, &config());
        assert_eq!(plan.mode, MovementMode::Direct);
        assert_eq!(plan.path_goal, Some(target));
    }

    #[test]
    fn test_patrol_advances_and_loops() {
        let a = Vec3::new(100.0, 0.0, 0.0);
        let b = Vec3::new(-100.0, 0.0, 0.0);
        let mut planner = MovementPlanner::new();
        planner.set_patrol(vec![a, b]);

        let plan = planner.plan(0, Vec3::ZERO, None, PatternOrder::Patrol, &config());
        assert_eq!(plan.path_goal, Some(a));
        assert_eq!(planner.patrol_cursor(), 0);

        let plan = planner.plan(200, Vec3::new(90.0, 0.0, 0.0), None, PatternOrder::Patrol, &config());
        assert_eq!(planner.patrol_cursor(), 1);
        assert_eq!(plan.path_goal, Some(b));

        planner.plan(400, Vec3::new(-95.0, 5.0, 0.0), None, PatternOrder::Patrol, &config());
        assert_eq!(planner.patrol_cursor(), 0);
    }

    #[test]
    fn test_patrol_requires_patrol_order() {
        let mut planner = MovementPlanner::new();
        planner.set_patrol(vec![Vec3::new(100.0, 0.0, 0.0)]);
        let plan = planner.plan(0, Vec3::ZERO, None, PatternOrder::Hold, &config());
        assert_eq!(plan.mode, MovementMode::Idle);
    }

    #[test]
    fn test_hold_faces_without_moving() {
        let mut planner = MovementPlanner::new();
        let target = Vec3::new(0.0, 300.0, 0.0);
        let plan = planner.plan(0, Vec3::ZERO, Some((target, false)), PatternOrder::Hold, &config());
        assert_eq!(plan.mode, MovementMode::Idle);
        assert!(plan.path_goal.is_none());
        assert!((plan.facing.unwrap().yaw - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_ledge_triggers_jump_after_threshold() {
        let config = config();
        let mut planner = MovementPlanner::new();
        let ledge_top = Vec3::new(20.0, 0.0, 40.0);
        planner.apply_path_reply(PathReply::Waypoints(vec![Vec3::ZERO, ledge_top]));
        let target = Some((Vec3::new(300.0, 0.0, 40.0), false));

        let mut jumps = Vec::new();
        for tick in 0..4u64 {
            // Moving enough each tick that stuck never fires.
            let pos = Vec3::new(0.0, tick as f64 * 10.0, 0.0);
            let plan = planner.plan(tick * 200, pos, target, PatternOrder::None, &config);
            jumps.push(plan.start_jump);
        }
        assert_eq!(jumps, vec![false, false, true, false]);
        assert!(planner.is_jump_cooling(600));
    }

    #[test]
    fn test_raised_target_clamps_pitch() {
        let config = config();
        let mut planner = MovementPlanner::new();
        let high = Vec3::new(100.0, 0.0, 200.0);
        let plan = planner.plan(0, Vec3::ZERO, Some((high, true)), PatternOrder::None, &config);
        assert_eq!(plan.facing.unwrap().pitch, config.raised_target_pitch_deg);

        let low = Vec3::new(100.0, 0.0, 0.0);
        let plan = planner.plan(200, Vec3::ZERO, Some((low, true)), PatternOrder::None, &config);
        assert_eq!(plan.facing.unwrap().pitch, 0.0);
    }

    #[test]
    fn test_malformed_path_reply_keeps_previous_path() {
        let mut planner = MovementPlanner::new();
        let good = vec![Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)];
        planner.apply_path_reply(PathReply::Waypoints(good.clone()));

        planner.apply_path_reply(PathReply::Waypoints(vec![
            Vec3::ZERO,
            Vec3::new(f64::NAN, 0.0, 0.0),
        ]));
        assert_eq!(planner.path().map(Path::waypoints), Some(good.as_slice()));

        planner.apply_path_reply(PathReply::Waypoints(Vec::new()));
        assert!(planner.path().is_none());
    }

    #[test]
    fn test_malformed_patrol_keeps_previous_route() {
        let a = Vec3::new(100.0, 0.0, 0.0);
        let b = Vec3::new(-100.0, 0.0, 0.0);
        let mut planner = MovementPlanner::new();
        planner.set_patrol(vec![a, b]);
        planner.plan(0, Vec3::new(95.0, 0.0, 0.0), None, PatternOrder::Patrol, &config());
        assert_eq!(planner.patrol_cursor(), 1);

        planner.set_patrol(vec![Vec3::ZERO, Vec3::new(0.0, f64::INFINITY, 0.0)]);
        assert_eq!(planner.patrol(), &[a, b]);
        assert_eq!(planner.patrol_cursor(), 1);
    }

    #[test]
    fn test_observe_feeds_stuck_check() {
        let config = config();
        let mut planner = MovementPlanner::new();
        let target = Some((Vec3::new(500.0, 0.0, 0.0), true));
        planner.plan(0, Vec3::ZERO, target, PatternOrder::None, &config);

        // Ticks spent attacking still move the reference point.
        let moved = Vec3::new(200.0, 0.0, 0.0);
        assert_eq!(planner.observe(moved), Some(200.0));
        planner.plan(400, moved, target, PatternOrder::None, &config);
        assert_eq!(planner.stuck_counter(), 1);
    }
}
