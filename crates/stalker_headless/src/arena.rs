//! The arena: a stand-in world for one agent.
//!
//! The arena plays every collaborator the agent talks to. Range sensors
//! answer with exact distances, visibility traces connect unless the
//! player is occluded, the path service answers with a straight line one
//! tick later, and a small kinematic body integrates thrust, impulses
//! and gravity on a flat floor.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, trace, warn};

use stalker_core::prelude::*;
use std::result::Result;

use crate::protocol::{attack_name, Response, TickSummary, PROTOCOL_VERSION};
use crate::scenario::{decode_raw, Scenario, ScenarioError, ScriptAction, ScriptedSignal};

/// Kinematics step.
pub const PHYSICS_STEP_MS: TimeMs = 50;

/// Delay between a sensor or trace request and its reply.
pub const SENSOR_REPLY_MS: TimeMs = 10;

/// Downward acceleration, units per second squared.
pub const GRAVITY: f64 = 800.0;

/// Closest horizontal distance the agent's body gets to a player.
pub const BODY_RADIUS: f64 = 32.0;

/// The agent's physical body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Visual centre.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Facing last requested by the agent.
    pub facing: LookAngles,
    thrust: Vec3,
    thrust_enabled: bool,
}

impl Body {
    /// Whether the thrust controller is driving the body.
    #[must_use]
    pub const fn is_thrusting(&self) -> bool {
        self.thrust_enabled
    }

    fn integrate(&mut self, dt: f64, floor: f64) {
        let grounded = self.position.z <= floor;
        if self.thrust_enabled {
            self.velocity.x = self.thrust.x;
            self.velocity.y = self.thrust.y;
        } else if grounded {
            self.velocity.x = 0.0;
            self.velocity.y = 0.0;
        }
        self.velocity.z -= GRAVITY * dt;
        self.position = self.position + self.velocity * dt;
        if self.position.z <= floor {
            self.position.z = floor;
            self.velocity.z = 0.0;
        }
    }

    fn separate_from(&mut self, other: Vec3) {
        let offset = Vec3::new(
            self.position.x - other.x,
            self.position.y - other.y,
            0.0,
        );
        let distance = offset.length();
        if distance > 0.0 && distance < BODY_RADIUS {
            let push = offset.normalize() * (BODY_RADIUS - distance);
            self.position = self.position + push;
        }
    }
}

/// One agent in a scripted world.
#[derive(Debug)]
pub struct Arena {
    runtime: AgentRuntime,
    body: Body,
    floor: f64,
    players: Vec<PlayerSnapshot>,
    occluded: HashSet<u32>,
    script: VecDeque<ScriptedSignal>,
    killed: HashSet<CollaboratorId>,
    glow: bool,
    auto_state: bool,
    next_summary: TimeMs,
    responses: Vec<Response>,
}

impl Arena {
    /// Build the arena for `scenario` and run the agent's Init_End.
    pub fn new(scenario: &Scenario, auto_state: bool) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let agent = Agent::new(InstanceId(1), scenario.agent.clone(), scenario.seed)?;

        let mut script: Vec<ScriptedSignal> = scenario.script.clone();
        script.sort_by_key(|entry| entry.at_ms);

        let mut arena = Self {
            runtime: AgentRuntime::new(agent),
            body: Body {
                position: scenario.spawn,
                ..Body::default()
            },
            floor: scenario.spawn.z,
            players: scenario.players.iter().map(|p| p.snapshot()).collect(),
            occluded: scenario.occluded.iter().copied().collect(),
            script: script.into(),
            killed: HashSet::new(),
            glow: false,
            auto_state,
            next_summary: scenario.agent.tick_ms,
            responses: vec![Response::Ready {
                version: PROTOCOL_VERSION.to_string(),
                scenario: scenario.name.clone(),
                seed: scenario.seed,
            }],
        };

        info!(
            scenario = %scenario.name,
            players = arena.players.len(),
            script = arena.script.len(),
            "Arena ready"
        );

        arena.runtime.start();
        arena.collect();
        Ok(arena)
    }

    /// Current arena time.
    #[must_use]
    pub fn now(&self) -> TimeMs {
        self.runtime.now()
    }

    /// The agent.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        self.runtime.agent()
    }

    /// The agent's body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Players as the agent sees them.
    #[must_use]
    pub fn players(&self) -> &[PlayerSnapshot] {
        &self.players
    }

    /// Hash of the agent runtime.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.runtime.state_hash()
    }

    /// Take every protocol line produced since the last call.
    pub fn take_responses(&mut self) -> Vec<Response> {
        std::mem::take(&mut self.responses)
    }

    /// Advance one physics step, interleaving scheduled agent events and
    /// script entries in time order.
    pub fn step(&mut self) {
        let end = self.now() + PHYSICS_STEP_MS;

        loop {
            let next_event = self.runtime.next_due().filter(|&t| t <= end);
            let next_script = self.script.front().map(|s| s.at_ms).filter(|&t| t <= end);
            match (next_event, next_script) {
                (event, Some(at)) if event.map_or(true, |e| at <= e) => {
                    self.runtime.advance_to(at, &self.players);
                    self.collect();
                    self.apply_script();
                }
                (Some(due), _) => {
                    self.runtime.advance_to(due, &self.players);
                    self.collect();
                }
                _ => break,
            }
        }
        self.runtime.advance_to(end, &self.players);
        self.collect();

        self.integrate();

        let tick_ms = self.agent().config().tick_ms;
        while self.next_summary <= end {
            if self.auto_state {
                let summary = TickSummary::of(self.agent(), self.next_summary);
                self.responses.push(Response::Tick(summary));
            }
            self.next_summary += tick_ms;
        }
    }

    /// Step until `until` (rounded up to whole physics steps).
    pub fn run_until(&mut self, until: TimeMs) {
        while self.now() < until {
            self.step();
        }
    }

    /// Emit the final line and return the state hash.
    pub fn finish(&mut self) -> u64 {
        let hash = self.state_hash();
        self.responses.push(Response::Finished {
            time_ms: self.now(),
            hash,
        });
        hash
    }

    fn integrate(&mut self) {
        let dt = PHYSICS_STEP_MS as f64 / 1000.0;
        if self.agent().is_removed() {
            return;
        }
        self.body.integrate(dt, self.floor);
        for player in self.players.iter().filter(|p| p.alive) {
            self.body.separate_from(player.position);
        }
    }

    fn apply_script(&mut self) {
        let now = self.now();
        while let Some(entry) = self.script.front() {
            if entry.at_ms > now {
                break;
            }
            let Some(entry) = self.script.pop_front() else {
                break;
            };
            debug!(at = entry.at_ms, action = ?entry.action, "Script");
            let event = match entry.action {
                ScriptAction::Damage(amount) => Some(AgentEvent::Damage(amount)),
                ScriptAction::Sonar => Some(AgentEvent::SonarTrigger),
                ScriptAction::Parry => Some(AgentEvent::ParryAttempt),
                ScriptAction::PrearmParry(duration_ms) => {
                    Some(AgentEvent::ParryPrearm { duration_ms })
                }
                ScriptAction::Pattern(order) => Some(AgentEvent::SetPatternOrder(order)),
                ScriptAction::Patrol(route) => Some(AgentEvent::SetPatrolWaypoints(route)),
                ScriptAction::EnterScene => Some(AgentEvent::EnterScene),
                ScriptAction::LeaveScene => Some(AgentEvent::LeaveScene),
                ScriptAction::MovePlayer { slot, position } => {
                    if let Some(player) = self.player_mut(slot) {
                        player.position = position;
                    }
                    None
                }
                ScriptAction::SetAlive { slot, alive } => {
                    if let Some(player) = self.player_mut(slot) {
                        player.alive = alive;
                    }
                    None
                }
                ScriptAction::Raw { channel, payload } => match decode_raw(&channel, &payload) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        warn!(at = entry.at_ms, %channel, error = %e, "Dropping malformed message");
                        None
                    }
                },
                ScriptAction::SetOccluded { slot, occluded } => {
                    if occluded {
                        self.occluded.insert(slot);
                    } else {
                        self.occluded.remove(&slot);
                    }
                    None
                }
            };
            if let Some(event) = event {
                self.runtime.deliver(event, &self.players);
                self.collect();
            }
        }
    }

    fn player_mut(&mut self, slot: u32) -> Option<&mut PlayerSnapshot> {
        self.players.iter_mut().find(|p| p.slot == slot)
    }

    /// Play every collaborator for the signals emitted so far.
    fn collect(&mut self) {
        let now = self.now();
        let config = self.agent().config();
        let bundle = self.body.position - Vec3::new(0.0, 0.0, config.sensor_vertical_offset);
        let path_latency = config.tick_ms;
        let references = config.references.clone();
        let attack_range = config.attack_range;

        for out in self.runtime.drain_outputs() {
            if self.killed.contains(&out.to) {
                trace!(to = %out.to, "Dropping signal to killed collaborator");
                continue;
            }
            match out.signal {
                Signal::Measure => {
                    if let CollaboratorKind::RangeSensor(n) = out.to.kind {
                        let sensor = usize::from(n);
                        if let Some(reference) = references.get(sensor) {
                            let distance = reference.distance(bundle);
                            self.runtime.post(
                                SENSOR_REPLY_MS,
                                AgentEvent::RangingReply { sensor, distance },
                            );
                        }
                    }
                }
                Signal::Trace { target, .. } => {
                    let hit = !self.occluded.contains(&u32::from(target.slot()));
                    self.runtime
                        .post(SENSOR_REPLY_MS, AgentEvent::TraceResult { target, hit });
                }
                Signal::RequestPath(request) => {
                    let reply = PathReply::Waypoints(vec![request.from, request.goal]);
                    self.runtime.post(path_latency, AgentEvent::PathReply(reply));
                }
                Signal::Thrust { direction, force } => {
                    self.body.thrust = direction * force;
                }
                Signal::ThrustEnabled(enabled) => {
                    self.body.thrust_enabled = enabled;
                }
                Signal::Impulse(impulse) => {
                    self.body.velocity = self.body.velocity + impulse;
                }
                Signal::Face(angles) => {
                    self.body.facing = angles;
                }
                Signal::Animate {
                    clip: Clip::Attack(kind),
                    ..
                } => {
                    self.responses.push(Response::Attack {
                        time_ms: now,
                        kind: attack_name(kind).to_string(),
                    });
                }
                Signal::Animate {
                    clip: Clip::Death, ..
                } => {
                    self.responses.push(Response::Death { time_ms: now });
                }
                Signal::Glow(open) => {
                    if open != self.glow {
                        self.glow = open;
                        self.responses.push(Response::ParryWindow {
                            time_ms: now,
                            open,
                        });
                    }
                }
                Signal::ArmHurtbox { damage, .. } => {
                    let hits: Vec<u32> = self
                        .players
                        .iter()
                        .filter(|p| p.alive && p.position.distance(self.body.position) <= attack_range)
                        .map(|p| p.slot)
                        .collect();
                    debug!(hurtbox = %out.to, damage, ?hits, "Hurtbox armed");
                }
                Signal::Explode => {
                    info!(at = now, "Explosion");
                }
                Signal::Kill => {
                    self.killed.insert(out.to);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::PlayerSetup;

    fn empty() -> Scenario {
        Scenario {
            players: Vec::new(),
            script: Vec::new(),
            ..Scenario::duel()
        }
    }

    #[test]
    fn test_ready_line_first() {
        let mut arena = Arena::new(&Scenario::duel(), false).unwrap();
        let lines = arena.take_responses();
        assert!(matches!(lines[0], Response::Ready { .. }));
    }

    #[test]
    fn test_agent_solves_spawn_position() {
        let mut scenario = empty();
        scenario.spawn = Vec3::new(120.0, -80.0, 0.0);
        let mut arena = Arena::new(&scenario, false).unwrap();
        arena.run_until(1000);
        let solved = arena.agent().position().unwrap();
        assert!(solved.distance(Vec3::new(120.0, -80.0, 0.0)) < 1e-6);
    }

    #[test]
    fn test_body_falls_back_to_floor() {
        let mut body = Body {
            position: Vec3::new(0.0, 0.0, 10.0),
            velocity: Vec3::new(0.0, 0.0, 300.0),
            ..Body::default()
        };
        for _ in 0..40 {
            body.integrate(0.05, 10.0);
        }
        assert_eq!(body.position.z, 10.0);
        assert_eq!(body.velocity.z, 0.0);
    }

    #[test]
    fn test_agent_closes_distance() {
        let mut arena = Arena::new(&empty_with_player(600.0), false).unwrap();
        arena.run_until(1500);
        assert!(arena.body().position.x > 100.0);
        assert!(arena.agent().target().is_some());
    }

    fn empty_with_player(x: f64) -> Scenario {
        Scenario {
            players: vec![PlayerSetup {
                slot: 2,
                team: Team::Blue,
                weapon: WeaponSlot::Melee,
                position: Vec3::new(x, 0.0, 0.0),
                alive: true,
            }],
            ..empty()
        }
    }

    #[test]
    fn test_body_keeps_its_distance() {
        let mut arena = Arena::new(&empty_with_player(200.0), false).unwrap();
        arena.run_until(5000);
        assert!(arena.body().position.distance_2d(Vec3::new(200.0, 0.0, 0.0)) >= BODY_RADIUS - 1e-6);
    }

    #[test]
    fn test_occluded_player_is_never_sighted() {
        let mut scenario = empty_with_player(600.0);
        scenario.occluded = vec![2];
        let mut arena = Arena::new(&scenario, false).unwrap();
        arena.run_until(2000);
        assert!(arena.agent().target().is_some());
        assert!(!arena.agent().selector().is_sighted(arena.now(), 500));
    }

    #[test]
    fn test_raw_messages_decoded_or_dropped() {
        let mut scenario = empty();
        scenario.script = vec![
            ScriptedSignal {
                at_ms: 300,
                action: ScriptAction::Raw {
                    channel: "damage".to_string(),
                    payload: "not a number".to_string(),
                },
            },
            ScriptedSignal {
                at_ms: 400,
                action: ScriptAction::Raw {
                    channel: "damage".to_string(),
                    payload: "25".to_string(),
                },
            },
        ];
        let mut arena = Arena::new(&scenario, false).unwrap();
        arena.run_until(350);
        assert_eq!(arena.agent().hit_points(), 450);
        arena.run_until(450);
        assert_eq!(arena.agent().hit_points(), 425);
    }

    #[test]
    fn test_auto_state_emits_one_summary_per_tick() {
        let mut arena = Arena::new(&empty(), true).unwrap();
        arena.run_until(1000);
        let ticks = arena
            .take_responses()
            .into_iter()
            .filter(|r| matches!(r, Response::Tick(_)))
            .count();
        assert_eq!(ticks, 5);
    }

    #[test]
    fn test_scripted_damage_kills() {
        let mut scenario = empty();
        scenario.script = vec![ScriptedSignal {
            at_ms: 500,
            action: ScriptAction::Damage(1000),
        }];
        let mut arena = Arena::new(&scenario, false).unwrap();
        arena.run_until(400);
        assert!(!arena.agent().is_dead());
        arena.run_until(600);
        assert!(arena.agent().is_dead());
        let deaths = arena
            .take_responses()
            .into_iter()
            .filter(|r| matches!(r, Response::Death { time_ms: 500 }))
            .count();
        assert_eq!(deaths, 1);
    }
}
