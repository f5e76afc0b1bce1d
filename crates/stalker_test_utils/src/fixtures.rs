//! Test fixtures and helpers.
//!
//! Players, configs and a [`ScriptedHost`] that stands in for the game
//! world: it answers range sensors with exact distances, traces with a
//! fixed line-of-sight flag and path requests according to a
//! [`PathService`] policy.

use std::collections::HashSet;

use stalker_core::prelude::*;
use tracing::trace;

/// Delay between a collaborator signal and the host's reply.
pub const REPLY_DELAY_MS: TimeMs = 10;

/// Default test configuration.
#[must_use]
pub fn test_config() -> AgentConfig {
    AgentConfig::default()
}

/// The default reference cube.
#[must_use]
pub fn reference_cube() -> Vec<Vec3> {
    AgentConfig::default().references
}

/// Exact distances from `position` to each reference point.
#[must_use]
pub fn exact_distances(references: &[Vec3], position: Vec3) -> Vec<f64> {
    references.iter().map(|r| r.distance(position)).collect()
}

/// An alive, melee-armed player on the Blue team (hostile to the default
/// Red agent).
#[must_use]
pub fn hostile(slot: u32, position: Vec3) -> PlayerSnapshot {
    PlayerSnapshot {
        slot,
        alive: true,
        team: Team::Blue,
        weapon: WeaponSlot::Melee,
        position,
    }
}

/// A player the agent must ignore: same team as the default agent.
#[must_use]
pub fn friendly(slot: u32, position: Vec3) -> PlayerSnapshot {
    PlayerSnapshot {
        team: Team::Red,
        ..hostile(slot, position)
    }
}

/// How the scripted host answers path requests.
#[derive(Debug, Clone, PartialEq)]
pub enum PathService {
    /// Never answer.
    Silent,
    /// Answer with `[from, goal]`.
    StraightLine,
    /// Always answer with this reply.
    Fixed(PathReply),
}

/// A stand-in world for one agent.
#[derive(Debug)]
pub struct ScriptedHost {
    /// The agent under test.
    pub runtime: AgentRuntime,
    /// Where the agent's visual centre is.
    pub agent_position: Vec3,
    /// Connected players.
    pub players: Vec<PlayerSnapshot>,
    /// Result of every visibility trace.
    pub line_of_sight: bool,
    /// Path request policy.
    pub path_service: PathService,
    /// Every signal the agent emitted, with the time it was emitted.
    pub log: Vec<(TimeMs, Outbound)>,
    killed: HashSet<CollaboratorId>,
}

impl ScriptedHost {
    /// Spawn an agent at `position` and run Init_End.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid.
    #[must_use]
    pub fn new(config: AgentConfig, seed: u64, position: Vec3) -> Self {
        let agent = Agent::new(InstanceId(1), config, seed).expect("valid test config");
        let mut host = Self {
            runtime: AgentRuntime::new(agent),
            agent_position: position,
            players: Vec::new(),
            line_of_sight: true,
            path_service: PathService::Silent,
            log: Vec::new(),
            killed: HashSet::new(),
        };
        host.runtime.start();
        host.collect();
        host
    }

    /// The agent.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        self.runtime.agent()
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> TimeMs {
        self.runtime.now()
    }

    /// Deliver an event right now.
    pub fn deliver(&mut self, event: AgentEvent) {
        self.runtime.deliver(event, &self.players);
        self.collect();
    }

    /// Run the world until `until`, answering signals as they appear.
    pub fn run_until(&mut self, until: TimeMs) {
        while let Some(due) = self.runtime.next_due().filter(|&t| t <= until) {
            self.runtime.advance_to(due, &self.players);
            self.collect();
        }
        self.runtime.advance_to(until, &self.players);
        self.collect();
    }

    /// Signals emitted at or after `since` matching `pred`.
    pub fn signals_since<'a>(
        &'a self,
        since: TimeMs,
        pred: impl Fn(&Outbound) -> bool + 'a,
    ) -> impl Iterator<Item = &'a (TimeMs, Outbound)> + 'a {
        self.log
            .iter()
            .filter(move |(t, out)| *t >= since && pred(out))
    }

    /// Count every logged signal matching `pred`.
    pub fn count(&self, pred: impl Fn(&Signal) -> bool) -> usize {
        self.log.iter().filter(|(_, out)| pred(&out.signal)).count()
    }

    /// Emission times of every logged signal matching `pred`.
    pub fn times(&self, pred: impl Fn(&Signal) -> bool) -> Vec<TimeMs> {
        self.log
            .iter()
            .filter(|(_, out)| pred(&out.signal))
            .map(|(t, _)| *t)
            .collect()
    }

    fn collect(&mut self) {
        let now = self.runtime.now();
        let offset = self.agent().config().sensor_vertical_offset;
        let bundle = self.agent_position - Vec3::new(0.0, 0.0, offset);

        for out in self.runtime.drain_outputs() {
            if self.killed.contains(&out.to) {
                trace!(to = %out.to, "Dropping signal to killed collaborator");
                continue;
            }
            match &out.signal {
                Signal::Measure => {
                    if let CollaboratorKind::RangeSensor(n) = out.to.kind {
                        let sensor = usize::from(n);
                        let distance = self.agent().config().references[sensor].distance(bundle);
                        self.runtime
                            .post(REPLY_DELAY_MS, AgentEvent::RangingReply { sensor, distance });
                    }
                }
                Signal::Trace { target, .. } => {
                    self.runtime.post(
                        REPLY_DELAY_MS,
                        AgentEvent::TraceResult {
                            target: *target,
                            hit: self.line_of_sight,
                        },
                    );
                }
                Signal::RequestPath(request) => {
                    let reply = match &self.path_service {
                        PathService::Silent => None,
                        PathService::StraightLine => {
                            Some(PathReply::Waypoints(vec![request.from, request.goal]))
                        }
                        PathService::Fixed(reply) => Some(reply.clone()),
                    };
                    if let Some(reply) = reply {
                        self.runtime
                            .post(REPLY_DELAY_MS, AgentEvent::PathReply(reply));
                    }
                }
                Signal::Kill => {
                    self.killed.insert(out.to);
                }
                _ => {}
            }
            self.log.push((now, out));
        }
    }
}
