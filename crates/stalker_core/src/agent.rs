//! The melee agent controller.
//!
//! One [`Agent`] per spawned NPC. It never blocks and never talks to the
//! host directly: every handler receives a [`Ctx`] carrying the current
//! time, the scheduler to queue future events on, an outbox for
//! collaborator signals and the current player table.
//!
//! # Tick order
//!
//! Each tick, outside `Scene`:
//! 1. **Ranging** - broadcast `Measure` to all sensors and queue the solve
//!    `tick_ms - solve_lead_ms` later, so the next tick sees a fresh position
//! 2. **Targeting** - keep or re-roll the lock, fire a visibility trace
//! 3. **Attack** - start an attack if eligible; a running attack skips 4 and 5
//! 4. **Movement** - path request, facing, thrust, jump
//! 5. **Locomotion animation**
//! 6. **Health bar**
//! 7. **Debug text**
//!
//! Until the first successful solve there is no position and steps 2-7 are
//! skipped.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attacks::{choose_attack, AttackCue, AttackKind};
use crate::collaborators::{
    Clip, CollaboratorHandles, CollaboratorId, InstanceId, Outbound, Signal,
};
use crate::combat::{can_attack, AttackCheck, CombatState, ParryWindow, PatternOrder};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::health::{DamageOutcome, Health};
use crate::math::{look_angles, Vec3};
use crate::movement::{jump_timeline, JumpCue, MovementMode, MovementPlanner};
use crate::path::{PathReply, PathRequest};
use crate::ranging::PositionEstimator;
use crate::scheduler::Scheduler;
use crate::targeting::{PlayerId, PlayerSnapshot, TargetSelector, TargetUpdate};
use crate::time::TimeMs;
use crate::timeline::{fire, Performer};

/// Deferred steps of the death sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCue {
    /// Play the explosion and remove the model.
    Explode,
    /// Final removal.
    Remove,
}

/// An attack cue tagged with the attack it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackStep {
    /// Serial number of the attack that scheduled this cue.
    pub serial: u64,
    /// The cue.
    pub cue: AttackCue,
}

/// Everything that can be delivered to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    /// Periodic tick.
    Tick,
    /// A range sensor answered.
    RangingReply {
        /// Sensor index.
        sensor: usize,
        /// Measured distance.
        distance: f64,
    },
    /// Run the position solve.
    Solve,
    /// Result of this tick's visibility trace.
    TraceResult {
        /// Player the trace was aimed at.
        target: PlayerId,
        /// The trace reached the player.
        hit: bool,
    },
    /// The path service answered.
    PathReply(PathReply),
    /// Incoming damage.
    Damage(u32),
    /// "Parry now".
    ParryAttempt,
    /// Parry pre-arm covering the next `duration_ms`.
    ParryPrearm {
        /// Grace duration.
        duration_ms: TimeMs,
    },
    /// Arm the damage amplification debuff.
    SonarTrigger,
    /// Change standing orders.
    SetPatternOrder(PatternOrder),
    /// Replace the patrol route.
    SetPatrolWaypoints(Vec<Vec3>),
    /// A scheduled attack cue.
    Attack(AttackStep),
    /// A scheduled jump cue.
    Jump(JumpCue),
    /// A scheduled death cleanup step.
    DeathCleanup(DeathCue),
    /// A scripted sequence takes over.
    EnterScene,
    /// The scripted sequence ended.
    LeaveScene,
}

/// Handler context: the agent's window onto the host.
pub struct Ctx<'a> {
    /// Current time.
    pub now: TimeMs,
    /// Queue for future events.
    pub scheduler: &'a mut Scheduler<AgentEvent>,
    /// Collaborator signals emitted so far.
    pub outbox: &'a mut Vec<Outbound>,
    /// Connected players.
    pub players: &'a [PlayerSnapshot],
}

impl<'a> Ctx<'a> {
    /// Bundle the pieces of a handler context.
    pub fn new(
        now: TimeMs,
        scheduler: &'a mut Scheduler<AgentEvent>,
        outbox: &'a mut Vec<Outbound>,
        players: &'a [PlayerSnapshot],
    ) -> Self {
        Self {
            now,
            scheduler,
            outbox,
            players,
        }
    }

    /// Queue `event` `delay` ms from now.
    pub fn schedule(&mut self, delay: TimeMs, event: AgentEvent) {
        self.scheduler.schedule(self.now, delay, event);
    }

    /// Emit a signal.
    pub fn send(&mut self, to: CollaboratorId, signal: Signal) {
        self.outbox.push(Outbound::new(to, signal));
    }
}

/// One melee agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    id: InstanceId,
    config: AgentConfig,
    handles: CollaboratorHandles,
    rng: ChaCha8Rng,

    ticking: bool,
    state: CombatState,
    dead: bool,
    removed: bool,
    pattern: PatternOrder,
    tracking: bool,

    estimator: PositionEstimator,
    position: Option<Vec3>,
    selector: TargetSelector,
    planner: MovementPlanner,
    mode: MovementMode,
    health: Health,

    speed: f64,
    heading: Vec3,
    thrusting: bool,

    last_attack: Option<AttackKind>,
    last_attack_finished: Option<TimeMs>,
    attack_serial: u64,
    parry: ParryWindow,

    locomotion: Option<Clip>,
    debug_line: Option<String>,
}

impl Agent {
    /// Create an agent and resolve its collaborator handles.
    ///
    /// The agent does nothing until [`Agent::init_end`] runs.
    ///
    /// # Example
    ///
    /// ```
    /// use stalker_core::prelude::*;
    ///
    /// let agent = Agent::new(InstanceId(3), AgentConfig::default(), 42).unwrap();
    /// assert_eq!(agent.hit_points(), 450);
    /// assert_eq!(agent.handles().thrust.to_string(), "stalker_thrust_3");
    /// ```
    pub fn new(id: InstanceId, config: AgentConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let estimator =
            PositionEstimator::new(config.references.clone(), config.sensor_vertical_offset);
        Ok(Self {
            id,
            handles: CollaboratorHandles::for_instance(id),
            rng: ChaCha8Rng::seed_from_u64(seed),
            ticking: false,
            state: CombatState::None,
            dead: false,
            removed: false,
            pattern: PatternOrder::None,
            tracking: true,
            estimator,
            position: None,
            selector: TargetSelector::new(),
            planner: MovementPlanner::new(),
            mode: MovementMode::Idle,
            health: Health::new(config.max_hit_points),
            speed: config.default_speed,
            heading: Vec3::new(1.0, 0.0, 0.0),
            thrusting: false,
            last_attack: None,
            last_attack_finished: None,
            attack_serial: 0,
            parry: ParryWindow::default(),
            locomotion: None,
            debug_line: None,
            config,
        })
    }

    /// Instance id.
    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Collaborator handles.
    #[must_use]
    pub const fn handles(&self) -> &CollaboratorHandles {
        &self.handles
    }

    /// Combat state.
    #[must_use]
    pub const fn state(&self) -> CombatState {
        self.state
    }

    /// True once the death sequence started.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// True once the death cleanup finished.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    /// Standing orders.
    #[must_use]
    pub const fn pattern(&self) -> PatternOrder {
        self.pattern
    }

    /// False while an attack has taken over facing and targeting.
    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Estimated position, or `None` while unknown.
    #[must_use]
    pub const fn position(&self) -> Option<Vec3> {
        self.position
    }

    /// Locked target.
    #[must_use]
    pub fn target(&self) -> Option<PlayerId> {
        self.selector.current()
    }

    /// Target selector state.
    #[must_use]
    pub const fn selector(&self) -> &TargetSelector {
        &self.selector
    }

    /// Movement planner state.
    #[must_use]
    pub const fn planner(&self) -> &MovementPlanner {
        &self.planner
    }

    /// Movement mode chosen on the last tick.
    #[must_use]
    pub const fn mode(&self) -> MovementMode {
        self.mode
    }

    /// Hit point pool.
    #[must_use]
    pub const fn health(&self) -> &Health {
        &self.health
    }

    /// Current hit points.
    #[must_use]
    pub const fn hit_points(&self) -> u32 {
        self.health.current()
    }

    /// Movement speed multiplier.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// The attack started most recently.
    #[must_use]
    pub const fn last_attack(&self) -> Option<AttackKind> {
        self.last_attack
    }

    /// When the last attack finished.
    #[must_use]
    pub const fn last_attack_finished(&self) -> Option<TimeMs> {
        self.last_attack_finished
    }

    /// Parry window state.
    #[must_use]
    pub const fn parry_window(&self) -> &ParryWindow {
        &self.parry
    }

    /// True while thrust is enabled.
    #[must_use]
    pub const fn is_thrusting(&self) -> bool {
        self.thrusting
    }

    /// Reset every per-life field and start the tick loop.
    pub fn init_end(&mut self, ctx: &mut Ctx<'_>) {
        if self.dead {
            debug!(agent = %self.id, "Ignoring Init_End after death");
            return;
        }
        self.state = CombatState::None;
        self.pattern = PatternOrder::None;
        self.tracking = true;
        self.estimator.reset();
        self.position = None;
        self.selector.clear();
        self.planner = MovementPlanner::new();
        self.mode = MovementMode::Idle;
        self.health = Health::new(self.config.max_hit_points);
        self.speed = self.config.default_speed;
        self.thrusting = false;
        self.last_attack = None;
        self.last_attack_finished = None;
        self.parry.reset();
        self.locomotion = None;
        self.debug_line = None;

        ctx.send(self.handles.animator, Signal::SetIdleAnimation(Clip::Idle));
        ctx.send(self.handles.thrust, Signal::ThrustEnabled(false));
        if !self.ticking {
            self.ticking = true;
            ctx.schedule(0, AgentEvent::Tick);
        }
        info!(agent = %self.id, "Agent initialised");
    }

    /// Handle one event.
    ///
    /// Malformed or stale input is logged and dropped; nothing propagates.
    pub fn handle(&mut self, event: AgentEvent, ctx: &mut Ctx<'_>) {
        match event {
            AgentEvent::Tick => self.on_tick(ctx),
            AgentEvent::RangingReply { sensor, distance } => {
                if let Err(e) = self.estimator.record(sensor, distance) {
                    debug!(agent = %self.id, error = %e, "Dropping ranging reply");
                }
            }
            AgentEvent::Solve => self.on_solve(),
            AgentEvent::TraceResult { target, hit } => {
                self.selector.record_trace(ctx.now, target, hit);
            }
            AgentEvent::PathReply(reply) => {
                if !self.dead {
                    self.planner.apply_path_reply(reply);
                }
            }
            AgentEvent::Damage(amount) => self.on_damage(amount, ctx),
            AgentEvent::ParryAttempt => {
                if !self.dead && self.parry.attempt() {
                    self.die(ctx, "parried");
                }
            }
            AgentEvent::ParryPrearm { duration_ms } => {
                if !self.dead && self.parry.prearm(ctx.now, duration_ms) {
                    self.die(ctx, "parried");
                }
            }
            AgentEvent::SonarTrigger => {
                if !self.dead {
                    self.health.arm_sonar(ctx.now, self.config.sonar_duration_ms);
                }
            }
            AgentEvent::SetPatternOrder(pattern) => {
                debug!(agent = %self.id, ?pattern, "Pattern order");
                self.pattern = pattern;
                self.planner.clear_path();
            }
            AgentEvent::SetPatrolWaypoints(points) => self.planner.set_patrol(points),
            AgentEvent::Attack(step) => {
                fire(self, step, ctx);
            }
            AgentEvent::Jump(cue) => {
                fire(self, cue, ctx);
            }
            AgentEvent::DeathCleanup(cue) => {
                fire(self, cue, ctx);
            }
            AgentEvent::EnterScene => self.enter_scene(ctx),
            AgentEvent::LeaveScene => self.leave_scene(),
        }
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if self.dead {
            return;
        }
        ctx.schedule(self.config.tick_ms, AgentEvent::Tick);
        if self.state == CombatState::Scene {
            return;
        }

        for sensor in self.handles.sensors {
            ctx.send(sensor, Signal::Measure);
        }
        ctx.schedule(self.config.solve_delay_ms(), AgentEvent::Solve);

        let Some(position) = self.position else {
            self.stop_thrust(ctx);
            self.mode = MovementMode::Idle;
            return;
        };

        self.update_target(ctx, position);
        if self.state != CombatState::Attack {
            self.try_start_attack(ctx, position);
        }
        if self.state == CombatState::Attack {
            self.planner.observe(position);
        } else {
            self.update_movement(ctx, position);
            self.update_locomotion(ctx);
        }
        if let Some(segment) = self.health.take_bar_update(self.config.health_bar_segments) {
            ctx.send(self.handles.health_bar, Signal::HealthBar(segment));
        }
        self.update_debug_text(ctx);
    }

    fn on_solve(&mut self) {
        if self.dead {
            return;
        }
        match self.estimator.solve() {
            Ok(Some(position)) => self.position = Some(position),
            Ok(None) => {}
            Err(e) => {
                if self.position.is_some() {
                    warn!(agent = %self.id, error = %e, "Position solve failed, suspending");
                }
                self.position = None;
            }
        }
    }

    fn on_damage(&mut self, amount: u32, ctx: &mut Ctx<'_>) {
        if self.dead {
            debug!(agent = %self.id, amount, "Ignoring damage after death");
            return;
        }
        match self
            .health
            .apply_damage(ctx.now, amount, self.config.sonar_multiplier)
        {
            DamageOutcome::Fatal => self.die(ctx, "damage"),
            DamageOutcome::Wounded { dealt } => {
                debug!(agent = %self.id, dealt, hp = self.health.current(), "Damaged");
            }
            DamageOutcome::Ignored => {}
        }
    }

    fn update_target(&mut self, ctx: &mut Ctx<'_>, position: Vec3) {
        if self.tracking {
            let previous = self.selector.current();
            let update = self.selector.update(
                ctx.now,
                position,
                ctx.players,
                self.config.team,
                &self.config,
                &mut self.rng,
            );
            match update {
                TargetUpdate::Acquired(id) if previous != Some(id) => self.planner.clear_path(),
                TargetUpdate::Lost(_) => self.planner.clear_path(),
                _ => {}
            }
        }
        if let Some(lock) = self.selector.lock() {
            ctx.send(
                self.handles.tracer,
                Signal::Trace {
                    from: position,
                    to: lock.last_known,
                    target: lock.id,
                },
            );
        }
    }

    fn try_start_attack(&mut self, ctx: &mut Ctx<'_>, position: Vec3) {
        let Some(target_pos) = self.selector.last_known() else {
            return;
        };
        let check = AttackCheck {
            now: ctx.now,
            state: self.state,
            has_target: true,
            sighted: self.selector.is_sighted(ctx.now, self.config.see_delay_ms),
            distance: position.distance(target_pos),
            last_attack_finished: self.last_attack_finished,
        };
        if !can_attack(&check, &self.config) {
            return;
        }

        let kind = choose_attack(self.last_attack, &mut self.rng);
        self.attack_serial += 1;
        self.last_attack = Some(kind);
        self.state = CombatState::Attack;
        self.tracking = false;
        self.locomotion = None;
        ctx.send(self.handles.facing, Signal::Face(look_angles(position, target_pos)));

        let serial = self.attack_serial;
        kind.timeline().play(kind.rate(), |delay, cue| {
            ctx.schedule(delay, AgentEvent::Attack(AttackStep { serial, cue }));
        });
        info!(
            agent = %self.id,
            attack = ?kind,
            target = ?self.selector.current(),
            "Attack started"
        );
    }

    fn update_movement(&mut self, ctx: &mut Ctx<'_>, position: Vec3) {
        let see_delay = self.config.see_delay_ms;
        let target = self
            .selector
            .lock()
            .map(|lock| (lock.last_known, self.selector.is_sighted(ctx.now, see_delay)));
        let plan = self
            .planner
            .plan(ctx.now, position, target, self.pattern, &self.config);
        self.mode = plan.mode;

        if let Some(goal) = plan.path_goal {
            ctx.send(
                self.handles.path_client,
                Signal::RequestPath(PathRequest {
                    requester: self.id,
                    from: position,
                    goal,
                }),
            );
        }
        if let Some(facing) = plan.facing {
            ctx.send(self.handles.facing, Signal::Face(facing));
        }
        if plan.stuck {
            debug!(agent = %self.id, "Stuck, falling back to direct movement");
        }

        // The jump cooldown holds off forward thrust only.
        let Some(move_target) = plan.move_target else {
            self.state = CombatState::Idle;
            self.stop_thrust(ctx);
            return;
        };

        self.state = CombatState::Move;
        if plan.start_jump {
            let direction = (move_target - position).flattened().normalize();
            if direction != Vec3::ZERO {
                self.heading = direction;
            }
            jump_timeline().play(1.0, |delay, cue| ctx.schedule(delay, AgentEvent::Jump(cue)));
            info!(agent = %self.id, "Jumping");
        } else if !plan.thrust_suppressed {
            self.push_thrust(ctx, move_target - position);
        }
    }

    fn update_locomotion(&mut self, ctx: &mut Ctx<'_>) {
        if self.planner.is_jump_cooling(ctx.now) && self.locomotion == Some(Clip::Jump) {
            return;
        }
        let clip = if self.thrusting { Clip::Run } else { Clip::Idle };
        if self.locomotion == Some(clip) {
            return;
        }
        self.locomotion = Some(clip);
        let rate = if clip == Clip::Run { self.speed } else { 1.0 };
        ctx.send(
            self.handles.animator,
            Signal::Animate {
                clip,
                looping: true,
                rate,
            },
        );
    }

    fn update_debug_text(&mut self, ctx: &mut Ctx<'_>) {
        if !self.config.debug_text {
            return;
        }
        let target = self
            .selector
            .current()
            .map_or_else(|| "-".to_string(), |t| t.slot().to_string());
        let line = format!(
            "{} hp={} target={} mode={:?}",
            self.state.name(),
            self.health.current(),
            target,
            self.mode
        );
        if self.debug_line.as_deref() == Some(line.as_str()) {
            return;
        }
        ctx.send(self.handles.debug_text, Signal::DebugText(line.clone()));
        self.debug_line = Some(line);
    }

    /// Thrust along `direction` (flattened) at the current speed.
    fn push_thrust(&mut self, ctx: &mut Ctx<'_>, direction: Vec3) {
        let direction = direction.flattened().normalize();
        if direction == Vec3::ZERO || self.speed <= 0.0 {
            self.stop_thrust(ctx);
            return;
        }
        self.heading = direction;
        let force = self.config.thrust_force * self.speed;
        self.send_thrust(ctx, direction, force);
    }

    fn send_thrust(&mut self, ctx: &mut Ctx<'_>, direction: Vec3, force: f64) {
        ctx.send(self.handles.thrust, Signal::Thrust { direction, force });
        if !self.thrusting {
            ctx.send(self.handles.thrust, Signal::ThrustEnabled(true));
            self.thrusting = true;
        }
    }

    fn stop_thrust(&mut self, ctx: &mut Ctx<'_>) {
        if self.thrusting {
            ctx.send(self.handles.thrust, Signal::ThrustEnabled(false));
            self.thrusting = false;
        }
    }

    fn enter_scene(&mut self, ctx: &mut Ctx<'_>) {
        if self.dead {
            return;
        }
        info!(agent = %self.id, from = self.state.name(), "Entering scene");
        self.state = CombatState::Scene;
        self.parry.close();
        self.stop_thrust(ctx);
    }

    fn leave_scene(&mut self) {
        if self.dead || self.state != CombatState::Scene {
            return;
        }
        info!(agent = %self.id, "Leaving scene");
        self.state = CombatState::None;
        self.tracking = true;
        self.speed = self.config.default_speed;
        self.locomotion = None;
    }

    /// Start the death sequence. Runs at most once per agent.
    fn die(&mut self, ctx: &mut Ctx<'_>, cause: &str) {
        if self.dead {
            return;
        }
        self.dead = true;
        self.state = CombatState::Scene;
        self.tracking = false;
        self.parry.reset();
        self.selector.clear();
        self.planner.clear_path();

        ctx.send(self.handles.thrust, Signal::ThrustEnabled(false));
        self.thrusting = false;
        ctx.send(
            self.handles.animator,
            Signal::Animate {
                clip: Clip::Death,
                looping: false,
                rate: 1.0,
            },
        );
        ctx.send(self.handles.glow, Signal::Glow(false));
        for id in self.handles.torn_down_on_death() {
            ctx.send(id, Signal::Kill);
        }
        ctx.schedule(
            self.config.death_explosion_ms,
            AgentEvent::DeathCleanup(DeathCue::Explode),
        );
        ctx.schedule(
            self.config.death_removal_ms,
            AgentEvent::DeathCleanup(DeathCue::Remove),
        );
        info!(agent = %self.id, cause, hp = self.health.current(), "Agent died");
    }

    fn attack_direction(&self) -> Vec3 {
        match (self.position, self.selector.last_known()) {
            (Some(from), Some(to)) => to - from,
            _ => self.heading,
        }
    }

    /// Encode the full agent state.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| AgentError::Snapshot(e.to_string()))
    }

    /// Decode a snapshot taken with [`Agent::snapshot`].
    pub fn restore(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| AgentError::Snapshot(e.to_string()))
    }

    /// Hash of the full agent state. Identical agents hash identically.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self.snapshot() {
            Ok(bytes) => bytes.hash(&mut hasher),
            Err(e) => e.to_string().hash(&mut hasher),
        }
        hasher.finish()
    }
}

impl<'a> Performer<AttackStep, Ctx<'a>> for Agent {
    fn is_live(&self, step: &AttackStep) -> bool {
        !self.dead && self.state == CombatState::Attack && step.serial == self.attack_serial
    }

    fn perform(&mut self, step: AttackStep, ctx: &mut Ctx<'a>) {
        match step.cue {
            AttackCue::Animate => {
                if let Some(kind) = self.last_attack {
                    ctx.send(
                        self.handles.animator,
                        Signal::Animate {
                            clip: Clip::Attack(kind),
                            looping: false,
                            rate: kind.rate(),
                        },
                    );
                }
            }
            AttackCue::SetSpeed(speed) => {
                self.speed = speed.clamp(0.0, self.config.max_speed);
                let direction = self.attack_direction();
                self.push_thrust(ctx, direction);
            }
            AttackCue::Arm {
                slot,
                damage,
                duration_ms,
            } => ctx.send(
                self.handles.hurtbox(slot),
                Signal::ArmHurtbox {
                    damage,
                    duration_ms,
                },
            ),
            AttackCue::ParryOpen => {
                ctx.send(self.handles.glow, Signal::Glow(true));
                debug!(agent = %self.id, "Parry window open");
                if self.parry.open(ctx.now) {
                    self.die(ctx, "parried early");
                }
            }
            AttackCue::ParryClose => {
                self.parry.close();
                ctx.send(self.handles.glow, Signal::Glow(false));
                debug!(agent = %self.id, "Parry window closed");
            }
            AttackCue::Post => {
                self.parry.close();
                self.tracking = true;
                self.state = CombatState::None;
                self.last_attack_finished = Some(ctx.now);
                self.speed = self.config.default_speed;
                debug!(agent = %self.id, attack = ?self.last_attack, "Attack finished");
            }
        }
    }
}

impl<'a> Performer<JumpCue, Ctx<'a>> for Agent {
    fn is_live(&self, _cue: &JumpCue) -> bool {
        !self.dead && self.state == CombatState::Move
    }

    fn perform(&mut self, cue: JumpCue, ctx: &mut Ctx<'a>) {
        match cue {
            JumpCue::Reverse => {
                self.locomotion = Some(Clip::Jump);
                ctx.send(
                    self.handles.animator,
                    Signal::Animate {
                        clip: Clip::Jump,
                        looping: false,
                        rate: 1.0,
                    },
                );
                let force = self.config.thrust_force * 0.5;
                self.send_thrust(ctx, -self.heading, force);
            }
            JumpCue::Launch => {
                ctx.send(
                    self.handles.thrust,
                    Signal::Impulse(Vec3::UP * self.config.jump_impulse),
                );
            }
            JumpCue::Restore => {
                let force = self.config.thrust_force * self.speed;
                self.send_thrust(ctx, self.heading, force);
            }
        }
    }
}

impl<'a> Performer<DeathCue, Ctx<'a>> for Agent {
    fn is_live(&self, _cue: &DeathCue) -> bool {
        self.dead && !self.removed
    }

    fn perform(&mut self, cue: DeathCue, ctx: &mut Ctx<'a>) {
        match cue {
            DeathCue::Explode => {
                ctx.send(self.handles.explosion, Signal::Explode);
                for id in [self.handles.animator, self.handles.thrust, self.handles.facing] {
                    ctx.send(id, Signal::Kill);
                }
            }
            DeathCue::Remove => {
                ctx.send(self.handles.explosion, Signal::Kill);
                self.removed = true;
                info!(agent = %self.id, "Agent removed");
            }
        }
    }
}
