//! Typed handles for the entities an agent drives.
//!
//! An agent owns a fixed set of collaborator entities in the host world:
//! a thrust controller, an animator, hurtboxes, eight range sensors and so
//! on. Their handles are resolved once when the agent is created and every
//! outbound call is an [`Outbound`] addressed to one of them. The host is
//! responsible for dropping calls addressed to collaborators that no longer
//! exist.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attacks::AttackKind;
use crate::config::SENSOR_COUNT;
use crate::math::{LookAngles, Vec3};
use crate::path::PathRequest;
use crate::targeting::PlayerId;
use crate::time::TimeMs;

/// Stable numeric identity of one spawned agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Damage volumes an attack can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HurtboxSlot {
    /// Left arm sweep.
    Left,
    /// Right arm sweep.
    Right,
    /// Whole-body slam.
    Body,
}

impl HurtboxSlot {
    /// All slots, in handle order.
    pub const ALL: [Self; 3] = [Self::Left, Self::Right, Self::Body];

    const fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Body => "body",
        }
    }
}

/// What a collaborator entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollaboratorKind {
    /// Locomotion force controller.
    Thrust,
    /// Facing controller.
    Facing,
    /// Model animator.
    Animator,
    /// Parry telegraph glow.
    Glow,
    /// Boss health bar.
    HealthBar,
    /// Floating debug text.
    DebugText,
    /// Line-of-sight trace emitter.
    Tracer,
    /// Client of the external path service.
    PathClient,
    /// Death explosion effect.
    Explosion,
    /// Range sensor for one reference point.
    RangeSensor(u8),
    /// Damage volume.
    Hurtbox(HurtboxSlot),
}

/// Handle to one collaborator entity of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollaboratorId {
    /// Collaborator role.
    pub kind: CollaboratorKind,
    /// Owning agent.
    pub instance: InstanceId,
}

impl fmt::Display for CollaboratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.instance;
        match self.kind {
            CollaboratorKind::Thrust => write!(f, "stalker_thrust_{id}"),
            CollaboratorKind::Facing => write!(f, "stalker_facing_{id}"),
            CollaboratorKind::Animator => write!(f, "stalker_model_{id}"),
            CollaboratorKind::Glow => write!(f, "stalker_glow_{id}"),
            CollaboratorKind::HealthBar => write!(f, "stalker_healthbar_{id}"),
            CollaboratorKind::DebugText => write!(f, "stalker_text_{id}"),
            CollaboratorKind::Tracer => write!(f, "stalker_tracer_{id}"),
            CollaboratorKind::PathClient => write!(f, "stalker_path_{id}"),
            CollaboratorKind::Explosion => write!(f, "stalker_explosion_{id}"),
            CollaboratorKind::RangeSensor(n) => write!(f, "stalker_sensor{n}_{id}"),
            CollaboratorKind::Hurtbox(slot) => write!(f, "stalker_hurt_{}_{id}", slot.label()),
        }
    }
}

/// All collaborator handles of one agent, resolved at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorHandles {
    /// Locomotion force controller.
    pub thrust: CollaboratorId,
    /// Facing controller.
    pub facing: CollaboratorId,
    /// Model animator.
    pub animator: CollaboratorId,
    /// Parry telegraph glow.
    pub glow: CollaboratorId,
    /// Health bar.
    pub health_bar: CollaboratorId,
    /// Debug text.
    pub debug_text: CollaboratorId,
    /// Visibility tracer.
    pub tracer: CollaboratorId,
    /// Path service client.
    pub path_client: CollaboratorId,
    /// Death explosion.
    pub explosion: CollaboratorId,
    /// Range sensors, in reference order.
    pub sensors: [CollaboratorId; SENSOR_COUNT],
    /// Hurtboxes, in [`HurtboxSlot::ALL`] order.
    pub hurtboxes: [CollaboratorId; 3],
}

impl CollaboratorHandles {
    /// Resolve every handle for `instance`.
    #[must_use]
    pub fn for_instance(instance: InstanceId) -> Self {
        let id = |kind| CollaboratorId { kind, instance };
        Self {
            thrust: id(CollaboratorKind::Thrust),
            facing: id(CollaboratorKind::Facing),
            animator: id(CollaboratorKind::Animator),
            glow: id(CollaboratorKind::Glow),
            health_bar: id(CollaboratorKind::HealthBar),
            debug_text: id(CollaboratorKind::DebugText),
            tracer: id(CollaboratorKind::Tracer),
            path_client: id(CollaboratorKind::PathClient),
            explosion: id(CollaboratorKind::Explosion),
            sensors: std::array::from_fn(|n| id(CollaboratorKind::RangeSensor(n as u8))),
            hurtboxes: HurtboxSlot::ALL.map(|slot| id(CollaboratorKind::Hurtbox(slot))),
        }
    }

    /// Handle of a hurtbox slot.
    #[must_use]
    pub fn hurtbox(&self, slot: HurtboxSlot) -> CollaboratorId {
        match slot {
            HurtboxSlot::Left => self.hurtboxes[0],
            HurtboxSlot::Right => self.hurtboxes[1],
            HurtboxSlot::Body => self.hurtboxes[2],
        }
    }

    /// Collaborators torn down the moment the agent dies.
    ///
    /// The animator, thrust, facing and explosion stay alive for the death
    /// animation and are removed by the deferred cleanup.
    pub fn torn_down_on_death(&self) -> impl Iterator<Item = CollaboratorId> + '_ {
        self.sensors
            .iter()
            .chain(self.hurtboxes.iter())
            .copied()
            .chain([
                self.glow,
                self.health_bar,
                self.debug_text,
                self.tracer,
                self.path_client,
            ])
    }

    /// Collaborators removed by the deferred death cleanup.
    pub fn removed_after_death(&self) -> impl Iterator<Item = CollaboratorId> {
        [self.thrust, self.facing, self.animator, self.explosion].into_iter()
    }
}

/// Animation clips the agent can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clip {
    /// Standing idle.
    Idle,
    /// Locomotion loop.
    Run,
    /// Jump take-off.
    Jump,
    /// Death collapse.
    Death,
    /// One of the attack choreographies.
    Attack(AttackKind),
}

/// A fire-and-forget call to a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    /// Set thrust direction and force.
    Thrust {
        /// Unit direction.
        direction: Vec3,
        /// Force magnitude.
        force: f64,
    },
    /// Turn thrust on or off.
    ThrustEnabled(bool),
    /// One-off velocity impulse.
    Impulse(Vec3),
    /// Set facing angles.
    Face(LookAngles),
    /// Play an animation.
    Animate {
        /// Clip to play.
        clip: Clip,
        /// Loop or play once.
        looping: bool,
        /// Playback rate.
        rate: f64,
    },
    /// Set the animation the model returns to when a one-shot ends.
    SetIdleAnimation(Clip),
    /// Arm a hurtbox for a short window.
    ArmHurtbox {
        /// Damage dealt to anything inside.
        damage: u32,
        /// How long the box stays armed.
        duration_ms: TimeMs,
    },
    /// Start or stop the parry telegraph.
    Glow(bool),
    /// Show a health bar segment.
    HealthBar(u8),
    /// Replace the debug text.
    DebugText(String),
    /// Ask a range sensor for a fresh distance.
    Measure,
    /// Fire a visibility trace.
    Trace {
        /// Trace origin.
        from: Vec3,
        /// Trace end point.
        to: Vec3,
        /// Player the trace is aimed at.
        target: PlayerId,
    },
    /// Ask the path service for a route.
    RequestPath(PathRequest),
    /// Play the death explosion.
    Explode,
    /// Remove the collaborator.
    Kill,
}

/// A signal addressed to a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    /// Receiver.
    pub to: CollaboratorId,
    /// Payload.
    pub signal: Signal,
}

impl Outbound {
    /// Create an outbound signal.
    #[must_use]
    pub const fn new(to: CollaboratorId, signal: Signal) -> Self {
        Self { to, signal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_names() {
        let handles = CollaboratorHandles::for_instance(InstanceId(7));
        assert_eq!(handles.thrust.to_string(), "stalker_thrust_7");
        assert_eq!(handles.sensors[3].to_string(), "stalker_sensor3_7");
        assert_eq!(
            handles.hurtbox(HurtboxSlot::Body).to_string(),
            "stalker_hurt_body_7"
        );
    }

    #[test]
    fn test_teardown_sets_are_disjoint_and_complete() {
        let handles = CollaboratorHandles::for_instance(InstanceId(1));
        let early: Vec<_> = handles.torn_down_on_death().collect();
        let late: Vec<_> = handles.removed_after_death().collect();
        assert_eq!(early.len(), SENSOR_COUNT + 3 + 5);
        assert_eq!(late.len(), 4);
        for id in &late {
            assert!(!early.contains(id));
        }
    }
}
