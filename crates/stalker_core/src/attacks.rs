//! Attack choreographies.
//!
//! Five fixed attacks, each a [`Timeline`] of [`AttackCue`]s authored at
//! rate 1.0 and played back at the attack's own rate. Two of them
//! (Overhead and Slam) telegraph a parry window.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::collaborators::HurtboxSlot;
use crate::time::TimeMs;
use crate::timeline::Timeline;

/// One of the five attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Slow two-handed overhead chop. Parryable.
    Overhead,
    /// Left-right double sweep while advancing slowly.
    Sweep,
    /// Pause, then a fast forward lunge.
    Lunge,
    /// Four quick alternating strikes.
    Flurry,
    /// Jumping body slam. Parryable.
    Slam,
}

/// A step inside an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackCue {
    /// Start the attack animation.
    Animate,
    /// Change the movement speed multiplier. Zero stops thrust.
    SetSpeed(f64),
    /// Arm a hurtbox.
    Arm {
        /// Which hurtbox.
        slot: HurtboxSlot,
        /// Damage dealt.
        damage: u32,
        /// How long it stays armed.
        duration_ms: TimeMs,
    },
    /// Open the parry window.
    ParryOpen,
    /// Close the parry window.
    ParryClose,
    /// Finish the attack.
    Post,
}

impl AttackKind {
    /// All attacks, indexed by [`AttackKind::index`].
    pub const ALL: [Self; 5] = [
        Self::Overhead,
        Self::Sweep,
        Self::Lunge,
        Self::Flurry,
        Self::Slam,
    ];

    /// Position in [`AttackKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Overhead => 0,
            Self::Sweep => 1,
            Self::Lunge => 2,
            Self::Flurry => 3,
            Self::Slam => 4,
        }
    }

    /// Playback rate; authored offsets are divided by it.
    #[must_use]
    pub const fn rate(self) -> f64 {
        match self {
            Self::Overhead => 1.0,
            Self::Sweep => 1.25,
            Self::Lunge => 1.1,
            Self::Flurry => 1.4,
            Self::Slam => 0.9,
        }
    }

    /// True for attacks with a parry window.
    #[must_use]
    pub const fn is_parryable(self) -> bool {
        matches!(self, Self::Overhead | Self::Slam)
    }

    /// The authored choreography.
    #[must_use]
    pub fn timeline(self) -> Timeline<AttackCue> {
        use AttackCue::{Animate, Arm, ParryClose, ParryOpen, Post, SetSpeed};
        use HurtboxSlot::{Body, Left, Right};

        let arm = |slot, damage, duration_ms| Arm {
            slot,
            damage,
            duration_ms,
        };
        match self {
            Self::Overhead => Timeline::new([
                (0, Animate),
                (0, SetSpeed(0.0)),
                (200, ParryOpen),
                (600, ParryClose),
                (650, arm(Right, 60, 200)),
                (900, SetSpeed(1.0)),
                (1100, Post),
            ]),
            Self::Sweep => Timeline::new([
                (0, Animate),
                (0, SetSpeed(0.5)),
                (300, arm(Left, 35, 150)),
                (550, arm(Right, 35, 150)),
                (900, Post),
            ]),
            Self::Lunge => Timeline::new([
                (0, Animate),
                (0, SetSpeed(0.0)),
                (350, SetSpeed(1.5)),
                (400, arm(Right, 45, 250)),
                (700, SetSpeed(0.0)),
                (1000, Post),
            ]),
            Self::Flurry => Timeline::new([
                (0, Animate),
                (0, SetSpeed(0.8)),
                (200, arm(Left, 20, 100)),
                (400, arm(Right, 20, 100)),
                (600, arm(Left, 20, 100)),
                (800, arm(Right, 20, 100)),
                (1100, Post),
            ]),
            Self::Slam => Timeline::new([
                (0, Animate),
                (0, SetSpeed(0.0)),
                (300, ParryOpen),
                (800, ParryClose),
                (850, arm(Body, 80, 200)),
                (1300, Post),
            ]),
        }
    }
}

/// Pick an attack uniformly, never repeating `previous`.
pub fn choose_attack<R: Rng + ?Sized>(previous: Option<AttackKind>, rng: &mut R) -> AttackKind {
    match previous {
        None => AttackKind::ALL[rng.gen_range(0..AttackKind::ALL.len())],
        Some(prev) => {
            // Draw from the other four and skip over the previous slot.
            let mut index = rng.gen_range(0..AttackKind::ALL.len() - 1);
            if index >= prev.index() {
                index += 1;
            }
            AttackKind::ALL[index]
        }
    }
}
