//! Hit points, the sonar debuff and the health bar projection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::TimeMs;

/// Result of applying a damage signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Damage was taken and the agent survives.
    Wounded {
        /// Damage actually subtracted.
        dealt: u32,
    },
    /// This hit brought hit points to zero.
    Fatal,
    /// Hit points were already zero.
    Ignored,
}

/// Hit point pool of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: u32,
    max: u32,
    sonar_until: Option<TimeMs>,
    displayed_segment: Option<u8>,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self {
            current: max,
            max,
            sonar_until: None,
            displayed_segment: None,
        }
    }

    /// Current hit points.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// True once hit points reached zero.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// True if any damage has been taken.
    #[must_use]
    pub const fn is_damaged(&self) -> bool {
        self.current < self.max
    }

    /// Arm the damage amplification debuff until `now + duration_ms`.
    pub fn arm_sonar(&mut self, now: TimeMs, duration_ms: TimeMs) {
        self.sonar_until = Some(now.saturating_add(duration_ms));
        debug!(until = now.saturating_add(duration_ms), "Sonar debuff armed");
    }

    /// True while the debuff is active.
    #[must_use]
    pub fn is_sonar_active(&self, now: TimeMs) -> bool {
        self.sonar_until.is_some_and(|until| now < until)
    }

    /// Subtract `amount`, scaled by `sonar_multiplier` while the debuff is
    /// active.
    pub fn apply_damage(&mut self, now: TimeMs, amount: u32, sonar_multiplier: u32) -> DamageOutcome {
        if self.is_depleted() {
            return DamageOutcome::Ignored;
        }
        let scaled = if self.is_sonar_active(now) {
            amount.saturating_mul(sonar_multiplier)
        } else {
            amount
        };
        let dealt = scaled.min(self.current);
        self.current -= dealt;
        if self.current == 0 {
            DamageOutcome::Fatal
        } else {
            DamageOutcome::Wounded { dealt }
        }
    }

    /// Health bar segment for the current hit points.
    #[must_use]
    pub fn segment(&self, segments: u8) -> u8 {
        bar_segment(self.current, self.max, segments)
    }

    /// The segment to push, if it differs from the one last pushed.
    pub fn take_bar_update(&mut self, segments: u8) -> Option<u8> {
        let segment = self.segment(segments);
        if self.displayed_segment == Some(segment) {
            return None;
        }
        self.displayed_segment = Some(segment);
        Some(segment)
    }
}

/// Map hit points to a bar segment id.
///
/// `0` is a full bar and `segments` an empty one. Any damage at all shows
/// at least segment 1.
///
/// ```
/// use stalker_core::health::bar_segment;
///
/// assert_eq!(bar_segment(450, 450, 16), 0);
/// assert_eq!(bar_segment(449, 450, 16), 1);
/// assert_eq!(bar_segment(225, 450, 16), 8);
/// assert_eq!(bar_segment(0, 450, 16), 16);
/// ```
#[must_use]
pub fn bar_segment(hp: u32, max: u32, segments: u8) -> u8 {
    if max == 0 {
        return segments;
    }
    let hp = hp.min(max);
    let missing = u64::from(max - hp) * u64::from(segments) / u64::from(max);
    let segment = u8::try_from(missing).unwrap_or(segments).min(segments);
    if hp < max {
        segment.max(1)
    } else {
        segment
    }
}
