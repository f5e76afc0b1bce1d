//! Combat state and the pure rules around it.
//!
//! No scheduling happens here: the functions take plain data and return
//! decisions, and the agent applies them.

use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::time::TimeMs;

/// Top-level combat state.
///
/// Death is tracked separately on the agent; a dead agent sits in `Scene`
/// for the rest of its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatState {
    /// Freshly reset, or just finished an attack.
    #[default]
    None,
    /// Moving toward a goal.
    Move,
    /// Running an attack choreography.
    Attack,
    /// Nothing to do.
    Idle,
    /// Scripted sequence or death. Ticks are no-ops.
    Scene,
}

impl CombatState {
    /// Short lowercase name for logs and debug text.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Idle => "idle",
            Self::Scene => "scene",
        }
    }
}

/// Standing orders when no target is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PatternOrder {
    /// Stand idle until a target shows up.
    #[default]
    None,
    /// Hold position: never move, but still turn toward and attack targets
    /// that come into reach.
    Hold,
    /// Walk the patrol route.
    Patrol,
}

/// Everything the attack rule looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackCheck {
    /// Current time.
    pub now: TimeMs,
    /// Current combat state.
    pub state: CombatState,
    /// A target is locked.
    pub has_target: bool,
    /// The target is inside the sight window.
    pub sighted: bool,
    /// 3D distance to the target's last known position.
    pub distance: f64,
    /// When the previous attack finished.
    pub last_attack_finished: Option<TimeMs>,
}

/// True if an attack may start now.
#[must_use]
pub fn can_attack(check: &AttackCheck, config: &AgentConfig) -> bool {
    if !check.has_target || !check.sighted {
        return false;
    }
    if !matches!(check.state, CombatState::Move | CombatState::Idle) {
        return false;
    }
    if check.distance > config.attack_range {
        return false;
    }
    match check.last_attack_finished {
        Some(t) => check.now.saturating_sub(t) >= config.attack_delay_ms,
        None => true,
    }
}

/// Parry window bookkeeping.
///
/// The window is opened and closed by attack cues. A parry succeeds if an
/// attempt arrives while it is open, or if a pre-arm taken earlier still
/// covers the moment it opens. Every method that can succeed returns `true`
/// on success; the caller kills the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParryWindow {
    open_since: Option<TimeMs>,
    prearm_until: Option<TimeMs>,
}

impl ParryWindow {
    /// True while the window is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open_since.is_some()
    }

    /// When the window opened, if open.
    #[must_use]
    pub const fn open_since(&self) -> Option<TimeMs> {
        self.open_since
    }

    /// Open the window. Returns `true` if a pending pre-arm covers `now`.
    pub fn open(&mut self, now: TimeMs) -> bool {
        self.open_since = Some(now);
        let parried = self.prearm_until.is_some_and(|until| now <= until);
        self.prearm_until = None;
        parried
    }

    /// Close the window without a parry.
    pub fn close(&mut self) {
        self.open_since = None;
    }

    /// Immediate parry attempt.
    #[must_use]
    pub const fn attempt(&self) -> bool {
        self.is_open()
    }

    /// Pre-arm a parry for `duration_ms`. Counts as an attempt if the window
    /// is already open.
    pub fn prearm(&mut self, now: TimeMs, duration_ms: TimeMs) -> bool {
        if self.is_open() {
            return true;
        }
        self.prearm_until = Some(now.saturating_add(duration_ms));
        false
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check() -> AttackCheck {
        AttackCheck {
            now: 10_000,
            state: CombatState::Move,
            has_target: true,
            sighted: true,
            distance: 100.0,
            last_attack_finished: Some(9_000),
        }
    }

    #[test]
    fn test_attack_allowed_when_all_conditions_hold() {
        assert!(can_attack(&check(), &AgentConfig::default()));
    }

    #[test]
    fn test_attack_rules() {
        let config = AgentConfig::default();
        let cases = [
            AttackCheck { sighted: false, ..check() },
            AttackCheck { has_target: false, ..check() },
            AttackCheck { distance: 128.5, ..check() },
            AttackCheck { state: CombatState::Attack, ..check() },
            AttackCheck { state: CombatState::Scene, ..check() },
            AttackCheck { state: CombatState::None, ..check() },
            AttackCheck { last_attack_finished: Some(9_800), ..check() },
        ];
        for case in cases {
            assert!(!can_attack(&case, &config), "{case:?}");
        }
        assert!(can_attack(
            &AttackCheck { state: CombatState::Idle, last_attack_finished: Some(9_700), ..check() },
            &config
        ));
    }

    #[test]
    fn test_parry_inside_window() {
        let mut window = ParryWindow::default();
        assert!(!window.attempt());
        assert!(!window.open(1000));
        assert!(window.attempt());
        window.close();
        assert!(!window.attempt());
    }

    #[test]
    fn test_prearm_covers_opening() {
        let mut window = ParryWindow::default();
        assert!(!window.prearm(800, 300));
        assert!(window.open(1000));
    }

    #[test]
    fn test_prearm_expired_before_opening() {
        let mut window = ParryWindow::default();
        assert!(!window.prearm(500, 300));
        assert!(!window.open(1000));
    }

    #[test]
    fn test_prearm_while_open_is_attempt() {
        let mut window = ParryWindow::default();
        window.open(1000);
        assert!(window.prearm(1100, 50));
    }
}
