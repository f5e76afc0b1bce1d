//! Target selection.
//!
//! The agent hunts at most one player at a time. A lock, once taken, holds
//! for a fixed duration as long as the player stays valid and roughly in
//! range, even if better candidates show up. When the lock lapses a new
//! target is drawn uniformly from everyone eligible this tick.
//!
//! Visibility is tracked separately: the agent fires one trace per tick and
//! counts the target as sighted for a short window after the last hit.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::math::Vec3;
use crate::time::{within, TimeMs};

/// A validated player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Validate a raw slot against the configured slot count.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidPlayerSlot`] if `slot >= max_slots`.
    pub fn new(slot: u32, max_slots: u32) -> Result<Self> {
        if slot >= max_slots {
            return Err(AgentError::InvalidPlayerSlot(slot));
        }
        u8::try_from(slot)
            .map(Self)
            .map_err(|_| AgentError::InvalidPlayerSlot(slot))
    }

    /// Raw slot number.
    #[must_use]
    pub const fn slot(self) -> u8 {
        self.0
    }
}

/// Team membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    /// Not playing.
    #[default]
    Spectator,
    /// First team.
    Red,
    /// Second team.
    Blue,
}

impl Team {
    /// True if `other` is a playing team different from `self`.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other && self != Self::Spectator && other != Self::Spectator
    }
}

/// Loadout slot a player is currently wielding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponSlot {
    /// Nothing in hand.
    #[default]
    Empty,
    /// Primary weapon.
    Primary,
    /// Secondary weapon.
    Secondary,
    /// Melee weapon.
    Melee,
    /// Building or utility tool.
    Utility,
}

impl WeaponSlot {
    /// Only players holding a melee weapon may be hunted.
    #[must_use]
    pub const fn is_melee_capable(self) -> bool {
        matches!(self, Self::Melee)
    }
}

/// One connected player as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Raw player slot; validated before use.
    pub slot: u32,
    /// Alive this tick.
    pub alive: bool,
    /// Team.
    pub team: Team,
    /// Slot in hand.
    pub weapon: WeaponSlot,
    /// World position.
    pub position: Vec3,
}

impl PlayerSnapshot {
    /// True if this player may be targeted by an agent on `agent_team`.
    #[must_use]
    pub fn is_valid_target(&self, agent_team: Team) -> bool {
        self.alive && self.weapon.is_melee_capable() && self.team.is_hostile_to(agent_team)
    }
}

/// The current lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lock {
    /// Locked player.
    pub id: PlayerId,
    /// When the lock lapses.
    pub expires_at: TimeMs,
    /// Last positive trace toward this player.
    pub last_seen: Option<TimeMs>,
    /// Last position reported by the host.
    pub last_known: Vec3,
}

/// What a selection pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetUpdate {
    /// No target before or after.
    Idle,
    /// Existing lock kept.
    Kept(PlayerId),
    /// A new lock was taken (possibly re-rolling onto the same player).
    Acquired(PlayerId),
    /// The lock was dropped and nobody is eligible.
    Lost(PlayerId),
}

/// Maintains the single tracked hostile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSelector {
    lock: Option<Lock>,
}

impl TargetSelector {
    /// Create a selector with no target.
    #[must_use]
    pub const fn new() -> Self {
        Self { lock: None }
    }

    /// Current lock, if any.
    #[must_use]
    pub const fn lock(&self) -> Option<&Lock> {
        self.lock.as_ref()
    }

    /// Currently locked player.
    #[must_use]
    pub fn current(&self) -> Option<PlayerId> {
        self.lock.map(|l| l.id)
    }

    /// Last known position of the locked player.
    #[must_use]
    pub fn last_known(&self) -> Option<Vec3> {
        self.lock.map(|l| l.last_known)
    }

    /// Drop the lock.
    pub fn clear(&mut self) {
        self.lock = None;
    }

    /// True if the locked player was traced within `see_delay_ms`.
    #[must_use]
    pub fn is_sighted(&self, now: TimeMs, see_delay_ms: TimeMs) -> bool {
        self.lock
            .is_some_and(|l| within(now, l.last_seen, see_delay_ms))
    }

    /// Apply a visibility trace result. Results for anyone other than the
    /// current target are stale and ignored.
    pub fn record_trace(&mut self, now: TimeMs, target: PlayerId, hit: bool) {
        match self.lock.as_mut() {
            Some(lock) if lock.id == target => {
                if hit {
                    lock.last_seen = Some(now);
                }
            }
            _ => debug!(target = target.slot(), "Ignoring stale trace result"),
        }
    }

    /// Run one selection pass.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        now: TimeMs,
        self_position: Vec3,
        players: &[PlayerSnapshot],
        agent_team: Team,
        config: &AgentConfig,
        rng: &mut R,
    ) -> TargetUpdate {
        let valid: Vec<(PlayerId, Vec3)> = players
            .iter()
            .filter(|p| p.is_valid_target(agent_team) && p.position.is_finite())
            .filter_map(|p| {
                PlayerId::new(p.slot, config.max_player_slots)
                    .ok()
                    .map(|id| (id, p.position))
            })
            .collect();

        if let Some(lock) = self.lock.as_mut() {
            let still_valid = valid.iter().find(|(id, _)| *id == lock.id).copied();
            if let Some((_, position)) = still_valid {
                let in_keep_range = self_position.distance_2d(position)
                    <= config.target_search_distance + config.target_keep_margin
                    && self_position.distance_z(position) <= config.target_search_distance_z;
                lock.last_known = position;
                if in_keep_range && now < lock.expires_at {
                    return TargetUpdate::Kept(lock.id);
                }
            }
        }

        let mut candidates: Vec<(PlayerId, Vec3)> = valid
            .into_iter()
            .filter(|(_, position)| {
                self_position.distance_2d(*position) <= config.target_search_distance
                    && self_position.distance_z(*position) <= config.target_search_distance_z
            })
            .collect();
        candidates.sort_by_key(|(id, _)| *id);

        let previous = self.lock.take();
        match candidates.choose(rng) {
            Some(&(id, position)) => {
                // Re-locking the same player keeps its visibility history.
                let last_seen = previous.filter(|p| p.id == id).and_then(|p| p.last_seen);
                self.lock = Some(Lock {
                    id,
                    expires_at: now + config.target_duration_ms,
                    last_seen,
                    last_known: position,
                });
                info!(
                    target = id.slot(),
                    candidates = candidates.len(),
                    "Target locked"
                );
                TargetUpdate::Acquired(id)
            }
            None => match previous {
                Some(lost) => {
                    info!(target = lost.id.slot(), "Target lost");
                    TargetUpdate::Lost(lost.id)
                }
                None => TargetUpdate::Idle,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hostile(slot: u32, position: Vec3) -> PlayerSnapshot {
        PlayerSnapshot {
            slot,
            alive: true,
            team: Team::Blue,
            weapon: WeaponSlot::Melee,
            position,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_player_id_bounds() {
        assert!(PlayerId::new(63, 64).is_ok());
        assert!(PlayerId::new(64, 64).is_err());
        assert!(PlayerId::new(300, 512).is_err());
    }

    #[test]
    fn test_validity_rules() {
        let mut p = hostile(1, Vec3::ZERO);
        assert!(p.is_valid_target(Team::Red));
        assert!(!p.is_valid_target(Team::Blue));
        p.weapon = WeaponSlot::Primary;
        assert!(!p.is_valid_target(Team::Red));
        p.weapon = WeaponSlot::Melee;
        p.alive = false;
        assert!(!p.is_valid_target(Team::Red));
        assert!(!Team::Spectator.is_hostile_to(Team::Red));
    }

    #[test]
    fn test_acquires_only_in_range() {
        let config = AgentConfig::default();
        let mut selector = TargetSelector::new();
        let far = hostile(1, Vec3::new(config.target_search_distance + 1.0, 0.0, 0.0));
        let high = hostile(2, Vec3::new(0.0, 0.0, config.target_search_distance_z + 1.0));
        let update = selector.update(0, Vec3::ZERO, &[far, high], Team::Red, &config, &mut rng());
        assert_eq!(update, TargetUpdate::Idle);

        let near = hostile(3, Vec3::new(100.0, 0.0, 0.0));
        let update = selector.update(0, Vec3::ZERO, &[far, near], Team::Red, &config, &mut rng());
        assert_eq!(update, TargetUpdate::Acquired(PlayerId(3)));
    }

    #[test]
    fn test_lock_survives_new_candidates_until_expiry() {
        let config = AgentConfig::default();
        let mut selector = TargetSelector::new();
        let mut rng = rng();
        let first = hostile(5, Vec3::new(500.0, 0.0, 0.0));
        selector.update(0, Vec3::ZERO, &[first], Team::Red, &config, &mut rng);

        let crowd: Vec<_> = (0..10)
            .map(|i| hostile(10 + i, Vec3::new(10.0, f64::from(i), 0.0)))
            .chain([first])
            .collect();
        for t in (200..config.target_duration_ms).step_by(200) {
            let update = selector.update(t, Vec3::ZERO, &crowd, Team::Red, &config, &mut rng);
            assert_eq!(update, TargetUpdate::Kept(PlayerId(5)));
        }
    }

    #[test]
    fn test_lock_kept_in_margin_but_not_acquired_there() {
        let config = AgentConfig::default();
        let mut selector = TargetSelector::new();
        let mut rng = rng();
        selector.update(0, Vec3::ZERO, &[hostile(1, Vec3::new(100.0, 0.0, 0.0))], Team::Red, &config, &mut rng);

        let drifted = hostile(1, Vec3::new(config.target_search_distance + 256.0, 0.0, 0.0));
        assert_eq!(
            selector.update(200, Vec3::ZERO, &[drifted], Team::Red, &config, &mut rng),
            TargetUpdate::Kept(PlayerId(1))
        );

        let gone = hostile(1, Vec3::new(config.target_search_distance + 1024.0, 0.0, 0.0));
        assert_eq!(
            selector.update(400, Vec3::ZERO, &[gone], Team::Red, &config, &mut rng),
            TargetUpdate::Lost(PlayerId(1))
        );
        assert_eq!(selector.current(), None);
    }

    #[test]
    fn test_invalid_target_dropped() {
        let config = AgentConfig::default();
        let mut selector = TargetSelector::new();
        let mut rng = rng();
        let mut p = hostile(1, Vec3::new(10.0, 0.0, 0.0));
        selector.update(0, Vec3::ZERO, &[p], Team::Red, &config, &mut rng);
        p.alive = false;
        assert_eq!(
            selector.update(200, Vec3::ZERO, &[p], Team::Red, &config, &mut rng),
            TargetUpdate::Lost(PlayerId(1))
        );
    }

    #[test]
    fn test_out_of_range_slots_ignored() {
        let config = AgentConfig::default();
        let mut selector = TargetSelector::new();
        let bogus = hostile(64, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(
            selector.update(0, Vec3::ZERO, &[bogus], Team::Red, &config, &mut rng()),
            TargetUpdate::Idle
        );
    }

    #[test]
    fn test_sighted_window_decays() {
        let config = AgentConfig::default();
        let mut selector = TargetSelector::new();
        selector.update(0, Vec3::ZERO, &[hostile(2, Vec3::new(10.0, 0.0, 0.0))], Team::Red, &config, &mut rng());
        assert!(!selector.is_sighted(0, config.see_delay_ms));

        selector.record_trace(100, PlayerId(2), true);
        assert!(selector.is_sighted(100, config.see_delay_ms));
        assert!(selector.is_sighted(600, config.see_delay_ms));
        assert!(!selector.is_sighted(601, config.see_delay_ms));

        selector.record_trace(700, PlayerId(2), false);
        assert!(!selector.is_sighted(700, config.see_delay_ms));

        // Stale result for someone else.
        selector.record_trace(800, PlayerId(9), true);
        assert!(!selector.is_sighted(800, config.see_delay_ms));
    }
}
