//! Property tests for the agent's laws.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stalker_core::attacks::{choose_attack, AttackKind};
use stalker_core::combat::ParryWindow;
use stalker_core::config::AgentConfig;
use stalker_core::health::Health;
use stalker_core::math::Vec3;
use stalker_core::prelude::{AgentEvent, Signal, TimeMs};
use stalker_core::ranging::multilaterate;
use stalker_core::targeting::{TargetSelector, TargetUpdate, Team};
use stalker_test_utils::determinism::strategies::{
    arb_damage_sequence, arb_player, arb_position, arb_sensor_order,
};
use stalker_test_utils::fixtures::{
    exact_distances, hostile, reference_cube, test_config, ScriptedHost,
};

proptest! {
    #[test]
    fn multilateration_round_trip(p in arb_position()) {
        let refs = reference_cube();
        let distances = exact_distances(&refs, p);
        let solved = multilaterate(&refs, &distances).unwrap();
        prop_assert!(solved.distance(p) < 1e-6, "solved {solved:?} for {p:?}");
    }

    #[test]
    fn measurement_order_is_irrelevant(p in arb_position(), order in arb_sensor_order()) {
        let refs = reference_cube();
        let distances = exact_distances(&refs, p);
        let shuffled_refs: Vec<Vec3> = order.iter().map(|&i| refs[i]).collect();
        let shuffled: Vec<f64> = order.iter().map(|&i| distances[i]).collect();

        let a = multilaterate(&refs, &distances).unwrap();
        let b = multilaterate(&shuffled_refs, &shuffled).unwrap();
        prop_assert!(a.distance(b) < 1e-6);
    }

    #[test]
    fn attacks_never_repeat(seed in any::<u64>(), n in 2usize..64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut previous: Option<AttackKind> = None;
        for _ in 0..n {
            let next = choose_attack(previous, &mut rng);
            prop_assert_ne!(Some(next), previous);
            previous = Some(next);
        }
    }

    #[test]
    fn lock_holds_for_its_duration(seed in any::<u64>(), newcomers in 1u32..6) {
        let config = AgentConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut selector = TargetSelector::new();
        let mut players = vec![
            hostile(0, Vec3::new(200.0, 0.0, 0.0)),
            hostile(1, Vec3::new(-200.0, 0.0, 0.0)),
        ];

        let first = match selector.update(0, Vec3::ZERO, &players, Team::Red, &config, &mut rng) {
            TargetUpdate::Acquired(id) => id,
            other => panic!("expected a lock, got {other:?}"),
        };

        // Closer, equally eligible candidates show up.
        for n in 0..newcomers {
            players.push(hostile(10 + n, Vec3::new(30.0, 30.0, 0.0)));
        }

        let mut now = 0;
        while now + config.tick_ms < config.target_duration_ms {
            now += config.tick_ms;
            let update = selector.update(now, Vec3::ZERO, &players, Team::Red, &config, &mut rng);
            prop_assert_eq!(update, TargetUpdate::Kept(first));
        }

        let update = selector.update(
            config.target_duration_ms,
            Vec3::ZERO,
            &players,
            Team::Red,
            &config,
            &mut rng,
        );
        prop_assert!(matches!(update, TargetUpdate::Acquired(_)));
    }

    #[test]
    fn only_valid_players_are_locked(
        seed in any::<u64>(),
        players in prop::collection::vec(arb_player(64), 0..12),
    ) {
        let config = AgentConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut selector = TargetSelector::new();
        selector.update(0, Vec3::ZERO, &players, Team::Red, &config, &mut rng);
        if let Some(id) = selector.current() {
            let valid = players
                .iter()
                .any(|p| u32::from(id.slot()) == p.slot && p.is_valid_target(Team::Red));
            prop_assert!(valid);
        } else {
            prop_assert!(!players.iter().any(|p| p.is_valid_target(Team::Red)));
        }
    }

    #[test]
    fn health_bar_never_refills(damage in arb_damage_sequence()) {
        let mut health = Health::new(450);
        let mut shown = Vec::new();
        if let Some(segment) = health.take_bar_update(16) {
            shown.push(segment);
        }
        for amount in damage {
            health.apply_damage(0, amount, 2);
            if let Some(segment) = health.take_bar_update(16) {
                shown.push(segment);
            }
            if health.is_damaged() {
                prop_assert!(health.segment(16) >= 1);
            }
        }
        prop_assert!(shown.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(shown.iter().skip(1).all(|&s| s >= 1 && s <= 16));
    }

    #[test]
    fn early_input_needs_grace(
        prearm_at in 0u64..1_000,
        grace in 0u64..500,
        gap in 1u64..1_000,
    ) {
        let mut window = ParryWindow::default();
        prop_assert!(!window.prearm(prearm_at, grace));
        let opens_at = prearm_at + grace + gap;
        prop_assert!(!window.open(opens_at));

        let mut covered = ParryWindow::default();
        covered.prearm(prearm_at, grace + gap);
        prop_assert!(covered.open(opens_at));
    }
}

fn melee_duel(seed: u64) -> ScriptedHost {
    let mut host = ScriptedHost::new(test_config(), seed, Vec3::ZERO);
    host.players = vec![hostile(4, Vec3::new(60.0, 0.0, 0.0))];
    host
}

/// Open and close times of the first parry window in an undisturbed duel.
fn first_window(seed: u64) -> (TimeMs, TimeMs) {
    let mut host = melee_duel(seed);
    host.run_until(15_000);
    let open = host.times(|s| *s == Signal::Glow(true))[0];
    let close = host
        .times(|s| *s == Signal::Glow(false))
        .into_iter()
        .find(|&t| t > open)
        .unwrap();
    (open, close)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn parry_inside_window_kills(seed in 0u64..8, fraction in 0.0f64..1.0) {
        let (open, close) = first_window(seed);
        let at = open + ((close - open - 1) as f64 * fraction) as TimeMs;
        prop_assert!(at >= open && at < close);

        let mut host = melee_duel(seed);
        host.run_until(at);
        prop_assert!(host.agent().parry_window().is_open());
        host.deliver(AgentEvent::ParryAttempt);
        prop_assert!(host.agent().is_dead());
    }

    #[test]
    fn parry_after_close_is_ignored(seed in 0u64..8, late in 0u64..100) {
        let (_, close) = first_window(seed);
        let mut host = melee_duel(seed);
        host.run_until(close + late);
        host.deliver(AgentEvent::ParryAttempt);
        prop_assert!(!host.agent().is_dead());
    }
}
