//! Arena runs end to end.

use std::io::Write;
use std::path::PathBuf;

use stalker_core::prelude::*;
use stalker_headless::{
    run_scenario, Arena, PlayerSetup, Response, RunOptions, Scenario, ScenarioError, ScriptAction,
    ScriptedSignal,
};
use stalker_test_utils::determinism::{find_first_divergence, verify_determinism};

fn shipped(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

fn lines(scenario: &Scenario, seconds: u64) -> Vec<Response> {
    let mut out = Vec::new();
    run_scenario(
        scenario,
        RunOptions {
            seconds: Some(seconds),
            auto_state: true,
        },
        |line| out.push(line.clone()),
    )
    .unwrap();
    out
}

fn close_duel() -> Scenario {
    Scenario {
        players: vec![PlayerSetup {
            slot: 1,
            team: Team::Blue,
            weapon: WeaponSlot::Melee,
            position: Vec3::new(100.0, 0.0, 0.0),
            alive: true,
        }],
        script: Vec::new(),
        ..Scenario::duel()
    }
}

#[test]
fn shipped_scenario_loads_and_runs() {
    let scenario = Scenario::load(shipped("duel.ron")).unwrap();
    assert_eq!(scenario.players.len(), 3);
    let out = lines(&scenario, 10);
    assert!(matches!(out.first(), Some(Response::Ready { .. })));
    assert!(matches!(out.last(), Some(Response::Finished { .. })));
}

#[test]
fn resolve_accepts_builtin_names_and_files() {
    assert_eq!(Scenario::resolve("patrol").unwrap().name, "patrol");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"(name: "tmp", spawn: (x: 0.0, y: 0.0, z: 0.0), duration_secs: 2)"#
    )
    .unwrap();
    let scenario = Scenario::resolve(file.path().to_str().unwrap()).unwrap();
    assert_eq!(scenario.name, "tmp");
    assert!(scenario.players.is_empty());
}

#[test]
fn invalid_agent_config_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"(name: "bad", spawn: (x: 0.0, y: 0.0, z: 0.0), agent: (tick_ms: 0))"#
    )
    .unwrap();
    let err = Scenario::load(file.path()).unwrap_err();
    assert!(matches!(err, ScenarioError::Agent(_)));
}

#[test]
fn attacks_reported_with_distinct_consecutive_kinds() {
    let out = lines(&close_duel(), 20);
    let kinds: Vec<&str> = out
        .iter()
        .filter_map(|l| match l {
            Response::Attack { kind, .. } => Some(kind.as_str()),
            _ => None,
        })
        .collect();
    assert!(kinds.len() >= 3, "only {} attacks", kinds.len());
    assert!(kinds.windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn parry_windows_alternate() {
    let out = lines(&close_duel(), 30);
    let toggles: Vec<bool> = out
        .iter()
        .filter_map(|l| match l {
            Response::ParryWindow { open, .. } => Some(*open),
            _ => None,
        })
        .collect();
    assert!(!toggles.is_empty());
    assert!(toggles.windows(2).all(|w| w[0] != w[1]));
    assert!(toggles[0]);
}

#[test]
fn scripted_parry_during_open_window_kills() {
    // Find the first window in a clean run, then replay with a parry
    // scripted inside it.
    let out = lines(&close_duel(), 30);
    let opened = out
        .iter()
        .find_map(|l| match l {
            Response::ParryWindow {
                time_ms,
                open: true,
            } => Some(*time_ms),
            _ => None,
        })
        .expect("a parry window");

    let mut scenario = close_duel();
    scenario.script.push(ScriptedSignal {
        at_ms: opened + 100,
        action: ScriptAction::Parry,
    });
    let out = lines(&scenario, 30);
    assert!(out.iter().any(
        |l| matches!(l, Response::Death { time_ms } if *time_ms == opened + 100)
    ));
}

#[test]
fn tick_summaries_follow_damage() {
    let mut scenario = close_duel();
    scenario.script.push(ScriptedSignal {
        at_ms: 1000,
        action: ScriptAction::Damage(50),
    });
    let out = lines(&scenario, 2);
    let hp: Vec<u32> = out
        .iter()
        .filter_map(|l| match l {
            Response::Tick(summary) => Some(summary.hp),
            _ => None,
        })
        .collect();
    assert_eq!(hp.first(), Some(&450));
    assert_eq!(hp.last(), Some(&400));
}

#[test]
fn arena_steps_are_deterministic() {
    let setup = || Arena::new(&close_duel(), false).unwrap();
    let step = |arena: &mut Arena| arena.step();
    let hash = |arena: &Arena| arena.state_hash();

    verify_determinism(3, 200, setup, step, hash).assert_deterministic();
    assert_eq!(find_first_divergence(setup, 200, step, hash), None);
}
