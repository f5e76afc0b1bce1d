//! Whole-scenario runs and determinism checks.
//!
//! All loops are bounded by the scenario duration. A run ends early once
//! the agent has been removed after its death sequence.

use tracing::{debug, info};

use stalker_core::prelude::*;
use std::result::Result;

use crate::arena::{Arena, PHYSICS_STEP_MS};
use crate::protocol::Response;
use crate::scenario::{Scenario, ScenarioError};

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Override the scenario's duration.
    pub seconds: Option<u64>,
    /// Emit a `tick` line after every agent tick.
    pub auto_state: bool,
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Arena time when the run stopped.
    pub time_ms: TimeMs,
    /// Final state hash.
    pub hash: u64,
    /// Whether the agent died.
    pub agent_died: bool,
}

/// Run `scenario`, handing every protocol line to `emit` as it appears.
pub fn run_scenario<F>(
    scenario: &Scenario,
    options: RunOptions,
    mut emit: F,
) -> Result<RunSummary, ScenarioError>
where
    F: FnMut(&Response),
{
    let duration_ms = options.seconds.unwrap_or(scenario.duration_secs) * 1000;
    let max_steps = duration_ms / PHYSICS_STEP_MS + 1;

    let mut arena = Arena::new(scenario, options.auto_state)?;
    for line in arena.take_responses() {
        emit(&line);
    }

    let mut steps = 0;
    while arena.now() < duration_ms && steps < max_steps {
        arena.step();
        steps += 1;
        for line in arena.take_responses() {
            emit(&line);
        }
        if arena.agent().is_removed() {
            debug!(at = arena.now(), "Agent removed, ending run");
            break;
        }
    }

    let hash = arena.finish();
    for line in arena.take_responses() {
        emit(&line);
    }

    let summary = RunSummary {
        time_ms: arena.now(),
        hash,
        agent_died: arena.agent().is_dead(),
    };
    info!(
        scenario = %scenario.name,
        time_ms = summary.time_ms,
        died = summary.agent_died,
        hash = format_args!("{hash:016x}"),
        "Run finished"
    );
    Ok(summary)
}

/// Hashes of repeated runs of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Final hash of each run.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// All runs ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run `scenario` `runs` times and collect the final hashes.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<VerifyReport, ScenarioError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let summary = run_scenario(scenario, RunOptions::default(), |_| {})?;
        debug!(run, hash = format_args!("{:016x}", summary.hash), "Verify run");
        hashes.push(summary.hash);
    }
    Ok(VerifyReport { hashes })
}
