//! Headless arena runner for the stalker agent.
//!
//! The runner places one agent in a scripted arena and plays every
//! collaborator around it, so its behaviour can be inspected without a
//! game engine:
//!
//! - **Scenario testing**: scripted damage, parries and orders at fixed times
//! - **CI verification**: repeated runs must end in the same state hash
//!
//! # Protocol
//!
//! - **stdout**: JSON lines (`ready`, `tick`, `attack`, `parry_window`,
//!   `death`, `finished`)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] for the line formats.
//!
//! # Example
//!
//! ```bash
//! # Run the built-in duel with per-tick state
//! cargo run -p stalker_headless -- run --scenario duel --auto-state
//!
//! # Verify determinism
//! cargo run -p stalker_headless -- verify --scenario scenarios/duel.ron --runs 5
//! ```

pub mod arena;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use arena::Arena;
pub use protocol::{Response, TickSummary};
pub use runner::{run_scenario, verify_determinism, RunOptions, RunSummary, VerifyReport};
pub use scenario::{
    decode_raw, PlayerSetup, Scenario, ScenarioError, ScriptAction, ScriptedSignal,
};
