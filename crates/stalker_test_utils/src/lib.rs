//! # Stalker Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixtures (reference cube, hostile players)
//! - A scripted host that answers sensors, traces and path requests
//! - Determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
