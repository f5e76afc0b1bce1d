//! Error types for the agent controller.
//!
//! Errors are returned by parsing and solving functions. The agent's event
//! handlers absorb them locally and keep their previous state.

use thiserror::Error;

/// Result type alias using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;

/// Top-level error type for the agent controller.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A string-encoded boundary message could not be parsed.
    #[error("Malformed message '{input}': {reason}")]
    MalformedMessage {
        /// The offending input (truncated for long payloads).
        input: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Player slot outside the valid range.
    #[error("Invalid player slot: {0}")]
    InvalidPlayerSlot(u32),

    /// Range sensor index outside the reference set.
    #[error("Invalid range sensor index: {0}")]
    InvalidSensor(usize),

    /// Linear system is singular or too close to it to trust.
    #[error("Singular linear system: pivot {pivot:e} at column {column}")]
    SingularSystem {
        /// Column where elimination failed.
        column: usize,
        /// Magnitude of the best pivot found.
        pivot: f64,
    },

    /// Failed to parse a configuration document.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// Configuration values violate an invariant.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {message}")]
    ConfigRead {
        /// Path that failed to load.
        path: String,
        /// IO error message.
        message: String,
    },

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl AgentError {
    /// Build a [`AgentError::MalformedMessage`], truncating very long inputs.
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        const MAX_ECHO: usize = 64;
        let input = if input.len() > MAX_ECHO {
            let mut end = MAX_ECHO;
            while !input.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &input[..end])
        } else {
            input.to_string()
        };
        Self::MalformedMessage {
            input,
            reason: reason.into(),
        }
    }
}
