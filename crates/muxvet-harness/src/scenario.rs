//! Scenario steps: how to drive a session and what to expect afterwards.

use std::time::Duration;

use muxvet_types::Dimensions;

use crate::fixtures::{ExpectedRow, Versioned};

/// Preparation applied to the session before a step's expectation is
/// sampled.
#[derive(Debug, Clone)]
pub enum Prepare {
    /// Let the session settle for the given time.
    Idle(Duration),
    /// Resize the terminal, then settle.
    Resize {
        /// The new terminal size.
        dims: Dimensions,
        /// Settle time after the resize.
        settle: Duration,
    },
}

/// One verification step. The harness prepares the session, then compares
/// the bottom row against the version-selected fixture with retries.
#[derive(Debug, Clone)]
pub struct ScenarioStep {
    /// Step name, used in logs and failure output.
    pub name: String,
    /// How to drive the session before sampling.
    pub prepare: Prepare,
    /// Version-gated expected rendering of the bottom row.
    pub expected: Versioned<ExpectedRow>,
}

impl ScenarioStep {
    pub fn new(
        name: impl Into<String>,
        prepare: Prepare,
        expected: Versioned<ExpectedRow>,
    ) -> Self {
        Self {
            name: name.into(),
            prepare,
            expected,
        }
    }
}
