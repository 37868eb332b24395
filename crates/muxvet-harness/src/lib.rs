//! Screen-verification harness for status lines rendered inside tmux.
//!
//! This crate drives a real tmux through a headless terminal session,
//! samples the rendered bottom row as labeled style runs, and compares it
//! against version-gated fixtures with retries at two levels: per-sample
//! (redraw jitter) and per-run (host flakiness).
//!
//! # Overview
//!
//! - [`TmuxHarness`]: spawn/verify/teardown cycles with outer retries
//! - [`ScenarioStep`]: prepare (idle or resize) plus a gated expectation
//! - [`Versioned`]: baseline fixture plus version-threshold overrides
//! - [`compare`]: retrying row comparison producing a [`CompareOutcome`]
//! - [`LogCapture`]: server-log collection for final-failure diagnostics
//! - [`HarnessError`]: faults of the run (a mismatch is a verdict, not
//!   an error)
//!
//! # Example
//!
//! ```no_run
//! use muxvet_harness::{HarnessConfig, TmuxHarness};
//!
//! let harness = TmuxHarness::new(HarnessConfig::default(), |_version, _dims| Vec::new());
//! let passed = harness.run().unwrap();
//! assert!(passed);
//! ```

pub mod compare;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod logs;
pub mod scenario;

pub use compare::{compare, CompareOutcome, Report};
pub use error::HarnessError;
pub use fixtures::{ExpectedRow, Versioned};
pub use harness::{HarnessConfig, ScenarioBuilder, TmuxHarness};
pub use logs::{CapturedLog, DirLogCapture, LogCapture};
pub use scenario::{Prepare, ScenarioStep};
