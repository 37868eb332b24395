//! Headless terminal control for screen-comparison testing.
//!
//! This crate provides the process-facing half of muxvet:
//!
//! - [`pty`]: spawn a child in a pseudo-terminal with an explicit
//!   environment and an initial window size, read/write the master side,
//!   resize, and reap.
//! - [`grid`]: a vt100-backed emulated screen capturing styled cells.
//! - [`palette`]: indexed-to-RGB color resolution.
//! - [`classify`]: render rows as labeled runs of constant style.
//! - [`session`]: ties the above together with a background output pump.

pub mod classify;
pub mod grid;
pub mod palette;
pub mod pty;
pub mod session;

pub use grid::{Cell, TerminalGrid};
pub use pty::{PtyProcess, PtyRead};
pub use session::{SessionOptions, TerminalSession};
