//! Error types for the harness crate.

/// Errors that can occur while driving a verification run.
///
/// A screen mismatch is not an error -- it feeds the retry loop and, on
/// exhaustion, the attempt's `false` verdict. Errors here are faults of
/// the run itself.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// An error from the terminal layer (spawn, resize, PTY I/O).
    #[error("terminal error: {0}")]
    Term(#[from] muxvet_types::MuxvetError),
    /// Filesystem or process I/O around the run directory.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// `-V` output with no recognizable version in it.
    #[error("cannot parse tmux version from {output:?}")]
    Version {
        /// The raw `-V` output.
        output: String,
    },
    /// Control file or socket bookkeeping failed.
    #[error("control setup failed at {path}: {reason}")]
    Control {
        /// The path being prepared.
        path: String,
        /// What went wrong.
        reason: String,
    },
    /// The spawned process survived teardown.
    ///
    /// Raised after kill + bounded join; outranks whatever verdict the
    /// scenarios produced, since a leaked server poisons later runs.
    #[error("process {pid} is still alive after teardown")]
    ProcessLeak {
        /// PID of the surviving process.
        pid: u32,
    },
    /// A catch-all for other errors.
    #[error("{0}")]
    Other(String),
}
