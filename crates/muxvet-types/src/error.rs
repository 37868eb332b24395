//! Error types shared across the muxvet crates.

/// Errors from the process-driving layer.
///
/// `Spawn`, `Resize`, and `RowRange` are fatal for the attempt that hits
/// them; `Pty` covers I/O on the master side of an established session.
#[derive(Debug, thiserror::Error)]
pub enum MuxvetError {
    /// PTY allocation or process creation failed.
    #[error("failed to spawn {command}: {reason}")]
    Spawn {
        /// The command that was being spawned.
        command: String,
        /// What went wrong (openpty, fork, exec setup).
        reason: String,
    },

    /// Propagating a new window size to the child failed.
    #[error("resize to {rows}x{cols} failed: {reason}")]
    Resize {
        rows: u16,
        cols: u16,
        /// The underlying ioctl failure.
        reason: String,
    },

    /// A row index outside the current grid was requested.
    #[error("row {row} out of range for a {rows}-row grid")]
    RowRange { row: u16, rows: u16 },

    /// I/O on the PTY master failed.
    #[error("pty error: {0}")]
    Pty(String),
}
