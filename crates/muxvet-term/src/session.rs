//! Live terminal sessions.
//!
//! [`TerminalSession`] wraps a [`PtyProcess`] with a shared
//! [`TerminalGrid`] and a background pump thread, so the emulated screen
//! tracks child output continuously while callers query rendered rows,
//! resize the terminal, or tear the child down.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use muxvet_types::{AttributeMap, Dimensions, MuxvetError};

use crate::classify;
use crate::grid::TerminalGrid;
use crate::pty::{PtyProcess, PtyRead};

/// Options for spawning a terminal session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// The command to run.
    pub command: String,
    /// Arguments to pass to the command.
    pub args: Vec<String>,
    /// Working directory for the child process.
    pub working_dir: PathBuf,
    /// The child's complete environment; nothing is inherited.
    pub env: Vec<(String, String)>,
    /// Terminal size (default: 24x80).
    pub dims: Dimensions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            working_dir: PathBuf::from("/tmp"),
            env: Vec::new(),
            dims: Dimensions::new(24, 80),
        }
    }
}

/// A child process in a PTY with a continuously updated emulated screen.
///
/// One pump thread is the only writer to the grid; queries snapshot under
/// the lock and classify outside it, so a slow comparison never stalls
/// output ingestion for long.
pub struct TerminalSession {
    pty: Arc<PtyProcess>,
    grid: Arc<Mutex<TerminalGrid>>,
    stop: Arc<AtomicBool>,
    pump: Option<JoinHandle<()>>,
}

impl TerminalSession {
    /// Spawn a command in a PTY and start pumping its output.
    pub fn spawn(opts: SessionOptions) -> Result<Self, MuxvetError> {
        let pty = Arc::new(PtyProcess::spawn(
            &opts.command,
            &opts.args,
            &opts.working_dir,
            &opts.env,
            opts.dims,
        )?);
        let grid = Arc::new(Mutex::new(TerminalGrid::new(opts.dims)));
        let stop = Arc::new(AtomicBool::new(false));

        let pump = {
            let pty = Arc::clone(&pty);
            let grid = Arc::clone(&grid);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("muxvet-pump".into())
                .spawn(move || pump_loop(&pty, &grid, &stop))
                .map_err(|e| MuxvetError::Spawn {
                    command: opts.command.clone(),
                    reason: format!("pump thread: {e}"),
                })?
        };

        debug!(command = %opts.command, dims = %opts.dims, pid = pty.pid(), "session spawned");
        Ok(Self {
            pty,
            grid,
            stop,
            pump: Some(pump),
        })
    }

    /// Current terminal dimensions.
    pub fn dims(&self) -> Dimensions {
        self.lock_grid().dims()
    }

    /// Resize the terminal.
    ///
    /// The kernel-side window change and the grid resize happen under one
    /// grid lock, so readers observe fully old or fully new dimensions,
    /// never a mix. On ioctl failure the grid is left untouched.
    pub fn resize(&self, dims: Dimensions) -> Result<(), MuxvetError> {
        let mut grid = self.lock_grid();
        self.pty.resize(dims)?;
        grid.resize(dims);
        debug!(dims = %dims, "session resized");
        Ok(())
    }

    /// Rendered text of one row as `{label:text}` runs.
    ///
    /// Returns the rendered row plus a copy of `seed` extended with any
    /// styles first seen here.
    pub fn row(&self, row: u16, seed: &AttributeMap) -> Result<(String, AttributeMap), MuxvetError> {
        let cells = self.lock_grid().snapshot_row(row)?;
        let mut attrs = seed.clone();
        let text = classify::highlight_row(&cells, &mut attrs);
        Ok((text, attrs))
    }

    /// Rendered text of the whole screen, rows joined with `\n`, one
    /// attribute map threaded across all rows.
    pub fn screen(&self, seed: &AttributeMap) -> Result<(String, AttributeMap), MuxvetError> {
        let rows = self.lock_grid().snapshot();
        let mut attrs = seed.clone();
        let text = classify::highlight_screen(&rows, &mut attrs);
        Ok((text, attrs))
    }

    /// Write text to the child's stdin.
    pub fn send_text(&self, text: &str) -> Result<(), MuxvetError> {
        self.pty.write_all(text.as_bytes())
    }

    /// Check if the child process is still running.
    pub fn is_alive(&self) -> bool {
        self.pty.is_alive()
    }

    /// The child's process ID.
    pub fn pid(&self) -> u32 {
        self.pty.pid()
    }

    /// Stop pumping and SIGKILL the child. Idempotent.
    ///
    /// Never takes the grid lock, so it cannot deadlock with an in-flight
    /// query.
    pub fn kill(&self) -> Result<(), MuxvetError> {
        self.stop.store(true, Ordering::SeqCst);
        self.pty.kill()
    }

    /// Bounded wait for the child and the pump thread to finish.
    ///
    /// Reaps the child (so a kill does not leave a zombie) and waits for
    /// the pump to notice the stop flag. Returns `true` if either is
    /// still live when the deadline passes.
    pub fn join(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.stop.store(true, Ordering::SeqCst);

        let mut child_gone = false;
        loop {
            match self.pty.try_reap() {
                Ok(Some(code)) => {
                    debug!(code, "child reaped");
                    child_gone = true;
                    break;
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    warn!(error = %e, "join: waitpid failed");
                    break;
                }
            }
        }

        let mut pump_done = true;
        if let Some(handle) = self.pump.take() {
            // The pump exits within one poll interval of the stop flag.
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                pump_done = false;
                self.pump = Some(handle);
            }
        }

        let child_alive = !child_gone && self.pty.is_alive();
        child_alive || !pump_done
    }

    fn lock_grid(&self) -> MutexGuard<'_, TerminalGrid> {
        // A poisoned lock only means the pump panicked mid-ingest; the
        // grid itself is still a valid screen.
        self.grid.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Collect the pump if it already exited; otherwise detach rather
        // than block a destructor. PtyProcess::drop handles the child.
        if let Some(handle) = self.pump.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

fn pump_loop(pty: &PtyProcess, grid: &Mutex<TerminalGrid>, stop: &AtomicBool) {
    let mut buf = [0u8; 4096];
    while !stop.load(Ordering::SeqCst) {
        match pty.poll_readable(100) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "pump: poll failed");
                break;
            }
        }
        match pty.read(&mut buf) {
            Ok(PtyRead::Data(n)) => {
                let mut grid = grid.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                grid.ingest(&buf[..n]);
            }
            Ok(PtyRead::WouldBlock) => {}
            Ok(PtyRead::Eof) => {
                debug!("pump: child closed the terminal");
                break;
            }
            Err(e) => {
                warn!(error = %e, "pump: read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muxvet_types::{Rgb, StyleKey};

    fn spawn_sh(script: &str, dims: Dimensions) -> TerminalSession {
        TerminalSession::spawn(SessionOptions {
            command: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            dims,
            ..SessionOptions::default()
        })
        .expect("spawn failed")
    }

    #[test]
    fn echo_output_lands_on_the_grid() {
        let session = TerminalSession::spawn(SessionOptions {
            command: "/bin/echo".to_string(),
            args: vec!["hello".to_string()],
            ..SessionOptions::default()
        })
        .expect("spawn failed");

        std::thread::sleep(Duration::from_millis(300));
        let (row, _) = session.row(0, &AttributeMap::new()).expect("row failed");
        assert!(
            row.starts_with("{1:hello"),
            "expected first row to start with hello run: {row:?}"
        );
    }

    #[test]
    fn colored_output_gets_seeded_label() {
        let session = spawn_sh(
            "printf '\\033[32mok\\033[0m'; sleep 1",
            Dimensions::new(24, 80),
        );
        std::thread::sleep(Duration::from_millis(300));

        let green = StyleKey::new(Rgb(0, 224, 0), Rgb(0, 0, 0));
        let seed = AttributeMap::seeded([(green, "green")]);
        let (row, attrs) = session.row(0, &seed).expect("row failed");
        assert!(
            row.starts_with("{green:ok}{2:"),
            "expected seeded green run then an auto-labeled fill: {row:?}"
        );
        // The fill style was assigned the first free id after the seed.
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn resize_updates_dims() {
        let session = spawn_sh("sleep 2", Dimensions::new(24, 80));
        session.resize(Dimensions::new(30, 100)).expect("resize failed");
        assert_eq!(session.dims(), Dimensions::new(30, 100));
        let (row, _) = session.row(0, &AttributeMap::new()).expect("row failed");
        // One run of 100 blank columns.
        assert_eq!(row, format!("{{1:{}}}", " ".repeat(100)));
    }

    #[test]
    fn kill_then_join_leaves_nothing_running() {
        let mut session = spawn_sh("sleep 30", Dimensions::new(24, 80));
        assert!(session.is_alive());
        session.kill().expect("kill failed");
        let still_alive = session.join(Duration::from_secs(2));
        assert!(!still_alive, "child or pump still running after join");
        assert!(!session.is_alive());
    }

    #[test]
    fn join_after_natural_exit_is_quick() {
        let mut session = TerminalSession::spawn(SessionOptions {
            command: "/bin/echo".to_string(),
            args: vec!["bye".to_string()],
            ..SessionOptions::default()
        })
        .expect("spawn failed");

        std::thread::sleep(Duration::from_millis(200));
        let still_alive = session.join(Duration::from_secs(2));
        assert!(!still_alive);
    }

    #[test]
    fn row_out_of_range_is_an_error() {
        let session = spawn_sh("sleep 1", Dimensions::new(4, 20));
        let err = session.row(4, &AttributeMap::new()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
