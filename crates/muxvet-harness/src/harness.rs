//! Run orchestration: spawn tmux, execute scenario steps, tear down,
//! retry the whole run on failure.
//!
//! One outer attempt is a complete spawn/verify/teardown cycle with its
//! own control socket. Outer retries absorb host-level flakiness (slow
//! CI, cold caches); the inner retry in [`crate::compare`] absorbs redraw
//! jitter within a live session. Attempts are strictly sequential -- no
//! two attempts' servers ever coexist.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, info, warn};

use muxvet_term::{SessionOptions, TerminalSession};
use muxvet_types::{AttributeMap, Dimensions, Version};

use crate::compare::{self, CompareOutcome};
use crate::error::HarnessError;
use crate::logs::LogCapture;
use crate::scenario::{Prepare, ScenarioStep};

/// Parameters of a verification run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// The tmux executable to drive.
    pub tmux: PathBuf,
    /// Directory holding the control socket, control file, and logs.
    pub run_dir: PathBuf,
    /// The status-line integration configuration the control file sources.
    pub source_conf: PathBuf,
    /// The child's complete environment.
    pub env: Vec<(String, String)>,
    /// Initial terminal size.
    pub dims: Dimensions,
    /// Windows opened at spawn: one `new-session` plus `windows - 1`
    /// `new-window` commands.
    pub windows: u32,
    /// Command run in every window.
    pub window_command: String,
    /// Inner comparison attempts per step.
    pub compare_attempts: u32,
    /// Delay between inner comparison attempts.
    pub compare_delay: Duration,
    /// Whole-run retries after the first attempt.
    pub outer_retries: u32,
    /// Bound on the teardown join.
    pub join_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tmux: PathBuf::from("tmux"),
            run_dir: PathBuf::from("."),
            source_conf: PathBuf::new(),
            env: Vec::new(),
            dims: Dimensions::new(50, 200),
            windows: 3,
            window_command: "bash --norc --noprofile -i".to_string(),
            compare_attempts: 3,
            compare_delay: Duration::from_secs(2),
            outer_retries: 3,
            join_timeout: Duration::from_secs(10),
        }
    }
}

/// Builds scenario steps once the target version and initial size are
/// known. Fixtures that depend on the initial width (blank fills) are
/// computed here, before any resize.
pub type ScenarioBuilder = dyn Fn(Version, Dimensions) -> Vec<ScenarioStep>;

/// Drives complete verification runs against a tmux binary.
pub struct TmuxHarness {
    config: HarnessConfig,
    scenarios: Box<ScenarioBuilder>,
    log_capture: Option<Box<dyn LogCapture>>,
}

impl TmuxHarness {
    pub fn new(
        config: HarnessConfig,
        scenarios: impl Fn(Version, Dimensions) -> Vec<ScenarioStep> + 'static,
    ) -> Self {
        Self {
            config,
            scenarios: Box::new(scenarios),
            log_capture: None,
        }
    }

    /// Attach a log source dumped when the final attempt fails.
    pub fn with_log_capture(mut self, capture: impl LogCapture + 'static) -> Self {
        self.log_capture = Some(Box::new(capture));
        self
    }

    /// Run until a whole attempt passes or the retry budget is spent.
    ///
    /// Returns `Ok(true)` on a passing attempt, `Ok(false)` on
    /// exhaustion. Errors are faults of the run itself (spawn failures,
    /// process leaks), not verdicts.
    pub fn run(&self) -> Result<bool, HarnessError> {
        for remaining in (0..=self.config.outer_retries).rev() {
            if self.run_attempt(remaining)? {
                return Ok(true);
            }
            if remaining > 0 {
                info!(remaining, "attempt failed; retrying with a fresh socket");
            }
        }
        Ok(false)
    }

    /// One spawn/verify/teardown cycle. `remaining` is the number of
    /// retries left after this attempt and is embedded in the socket name.
    fn run_attempt(&self, remaining: u32) -> Result<bool, HarnessError> {
        let socket_path = self.socket_path(remaining)?;
        let control_file = self.write_control_file()?;
        let version = self.detect_version()?;
        info!(
            version = %version,
            socket = %socket_path.display(),
            "starting attempt"
        );

        let steps = (self.scenarios)(version, self.config.dims);
        let mut session = TerminalSession::spawn(SessionOptions {
            command: self.config.tmux.to_string_lossy().into_owned(),
            args: self.tmux_args(&socket_path, &control_file),
            working_dir: self.config.run_dir.clone(),
            env: self.config.env.clone(),
            dims: self.config.dims,
        })?;

        let verdict = self.run_scenarios(&session, &steps, version, remaining == 0);
        let cleanup = self.teardown(&mut session, &socket_path);
        // A leaked process poisons later attempts; it outranks the verdict.
        cleanup?;
        verdict
    }

    /// Execute every step in order and AND the verdicts.
    ///
    /// Later steps still run after a failure so one pass produces every
    /// step's diagnostics.
    pub fn run_scenarios(
        &self,
        session: &TerminalSession,
        steps: &[ScenarioStep],
        version: Version,
        last_attempt: bool,
    ) -> Result<bool, HarnessError> {
        let mut all_passed = true;
        for step in steps {
            info!(step = %step.name, "running step");
            match &step.prepare {
                Prepare::Idle(settle) => std::thread::sleep(*settle),
                Prepare::Resize { dims, settle } => {
                    session.resize(*dims)?;
                    std::thread::sleep(*settle);
                }
            }

            let expected = step.expected.select(version);
            let mut sample_row = |seed: &AttributeMap| {
                let bottom = session.dims().rows.saturating_sub(1);
                session.row(bottom, seed).map_err(HarnessError::from)
            };
            let mut sample_screen =
                |seed: &AttributeMap| session.screen(seed).map_err(HarnessError::from);
            let mut delay = || std::thread::sleep(self.config.compare_delay);

            let outcome = compare::compare(
                expected,
                self.config.compare_attempts,
                &mut sample_row,
                &mut sample_screen,
                &mut delay,
            )?;
            match outcome {
                CompareOutcome::Pass { attempts_used } => {
                    info!(step = %step.name, attempts_used, "step passed");
                }
                CompareOutcome::Fail { report } => {
                    all_passed = false;
                    warn!(step = %step.name, "step failed");
                    println!("{}", report.render());
                    if last_attempt {
                        self.dump_logs();
                    }
                }
            }
        }
        Ok(all_passed)
    }

    /// Absolute control socket path for this attempt, with any stale
    /// file from a previous failed run removed.
    fn socket_path(&self, remaining: u32) -> Result<PathBuf, HarnessError> {
        let path = absolutize(self.config.run_dir.join(format!("tmux-socket-{remaining}")))?;
        if path.exists() {
            debug!(socket = %path.display(), "removing stale socket");
            fs::remove_file(&path).map_err(|e| HarnessError::Control {
                path: path.display().to_string(),
                reason: format!("cannot remove stale socket: {e}"),
            })?;
        }
        Ok(path)
    }

    /// Write the one-line control file sourcing the integration conf.
    /// Rewritten fresh for every attempt.
    fn write_control_file(&self) -> Result<PathBuf, HarnessError> {
        let source = absolutize(self.config.source_conf.clone())?;
        let escaped = source
            .display()
            .to_string()
            .replace('\\', "\\\\")
            .replace('"', "\\\"");
        let control = absolutize(self.config.run_dir.join("tmux.conf"))?;
        fs::write(&control, format!("source \"{escaped}\"\n")).map_err(|e| {
            HarnessError::Control {
                path: control.display().to_string(),
                reason: format!("cannot write control file: {e}"),
            }
        })?;
        Ok(control)
    }

    /// Run `tmux -V` under the harness environment and parse the version.
    fn detect_version(&self) -> Result<Version, HarnessError> {
        let output = Command::new(&self.config.tmux)
            .arg("-V")
            .env_clear()
            .envs(self.config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.config.run_dir)
            .output()?;
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Version::from_tool_output(&text).ok_or(HarnessError::Version { output: text })
    }

    fn tmux_args(&self, socket: &Path, control_file: &Path) -> Vec<String> {
        let mut args = vec![
            // Full socket path: the run must not touch the user's server.
            "-S".to_string(),
            socket.display().to_string(),
            // Force 256-color mode.
            "-2".to_string(),
            // Verbose server logs, collected on final failure.
            "-v".to_string(),
            "-f".to_string(),
            control_file.display().to_string(),
        ];
        args.push("new-session".to_string());
        args.push(self.config.window_command.clone());
        args.push(";".to_string());
        for _ in 1..self.config.windows.max(1) {
            args.push("new-window".to_string());
            args.push(self.config.window_command.clone());
            args.push(";".to_string());
        }
        args
    }

    /// Unconditional teardown: ask the server to quit over its own
    /// socket, then kill and reap the client, then clear the socket path.
    fn teardown(
        &self,
        session: &mut TerminalSession,
        socket: &Path,
    ) -> Result<(), HarnessError> {
        let kill_server = Command::new(&self.config.tmux)
            .arg("-S")
            .arg(socket)
            .arg("kill-server")
            .env_clear()
            .envs(self.config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.config.run_dir)
            .status();
        match kill_server {
            Ok(status) if status.success() => debug!("kill-server succeeded"),
            Ok(status) => warn!(%status, "kill-server exited nonzero"),
            Err(e) => warn!(error = %e, "kill-server could not run"),
        }

        if let Err(e) = session.kill() {
            warn!(error = %e, "kill failed");
        }
        if session.join(self.config.join_timeout) {
            return Err(HarnessError::ProcessLeak {
                pid: session.pid(),
            });
        }

        if socket.exists() {
            if let Err(e) = fs::remove_file(socket) {
                warn!(socket = %socket.display(), error = %e, "cannot remove socket");
            }
        }
        Ok(())
    }

    fn dump_logs(&self) {
        let Some(capture) = &self.log_capture else {
            return;
        };
        match capture.collect() {
            Ok(logs) => {
                for log in logs {
                    println!("{}", log.render());
                }
            }
            Err(e) => warn!(error = %e, "log capture failed"),
        }
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf, HarnessError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
