//! Configuration types for the `muxvet.toml` run file.
//!
//! The run file pins down everything a verification run needs: where the
//! fixture binaries live, how large the emulated terminal is, the retry
//! budgets, and the exact environment handed to tmux. Nothing ambient is
//! inherited unless it is listed under `passthrough`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use muxvet_types::Dimensions;

/// One renderer theme override.
///
/// Overrides are joined into a single environment variable as
/// `key=<compact json>` pairs separated by `;`, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeOverride {
    /// Dotted theme path, e.g. `default.segment_data.s1.contents`.
    pub key: String,
    /// Replacement value, re-encoded as JSON for the renderer.
    pub value: toml::Value,
}

/// Top-level structure of a `muxvet.toml` run file.
///
/// ```toml
/// run_dir = "tests/vterm-tmux"
/// source_conf = "bindings/tmux/statusline.conf"
/// rows = 50
/// cols = 200
/// passthrough = ["LD_LIBRARY_PATH"]
///
/// [env]
/// STATUSLINE_CONFIG_PATHS = "tests/fixtures/config"
///
/// [[overrides]]
/// key = "default.segment_data.s1.contents"
/// value = "S1 string here"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory the run works in: control socket, control file, captured logs.
    pub run_dir: PathBuf,

    /// Fixture binaries directory, handed to the child as its entire PATH.
    /// Defaults to `<run_dir>/path`.
    pub bin_dir: Option<PathBuf>,

    /// Bundled terminfo database, handed to the child as TERMINFO.
    /// Defaults to `<run_dir>/terminfo`.
    pub terminfo_dir: Option<PathBuf>,

    /// Shell reported through SHELL. Defaults to `<bin dir>/bash`.
    pub shell: Option<PathBuf>,

    /// Terminal type reported through TERM.
    pub term: String,

    /// Configuration file the generated control file sources.
    pub source_conf: PathBuf,

    /// Initial terminal rows.
    pub rows: u16,

    /// Initial terminal columns.
    pub cols: u16,

    /// Windows opened at spawn.
    pub windows: u32,

    /// Command run in every window.
    pub window_command: String,

    /// Samples taken per step before it is declared failed.
    pub compare_attempts: u32,

    /// Pause between samples, in milliseconds.
    pub compare_delay_ms: u64,

    /// Whole-run retries after the first failed attempt.
    pub outer_retries: u32,

    /// Upper bound on teardown, in seconds.
    pub join_timeout_secs: u64,

    /// Extra environment entries for the child.
    pub env: BTreeMap<String, String>,

    /// Ambient variables copied into the child. A listed variable is always
    /// set, with an empty value when absent from our own environment.
    pub passthrough: Vec<String>,

    /// Variable that receives the joined theme overrides, when set.
    pub overrides_var: Option<String>,

    /// Theme overrides, applied in declaration order.
    pub overrides: Vec<ThemeOverride>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_dir: PathBuf::from("tests/vterm-tmux"),
            bin_dir: None,
            terminfo_dir: None,
            shell: None,
            term: "st-256color".to_string(),
            source_conf: PathBuf::new(),
            rows: 50,
            cols: 200,
            windows: 3,
            window_command: "bash --norc --noprofile -i".to_string(),
            compare_attempts: 3,
            compare_delay_ms: 2_000,
            outer_retries: 3,
            join_timeout_secs: 10,
            env: BTreeMap::new(),
            passthrough: Vec::new(),
            overrides_var: None,
            overrides: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Initial terminal size.
    pub fn dims(&self) -> Dimensions {
        Dimensions::new(self.rows, self.cols)
    }

    /// Fixture binaries directory.
    pub fn bin_dir(&self) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.clone(),
            None => self.run_dir.join("path"),
        }
    }

    /// Bundled terminfo database.
    pub fn terminfo_dir(&self) -> PathBuf {
        match &self.terminfo_dir {
            Some(dir) => dir.clone(),
            None => self.run_dir.join("terminfo"),
        }
    }

    /// Shell reported to the child.
    pub fn shell(&self) -> PathBuf {
        match &self.shell {
            Some(shell) => shell.clone(),
            None => self.bin_dir().join("bash"),
        }
    }

    /// tmux binary under test.
    pub fn tmux(&self) -> PathBuf {
        self.bin_dir().join("tmux")
    }

    pub fn compare_delay(&self) -> Duration {
        Duration::from_millis(self.compare_delay_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }
}

/// Parse a run file from a string.
pub fn parse_run_file(content: &str) -> Result<RunConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load a run file from a path.
pub fn load_run_file(path: &Path) -> anyhow::Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_run_file(&content).with_context(|| format!("failed to parse {}", path.display()))
}
