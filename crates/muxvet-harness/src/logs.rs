//! Capture of server-side log files for failure diagnostics.
//!
//! tmux run with `-v` writes `*.log` files next to the socket. They are
//! only worth printing once the last outer attempt has failed, at which
//! point they are read out and removed so a later run starts clean.

use std::fs;
use std::io;
use std::path::PathBuf;

/// One captured log file.
#[derive(Debug, Clone)]
pub struct CapturedLog {
    /// File name, without the directory.
    pub name: String,
    /// Full file contents.
    pub contents: String,
}

impl CapturedLog {
    /// Render with the failure-dump layout: an 80-underscore rule, the
    /// file name, an 80-equals rule, then the contents.
    pub fn render(&self) -> String {
        format!(
            "{}\n{}:\n{}\n{}",
            "_".repeat(80),
            self.name,
            "=".repeat(80),
            self.contents
        )
    }
}

/// Source of diagnostic logs collected after a failed final attempt.
pub trait LogCapture {
    /// Collect (and consume) whatever logs are available.
    fn collect(&self) -> io::Result<Vec<CapturedLog>>;
}

/// Collects `*.log` files from a directory, removing each as it is read.
#[derive(Debug, Clone)]
pub struct DirLogCapture {
    dir: PathBuf,
}

impl DirLogCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LogCapture for DirLogCapture {
    fn collect(&self) -> io::Result<Vec<CapturedLog>> {
        let mut logs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("log") {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let contents = fs::read_to_string(&path)?;
            fs::remove_file(&path)?;
            logs.push(CapturedLog { name, contents });
        }
        // Directory iteration order is arbitrary; keep output stable.
        logs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(logs)
    }
}
