//! muxvet -- verify a status-line renderer inside a real tmux.
//!
//! Spawns tmux in a headless terminal, lets the renderer draw, and checks
//! the bottom row, character by character and style by style, against
//! version-gated fixtures. Exits 0 when a whole run passes, 1 otherwise.

mod config;
mod envmap;
mod scenarios;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use muxvet_harness::{DirLogCapture, HarnessConfig, TmuxHarness};

#[derive(Parser, Debug)]
#[command(name = "muxvet", version, about = "tmux status-line verification")]
struct Cli {
    /// Path to the run file
    #[arg(long, default_value = "muxvet.toml")]
    config: PathBuf,

    /// Override the tmux binary under test
    #[arg(long)]
    tmux: Option<PathBuf>,

    /// Override the whole-run retry budget
    #[arg(long)]
    retries: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut run = config::load_run_file(&cli.config)?;
    if let Some(retries) = cli.retries {
        run.outer_retries = retries;
    }

    let tmux = cli.tmux.unwrap_or_else(|| run.tmux());
    let env = envmap::assemble(&run)?;

    let harness_config = HarnessConfig {
        tmux,
        run_dir: run.run_dir.clone(),
        source_conf: run.source_conf.clone(),
        env,
        dims: run.dims(),
        windows: run.windows,
        window_command: run.window_command.clone(),
        compare_attempts: run.compare_attempts,
        compare_delay: run.compare_delay(),
        outer_retries: run.outer_retries,
        join_timeout: run.join_timeout(),
    };

    let harness = TmuxHarness::new(harness_config, |_version, dims| {
        scenarios::default_steps(dims)
    })
    .with_log_capture(DirLogCapture::new(run.run_dir.clone()));

    let passed = harness.run()?;
    info!(passed, "run finished");
    process::exit(if passed { 0 } else { 1 });
}
