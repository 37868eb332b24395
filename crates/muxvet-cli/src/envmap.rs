//! Child environment assembly.
//!
//! The harness hands tmux an explicit environment rather than inheriting
//! ours, so a run behaves the same on a developer laptop and in CI. The
//! map is built in layers: terminal identity first, then the run file's
//! `[env]` table, then the joined theme overrides, then passthrough keys.
//! Later layers replace earlier entries with the same key.

use anyhow::Context;

use crate::config::{RunConfig, ThemeOverride};

/// Build the complete environment for the tmux child and the helper
/// commands (version probe, `kill-server`).
pub fn assemble(config: &RunConfig) -> anyhow::Result<Vec<(String, String)>> {
    let mut env: Vec<(String, String)> = Vec::new();

    upsert(&mut env, "TERMINFO", config.terminfo_dir().display().to_string());
    upsert(&mut env, "TERM", config.term.clone());
    upsert(&mut env, "PATH", config.bin_dir().display().to_string());
    upsert(&mut env, "SHELL", config.shell().display().to_string());

    for (key, value) in &config.env {
        upsert(&mut env, key, value.clone());
    }

    if let Some(var) = &config.overrides_var {
        upsert(&mut env, var, render_overrides(&config.overrides)?);
    }

    // Passthrough keys are always present so the child never falls back to
    // its own defaults; an unset variable comes through as empty.
    for key in &config.passthrough {
        let value = std::env::var(key).unwrap_or_default();
        upsert(&mut env, key, value);
    }

    Ok(env)
}

fn upsert(env: &mut Vec<(String, String)>, key: &str, value: String) {
    match env.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => env.push((key.to_string(), value)),
    }
}

/// `;`-joined `key=<compact json>` pairs in declaration order.
fn render_overrides(overrides: &[ThemeOverride]) -> anyhow::Result<String> {
    let mut parts = Vec::with_capacity(overrides.len());
    for entry in overrides {
        let json = serde_json::to_string(&entry.value)
            .with_context(|| format!("failed to encode override {:?}", entry.key))?;
        parts.push(format!("{}={json}", entry.key));
    }
    Ok(parts.join(";"))
}
