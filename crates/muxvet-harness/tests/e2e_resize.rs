//! End-to-end verification run against a WINCH-aware stand-in for tmux.
//!
//! The stand-in is a shell script that answers `-V`, accepts the
//! kill-server invocation, and otherwise draws a three-segment status
//! line on the bottom row, redrawing whenever the window size changes.
//! This exercises the whole path hermetically: spawn, output pump, run
//! classification, fixture selection, retrying comparison, resize
//! propagation, and teardown.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use muxvet_harness::{ExpectedRow, HarnessConfig, Prepare, ScenarioStep, TmuxHarness, Versioned};
use muxvet_types::{AttributeMap, Dimensions, Rgb, StyleKey, Version};

const FAKE_TMUX: &str = r#"#!/bin/sh
case "$1" in
    -V) echo "tmux 2.0"; exit 0;;
esac
for arg in "$@"; do
    if [ "$arg" = "kill-server" ]; then
        exit 0
    fi
done

draw() {
    set -- $(stty size)
    rows=$1
    cols=$2
    fill=$((cols - 8))
    spaces=''
    n=0
    while [ "$n" -lt "$fill" ]; do
        spaces="$spaces "
        n=$((n + 1))
    done
    printf '\033[%s;1H' "$rows"
    printf '\033[38;2;0;0;0m\033[48;2;0;224;0m S2 '
    printf '\033[38;2;255;255;255m\033[48;2;11;11;11m%s' "$spaces"
    printf '\033[38;2;199;199;199m\033[48;2;88;88;88m S1 '
    printf '\033[0m'
}

trap draw WINCH
draw
n=0
while [ "$n" -lt 600 ]; do
    sleep 0.1
    n=$((n + 1))
done
"#;

fn write_fake_tmux(dir: &Path) -> PathBuf {
    let path = dir.join("tmux");
    fs::write(&path, FAKE_TMUX).expect("should write fake tmux");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("should mark fake tmux executable");
    path
}

fn status_attrs() -> AttributeMap {
    AttributeMap::seeded([
        (StyleKey::new(Rgb(0, 0, 0), Rgb(0, 224, 0)), "lead"),
        (StyleKey::new(Rgb(255, 255, 255), Rgb(11, 11, 11)), "bg"),
        (StyleKey::new(Rgb(199, 199, 199), Rgb(88, 88, 88)), "cwd"),
    ])
}

/// The stand-in's bottom row at a given width: two labeled segments
/// around a fixed-width blank fill.
fn status_row(cols: u16) -> String {
    format!(
        "{{lead: S2 }}{{bg:{}}}{{cwd: S1 }}",
        " ".repeat(cols as usize - 8)
    )
}

#[test]
fn test_full_run_with_resize_against_winch_aware_stand_in() {
    let dir = TempDir::new().expect("should create run dir");
    let tmux = write_fake_tmux(dir.path());
    let conf = dir.path().join("integration.conf");
    fs::write(&conf, "# stand-in integration conf\n").expect("should write conf");

    let config = HarnessConfig {
        tmux,
        run_dir: dir.path().to_path_buf(),
        source_conf: conf,
        env: vec![("PATH".to_string(), "/usr/bin:/bin".to_string())],
        dims: Dimensions::new(50, 200),
        compare_attempts: 5,
        compare_delay: Duration::from_millis(400),
        outer_retries: 0,
        join_timeout: Duration::from_secs(5),
        ..HarnessConfig::default()
    };

    let harness = TmuxHarness::new(config, |version, dims| {
        assert_eq!(version, Version::new(2, 0), "stand-in reports tmux 2.0");
        vec![
            ScenarioStep::new(
                "wide status line",
                Prepare::Idle(Duration::from_secs(1)),
                Versioned::baseline(ExpectedRow::new(status_row(dims.cols), status_attrs())),
            ),
            ScenarioStep::new(
                "narrow status line after resize",
                Prepare::Resize {
                    dims: dims.with_cols(40),
                    settle: Duration::from_secs(1),
                },
                Versioned::baseline(ExpectedRow::new(status_row(40), status_attrs())),
            ),
        ]
    });

    let passed = harness.run().expect("run should not fault");
    assert!(passed, "both steps should pass against the stand-in");

    // Cleanup guarantee: the attempt's socket path is clear for reuse.
    assert!(!dir.path().join("tmux-socket-0").exists());
}

#[test]
fn test_mismatch_exhausts_and_reports_without_leaking() {
    let dir = TempDir::new().expect("should create run dir");
    let tmux = write_fake_tmux(dir.path());
    let conf = dir.path().join("integration.conf");
    fs::write(&conf, "# stand-in integration conf\n").expect("should write conf");

    let config = HarnessConfig {
        tmux,
        run_dir: dir.path().to_path_buf(),
        source_conf: conf,
        env: vec![("PATH".to_string(), "/usr/bin:/bin".to_string())],
        dims: Dimensions::new(50, 200),
        compare_attempts: 2,
        compare_delay: Duration::from_millis(100),
        outer_retries: 1,
        join_timeout: Duration::from_secs(5),
        ..HarnessConfig::default()
    };

    let harness = TmuxHarness::new(config, |_, _| {
        vec![ScenarioStep::new(
            "impossible expectation",
            Prepare::Idle(Duration::from_millis(500)),
            Versioned::baseline(ExpectedRow::new("{lead:never rendered}", status_attrs())),
        )]
    });

    let passed = harness.run().expect("run should not fault");
    assert!(!passed, "the impossible expectation must exhaust all attempts");
}
