//! Built-in verification suite for the tmux status line.
//!
//! Two steps: the freshly spawned session at full width, then the same
//! session shrunk to 40 columns. Expected rows are version-gated because
//! tmux changed how the status line truncates and orders window titles
//! across 1.7, 1.8 and 2.0; each band was captured against a real tmux of
//! that era.

use std::time::Duration;

use muxvet_harness::{ExpectedRow, Prepare, ScenarioStep, Versioned};
use muxvet_types::{AttributeMap, Dimensions, Rgb, StyleKey, Version};

/// Settle time before a step's first sample.
const SETTLE: Duration = Duration::from_secs(5);

fn on_dark(fg: Rgb) -> StyleKey {
    StyleKey::new(fg, Rgb(11, 11, 11))
}

fn on_blue(fg: Rgb) -> StyleKey {
    StyleKey::new(fg, Rgb(0, 102, 153))
}

/// Named styles every fixture shares. Styles outside this set pick up
/// integer labels, seeded per version band below.
fn base_attrs() -> AttributeMap {
    AttributeMap::seeded([
        (StyleKey::new(Rgb(0, 0, 0), Rgb(243, 243, 243)).bold(), "lead"),
        (on_dark(Rgb(243, 243, 243)), "leadsep"),
        (on_dark(Rgb(255, 255, 255)), "bg"),
        (StyleKey::new(Rgb(199, 199, 199), Rgb(88, 88, 88)), "cwd"),
        (on_dark(Rgb(88, 88, 88)), "cwdhsep"),
        (StyleKey::new(Rgb(0, 0, 0), Rgb(0, 224, 0)), "defstl"),
    ])
}

fn extended(extra: &[(StyleKey, u32)]) -> AttributeMap {
    let mut attrs = base_attrs();
    for (key, id) in extra {
        attrs.seed(*key, *id);
    }
    attrs
}

/// Full-width layout: session id, two inactive windows, the active
/// window, the background filler and the right-hand segment.
fn wide_fixture() -> Versioned<ExpectedRow> {
    Versioned::baseline(ExpectedRow::new(
        format!(
            "{}{{bg:{}}}{}",
            "{lead: 0 }{leadsep: }{bg: S2 string here  }\
             {4: 0  }{cwdhsep:| }{6:bash  }\
             {bg: }{4: 1- }{cwdhsep:| }{6:bash  }\
             {bg: }{7: }{8:2* | }{9:bash }{10: }",
            " ".repeat(124),
            "{cwdhsep: }{cwd: S1 string here }",
        ),
        extended(&[
            (on_dark(Rgb(133, 133, 133)), 4),
            (on_dark(Rgb(188, 188, 188)), 6),
            (on_blue(Rgb(11, 11, 11)), 7),
            (on_blue(Rgb(102, 204, 255)), 8),
            (on_blue(Rgb(255, 255, 255)).bold(), 9),
            (on_dark(Rgb(0, 102, 153)), 10),
        ]),
    ))
    // 1.8 highlights the previously active window, shifting the integer
    // labels around the active-window group.
    .since(
        Version::new(1, 8),
        ExpectedRow::new(
            format!(
                "{}{{bg:{}}}{}",
                "{lead: 0 }{leadsep: }{bg: S2 string here  }\
                 {4: 0  }{cwdhsep:| }{6:bash  }\
                 {bg: }{4: 1- }{cwdhsep:| }{7:bash  }\
                 {bg: }{8: }{9:2* | }{10:bash }{7: }",
                " ".repeat(124),
                "{cwdhsep: }{cwd: S1 string here }",
            ),
            extended(&[
                (on_dark(Rgb(133, 133, 133)), 4),
                (on_dark(Rgb(188, 188, 188)), 6),
                (on_dark(Rgb(0, 102, 153)), 7),
                (on_blue(Rgb(11, 11, 11)), 8),
                (on_blue(Rgb(102, 204, 255)), 9),
                (on_blue(Rgb(255, 255, 255)).bold(), 10),
            ]),
        ),
    )
    // 2.0 gives the left segment one trailing space fewer and widens the
    // filler by one column.
    .since(
        Version::new(2, 0),
        ExpectedRow::new(
            format!(
                "{}{{bg:{}}}{}",
                "{lead: 0 }{leadsep: }{bg: S2 string here }\
                 {4: 0  }{cwdhsep:| }{6:bash  }\
                 {bg: }{4: 1- }{cwdhsep:| }{7:bash  }\
                 {bg: }{8: }{9:2* | }{10:bash }{7: }",
                " ".repeat(125),
                "{cwdhsep: }{cwd: S1 string here }",
            ),
            extended(&[
                (on_dark(Rgb(133, 133, 133)), 4),
                (on_dark(Rgb(188, 188, 188)), 6),
                (on_dark(Rgb(0, 102, 153)), 7),
                (on_blue(Rgb(11, 11, 11)), 8),
                (on_blue(Rgb(102, 204, 255)), 9),
                (on_blue(Rgb(255, 255, 255)).bold(), 10),
            ]),
        ),
    )
}

/// Collapsed layout after the shrink. Versions before 1.7 drop the status
/// line entirely at 40 columns and show a blank row at the old width.
fn narrow_fixture(initial: Dimensions) -> Versioned<ExpectedRow> {
    Versioned::baseline(ExpectedRow::new(
        format!("{{bg:{}}}", " ".repeat(usize::from(initial.cols))),
        base_attrs(),
    ))
    .since(
        Version::new(1, 7),
        ExpectedRow::new(
            "{lead: 0 }\
             {leadsep: }{bg: <}{4:h  }{bg: }{5: }\
             {6:2* | }{7:bash }{8: }{bg: }{cwdhsep: }\
             {cwd: S1 string here }"
                .to_string(),
            extended(&[
                (on_dark(Rgb(188, 188, 188)), 4),
                (on_blue(Rgb(11, 11, 11)), 5),
                (on_blue(Rgb(102, 204, 255)), 6),
                (on_blue(Rgb(255, 255, 255)).bold(), 7),
                (on_dark(Rgb(0, 102, 153)), 8),
            ]),
        ),
    )
    .since(
        Version::new(1, 8),
        ExpectedRow::new(
            "{lead: 0 }\
             {leadsep: }{bg: <}{4:h  }{bg: }{5: }\
             {6:2* | }{7:bash }{4: }{bg: }{cwdhsep: }\
             {cwd: S1 string here }"
                .to_string(),
            extended(&[
                (on_dark(Rgb(0, 102, 153)), 4),
                (on_blue(Rgb(11, 11, 11)), 5),
                (on_blue(Rgb(102, 204, 255)), 6),
                (on_blue(Rgb(255, 255, 255)).bold(), 7),
            ]),
        ),
    )
    .since(
        Version::new(2, 0),
        ExpectedRow::new(
            "{lead: 0 }\
             {leadsep: }{bg:<}{4:ash  }{bg: }{5: }\
             {6:2* | }{7:bash }{4: }{cwdhsep: }\
             {cwd: S1 string here }"
                .to_string(),
            extended(&[
                (on_dark(Rgb(0, 102, 153)), 4),
                (on_blue(Rgb(11, 11, 11)), 5),
                (on_blue(Rgb(102, 204, 255)), 6),
                (on_blue(Rgb(255, 255, 255)).bold(), 7),
            ]),
        ),
    )
}

/// The built-in two-step suite matching the bundled fixture config.
pub fn default_steps(dims: Dimensions) -> Vec<ScenarioStep> {
    vec![
        ScenarioStep::new(
            "full-width status line",
            Prepare::Idle(SETTLE),
            wide_fixture(),
        ),
        ScenarioStep::new(
            "status line after shrinking to 40 columns",
            Prepare::Resize {
                dims: dims.with_cols(40),
                settle: SETTLE,
            },
            narrow_fixture(dims),
        ),
    ]
}
