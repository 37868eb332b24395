//! Run-grouping and labeling of styled rows.
//!
//! A row compares as a compact string of `{label:text}` runs, one run per
//! stretch of cells sharing a [`StyleKey`]. Labels come from the caller's
//! [`AttributeMap`]: seeded semantic names where provided, auto ids for
//! styles first seen while rendering.

use muxvet_types::{AttributeMap, StyleKey};

use crate::grid::Cell;

/// Render one row as `{label:text}` runs of constant style.
///
/// `attrs` is extended in place as unseen styles are encountered;
/// left-to-right scan order keeps id assignment deterministic.
pub fn highlight_row(cells: &[Cell], attrs: &mut AttributeMap) -> String {
    let mut runs: Vec<(StyleKey, String)> = Vec::new();
    for cell in cells {
        // Wide-character continuations carry no text and never open a run.
        if cell.text.is_empty() {
            continue;
        }
        match runs.last_mut() {
            Some((style, text)) if *style == cell.style => text.push_str(&cell.text),
            _ => runs.push((cell.style, cell.text.clone())),
        }
    }
    runs.into_iter()
        .map(|(style, text)| format!("{{{}:{}}}", attrs.classify(style), text))
        .collect()
}

/// Render every row, newline-joined, threading one map across all rows.
pub fn highlight_screen(rows: &[Vec<Cell>], attrs: &mut AttributeMap) -> String {
    let lines: Vec<String> = rows.iter().map(|row| highlight_row(row, attrs)).collect();
    lines.join("\n")
}
