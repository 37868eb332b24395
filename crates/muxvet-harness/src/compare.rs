//! Retrying comparison of rendered rows against expected fixtures.
//!
//! A status line repaints asynchronously, so a single sample can race the
//! renderer. [`compare`] re-samples up to an attempt budget with a delay
//! between tries; text equality gates pass/fail, attribute maps ride along
//! for diagnostics only.

use tracing::info;

use muxvet_types::AttributeMap;

use crate::error::HarnessError;
use crate::fixtures::ExpectedRow;

/// Sampling callback: given a classifier seed, produce the rendered text
/// and the extended attribute map.
pub type Sample<'a> =
    dyn FnMut(&AttributeMap) -> Result<(String, AttributeMap), HarnessError> + 'a;

/// Outcome of a comparison run.
#[derive(Debug)]
pub enum CompareOutcome {
    /// The sampled text matched within the attempt budget.
    Pass {
        /// How many samples it took (1 = first try).
        attempts_used: u32,
    },
    /// Every attempt mismatched.
    Fail {
        /// Diagnostics from the final attempt.
        report: Report,
    },
}

/// Diagnostics captured when a comparison exhausts its attempts.
#[derive(Debug)]
pub struct Report {
    /// Last sampled row text.
    pub actual_text: String,
    /// The expected row text.
    pub expected_text: String,
    /// Attribute map from the last row sample.
    pub actual_attrs: AttributeMap,
    /// Attribute map the fixture refers to.
    pub expected_attrs: AttributeMap,
    /// Full-screen rendering sampled after the last attempt.
    pub screen_text: String,
    /// Attribute map of the full-screen rendering.
    pub screen_attrs: AttributeMap,
}

impl Report {
    /// Render the failure diagnostics.
    ///
    /// Layout: `Result:` / `Expected:` / `Attributes:` / `Screen:` /
    /// 80-underscore rule / `Diff:` / 80-equals rule / marker diff.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Result:\n");
        out.push_str(&self.actual_text);
        out.push('\n');
        out.push_str("Expected:\n");
        out.push_str(&self.expected_text);
        out.push('\n');
        out.push_str("Attributes:\n");
        out.push_str(&self.actual_attrs.to_string());
        out.push_str("Screen:\n");
        out.push_str(&self.screen_text);
        out.push('\n');
        out.push_str(&self.screen_attrs.to_string());
        out.push_str(&"_".repeat(80));
        out.push('\n');
        out.push_str("Diff:\n");
        out.push_str(&"=".repeat(80));
        out.push('\n');
        out.push_str(&marker_diff(&self.actual_text, &self.expected_text));
        out.push('\n');
        out
    }
}

/// Compare the sampled row against `expected` with retries.
///
/// Each attempt re-samples through `sample_row`, seeding the classifier
/// with the fixture's own attribute map so expected and actual share one
/// labeling. After each mismatch `delay` runs once. On exhaustion the
/// screen is sampled through `sample_screen` for the report. An attempt
/// budget of zero is treated as one.
pub fn compare(
    expected: &ExpectedRow,
    attempts: u32,
    sample_row: &mut Sample<'_>,
    sample_screen: &mut Sample<'_>,
    delay: &mut dyn FnMut(),
) -> Result<CompareOutcome, HarnessError> {
    let attempts = attempts.max(1);
    let mut remaining = attempts;
    let mut last = None;
    while remaining > 0 {
        let (actual_text, actual_attrs) = sample_row(&expected.attrs)?;
        if actual_text == expected.text {
            return Ok(CompareOutcome::Pass {
                attempts_used: attempts - remaining + 1,
            });
        }
        remaining -= 1;
        info!("Actual result does not match expected. Attempts left: {remaining}.");
        last = Some((actual_text, actual_attrs));
        delay();
    }

    // remaining hit zero, so at least one sample was taken.
    let (actual_text, actual_attrs) = last.unwrap_or_default();
    let (screen_text, screen_attrs) = sample_screen(&expected.attrs)?;
    Ok(CompareOutcome::Fail {
        report: Report {
            actual_text,
            expected_text: expected.text.clone(),
            actual_attrs,
            expected_attrs: expected.attrs.clone(),
            screen_text,
            screen_attrs,
        },
    })
}

/// Two-line diff with a character marker row: `^` under each position
/// where the strings disagree.
fn marker_diff(actual: &str, expected: &str) -> String {
    let a: Vec<char> = actual.chars().collect();
    let b: Vec<char> = expected.chars().collect();
    let len = a.len().max(b.len());
    let mut markers = String::with_capacity(len);
    for i in 0..len {
        markers.push(if a.get(i) == b.get(i) { ' ' } else { '^' });
    }
    format!("- {actual}\n+ {expected}\n? {}", markers.trim_end())
}
