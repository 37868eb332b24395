//! Version-gated expected screen content.
//!
//! Different multiplexer releases render the status line differently, so a
//! fixture is a baseline rendering plus overrides that apply from a given
//! version upward. Selection picks the highest threshold at or below the
//! detected version.

use muxvet_types::{AttributeMap, Version};

/// One expected row rendering.
#[derive(Debug, Clone)]
pub struct ExpectedRow {
    /// `{label:text}` runs, as the classifier renders them.
    pub text: String,
    /// Style labels the runs refer to. Also used as the classifier seed
    /// when sampling, so expected and actual share one labeling.
    pub attrs: AttributeMap,
}

impl ExpectedRow {
    pub fn new(text: impl Into<String>, attrs: AttributeMap) -> Self {
        Self {
            text: text.into(),
            attrs,
        }
    }
}

/// A baseline value plus overrides gated by minimum version.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    baseline: T,
    overrides: Vec<(Version, T)>,
}

impl<T> Versioned<T> {
    /// A value that applies to every version.
    pub fn baseline(value: T) -> Self {
        Self {
            baseline: value,
            overrides: Vec::new(),
        }
    }

    /// Add an override that applies from `version` (inclusive) upward.
    ///
    /// Gates may be added in any order; selection sorts them. Adding the
    /// same threshold twice keeps the later value.
    pub fn since(mut self, version: Version, value: T) -> Self {
        self.overrides.push((version, value));
        self.overrides.sort_by_key(|(threshold, _)| *threshold);
        self
    }

    /// The variant for `version`: the highest threshold at or below it,
    /// falling back to the baseline. Total for every input.
    pub fn select(&self, version: Version) -> &T {
        self.overrides
            .iter()
            .rev()
            .find(|(threshold, _)| *threshold <= version)
            .map(|(_, value)| value)
            .unwrap_or(&self.baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gated() -> Versioned<&'static str> {
        Versioned::baseline("old")
            .since(Version::new(1, 8), "1.8")
            .since(Version::new(2, 0), "2.0")
            .since(Version::new(1, 7), "1.7")
    }

    #[test]
    fn selection_covers_every_band() {
        let v = gated();
        assert_eq!(*v.select(Version::new(1, 6)), "old");
        assert_eq!(*v.select(Version::new(1, 7)), "1.7");
        assert_eq!(*v.select(Version::new(1, 8)), "1.8");
        assert_eq!(*v.select(Version::new(1, 9)), "1.8");
        assert_eq!(*v.select(Version::new(2, 0)), "2.0");
        assert_eq!(*v.select(Version::new(3, 3)), "2.0");
    }

    #[test]
    fn master_builds_select_the_newest_gate() {
        assert_eq!(*gated().select(Version::NEWEST), "2.0");
    }

    #[test]
    fn baseline_alone_is_total() {
        let v: Versioned<&str> = Versioned::baseline("only");
        assert_eq!(*v.select(Version::new(0, 9)), "only");
        assert_eq!(*v.select(Version::NEWEST), "only");
    }

    #[test]
    fn duplicate_threshold_keeps_the_later_value() {
        let v = Versioned::baseline("old")
            .since(Version::new(2, 0), "first")
            .since(Version::new(2, 0), "second");
        assert_eq!(*v.select(Version::new(2, 1)), "second");
    }
}
