//! Styled-cell vocabulary: colors, style keys, and attribute maps.
//!
//! A [`StyleKey`] identifies a rendering style irrespective of which
//! character uses it. An [`AttributeMap`] assigns each key a stable label:
//! either a caller-seeded semantic name (so fixtures can say `cwd` instead
//! of a raw RGB tuple) or a small integer id handed out in first-seen order.

use std::fmt;

/// A concrete 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// The style-identifying tuple of a cell: colors plus the three text
/// attributes the status line can render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleKey {
    /// Foreground color.
    pub fg: Rgb,
    /// Background color.
    pub bg: Rgb,
    /// Bold attribute.
    pub bold: bool,
    /// Underline attribute.
    pub underline: bool,
    /// Italic attribute.
    pub italic: bool,
}

impl StyleKey {
    /// A plain (non-bold, non-underline, non-italic) style.
    pub fn new(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg,
            bg,
            bold: false,
            underline: false,
            italic: false,
        }
    }

    /// This style with bold set.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// This style with underline set.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// This style with italic set.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}", self.fg, self.bg)?;
        if self.bold {
            write!(f, ", bold")?;
        }
        if self.underline {
            write!(f, ", underline")?;
        }
        if self.italic {
            write!(f, ", italic")?;
        }
        write!(f, ")")
    }
}

/// A label assigned to a style: a seeded semantic name or an auto id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// Caller-seeded semantic name (e.g. `cwd`, `bg`).
    Name(String),
    /// Integer id assigned to a style first seen during classification.
    Id(u32),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Name(name) => f.write_str(name),
            Label::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::Name(name.to_string())
    }
}

impl From<u32> for Label {
    fn from(id: u32) -> Self {
        Label::Id(id)
    }
}

/// Insertion-ordered mapping from [`StyleKey`] to [`Label`].
///
/// Ordering is significant: it determines which never-before-seen style
/// gets which auto id, so a deterministic byte stream always classifies to
/// the same labels. Auto ids start at `len + 1` counted when the key is
/// first seen, skipping integers already used as seeded labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(StyleKey, Label)>,
}

impl AttributeMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map pre-populated with semantic names, in iteration order.
    pub fn seeded<L: Into<Label>>(entries: impl IntoIterator<Item = (StyleKey, L)>) -> Self {
        let mut map = Self::new();
        for (key, label) in entries {
            map.seed(key, label);
        }
        map
    }

    /// Seed a key with a label, replacing any existing entry for the key.
    pub fn seed(&mut self, key: StyleKey, label: impl Into<Label>) {
        let label = label.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = label;
        } else {
            self.entries.push((key, label));
        }
    }

    /// Look up the label for a key without assigning one.
    pub fn get(&self, key: &StyleKey) -> Option<&Label> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, label)| label)
    }

    /// Label for `key`, assigning the next unused integer id if unseen.
    pub fn classify(&mut self, key: StyleKey) -> Label {
        if let Some(label) = self.get(&key) {
            return label.clone();
        }
        let label = Label::Id(self.next_id());
        self.entries.push((key, label.clone()));
        label
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(StyleKey, Label)> {
        self.entries.iter()
    }

    fn next_id(&self) -> u32 {
        let mut candidate = self.entries.len() as u32 + 1;
        while self
            .entries
            .iter()
            .any(|(_, label)| *label == Label::Id(candidate))
        {
            candidate += 1;
        }
        candidate
    }
}

impl fmt::Display for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, label) in &self.entries {
            writeln!(f, "{key}: {label}")?;
        }
        Ok(())
    }
}
