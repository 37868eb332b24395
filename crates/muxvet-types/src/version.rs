//! Multiplexer version numbers and `-V` output parsing.

use std::fmt;

/// A parsed multiplexer version, ordered lexicographically by
/// `(major, minor, patch)`. A missing patch component is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Sentinel that compares newer than any released version. Development
    /// builds that report `master` resolve to this.
    pub const NEWEST: Version = Version {
        major: u32::MAX,
        minor: 0,
        patch: 0,
    };

    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: 0,
        }
    }

    /// Parse the output of `tmux -V`.
    ///
    /// Accepts `tmux 2.0`, `tmux 3.3a` (letter suffixes are ignored),
    /// `tmux next-3.4` and `tmux master`. Returns `None` when the output
    /// does not carry a recognizable version token.
    pub fn from_tool_output(output: &str) -> Option<Self> {
        let token = output.split_whitespace().nth(1)?;
        let token = token.strip_prefix("next-").unwrap_or(token);
        if token == "master" {
            return Some(Self::NEWEST);
        }
        let mut parts = token.split('.');
        let major = leading_number(parts.next()?)?;
        let minor = leading_number(parts.next()?)?;
        let patch = match parts.next() {
            Some(part) => leading_number(part)?,
            None => 0,
        };
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

/// The numeric prefix of a component such as `3a`. `None` when the
/// component does not start with a digit.
fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NEWEST {
            return f.write_str("master");
        }
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_versions_order_lexicographically() {
        assert!(Version::new(1, 7) < Version::new(1, 8));
        assert!(Version::new(1, 8) < Version::new(2, 0));
        assert!(Version::new(2, 0) < Version::NEWEST);
    }

    #[test]
    fn parses_plain_and_suffixed_output() {
        assert_eq!(
            Version::from_tool_output("tmux 2.0"),
            Some(Version::new(2, 0))
        );
        assert_eq!(
            Version::from_tool_output("tmux 3.3a\n"),
            Some(Version::new(3, 3))
        );
    }

    #[test]
    fn parses_development_builds_as_newest_or_next() {
        assert_eq!(Version::from_tool_output("tmux master"), Some(Version::NEWEST));
        assert_eq!(
            Version::from_tool_output("tmux next-3.4"),
            Some(Version::new(3, 4))
        );
    }

    #[test]
    fn rejects_unrecognizable_output() {
        assert_eq!(Version::from_tool_output("tmux"), None);
        assert_eq!(Version::from_tool_output("usage: tmux [-2CDlNuVv]"), None);
        assert_eq!(Version::from_tool_output(""), None);
    }

    #[test]
    fn displays_patch_only_when_present() {
        assert_eq!(Version::new(2, 0).to_string(), "2.0");
        assert_eq!(
            Version {
                major: 3,
                minor: 1,
                patch: 2
            }
            .to_string(),
            "3.1.2"
        );
        assert_eq!(Version::NEWEST.to_string(), "master");
    }
}
