//! Terminal dimensions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A terminal window size in character cells.
///
/// Both components are always non-zero for a live session; resizes replace
/// the whole value so readers never observe a mixed row/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of rows.
    pub rows: u16,
    /// Number of columns.
    pub cols: u16,
}

impl Dimensions {
    /// Create a new dimensions value.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// This size with a different column count.
    pub fn with_cols(self, cols: u16) -> Self {
        Self { cols, ..self }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
