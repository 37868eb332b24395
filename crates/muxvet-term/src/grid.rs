//! Styled screen capture over a headless terminal emulator.
//!
//! [`TerminalGrid`] owns a [`vt100::Parser`] fed with raw child output and
//! exposes the rendered screen as rows of [`Cell`]s with concrete colors.

use muxvet_types::{Dimensions, MuxvetError, StyleKey};

use crate::palette;

/// One rendered cell: its text and resolved style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Cell contents. A blank cell reads as a single space so row text
    /// keeps its column alignment; the continuation half of a wide
    /// character reads as empty so the character is not counted twice.
    pub text: String,
    /// Resolved style, with inverse video already folded into the colors.
    pub style: StyleKey,
}

/// A headless terminal screen.
pub struct TerminalGrid {
    parser: vt100::Parser,
    dims: Dimensions,
}

impl TerminalGrid {
    /// An empty screen of the given size, no scrollback.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            parser: vt100::Parser::new(dims.rows, dims.cols, 0),
            dims,
        }
    }

    /// Current screen size.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Feed raw child output into the emulator.
    pub fn ingest(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
    }

    /// Resize the emulated screen.
    ///
    /// A call with the current size is a no-op so repeated resizes to the
    /// same dimensions never perturb emulator state.
    pub fn resize(&mut self, dims: Dimensions) {
        if dims == self.dims {
            return;
        }
        self.parser.screen_mut().set_size(dims.rows, dims.cols);
        self.dims = dims;
    }

    /// Styled snapshot of one row, left to right.
    pub fn snapshot_row(&self, row: u16) -> Result<Vec<Cell>, MuxvetError> {
        if row >= self.dims.rows {
            return Err(MuxvetError::RowRange {
                row,
                rows: self.dims.rows,
            });
        }
        Ok(self.row_cells(row))
    }

    /// Styled snapshot of the whole screen, top to bottom.
    pub fn snapshot(&self) -> Vec<Vec<Cell>> {
        (0..self.dims.rows).map(|row| self.row_cells(row)).collect()
    }

    /// Plain-text contents of the whole screen.
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }

    /// Cursor position as (row, col).
    pub fn cursor_position(&self) -> (u16, u16) {
        self.parser.screen().cursor_position()
    }

    fn row_cells(&self, row: u16) -> Vec<Cell> {
        let screen = self.parser.screen();
        let mut cells = Vec::with_capacity(self.dims.cols as usize);
        for col in 0..self.dims.cols {
            if let Some(cell) = screen.cell(row, col) {
                cells.push(convert(cell));
            }
        }
        cells
    }
}

fn convert(cell: &vt100::Cell) -> Cell {
    let mut fg = palette::resolve(cell.fgcolor(), palette::DEFAULT_FG);
    let mut bg = palette::resolve(cell.bgcolor(), palette::DEFAULT_BG);
    if cell.inverse() {
        std::mem::swap(&mut fg, &mut bg);
    }
    let text = if cell.is_wide_continuation() {
        String::new()
    } else {
        let contents = cell.contents();
        if contents.is_empty() {
            " ".to_string()
        } else {
            contents.to_string()
        }
    };
    Cell {
        text,
        style: StyleKey {
            fg,
            bg,
            bold: cell.bold(),
            underline: cell.underline(),
            italic: cell.italic(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muxvet_types::Rgb;

    fn row_text(grid: &TerminalGrid, row: u16) -> String {
        grid.snapshot_row(row)
            .unwrap()
            .iter()
            .map(|c| c.text.as_str())
            .collect()
    }

    #[test]
    fn plain_text_lands_in_cells() {
        let mut grid = TerminalGrid::new(Dimensions::new(4, 10));
        grid.ingest(b"hi");
        let cells = grid.snapshot_row(0).unwrap();
        assert_eq!(cells[0].text, "h");
        assert_eq!(cells[1].text, "i");
        assert_eq!(cells[2].text, " ");
        assert_eq!(cells.len(), 10);
    }

    #[test]
    fn sgr_colors_resolve_to_rgb() {
        let mut grid = TerminalGrid::new(Dimensions::new(2, 10));
        // Green foreground (indexed 2), bold.
        grid.ingest(b"\x1b[32;1mG\x1b[m");
        let cells = grid.snapshot_row(0).unwrap();
        assert_eq!(cells[0].style.fg, Rgb(0, 224, 0));
        assert_eq!(cells[0].style.bg, palette::DEFAULT_BG);
        assert!(cells[0].style.bold);
        assert!(!cells[1].style.bold);
    }

    #[test]
    fn inverse_video_swaps_resolved_colors() {
        let mut grid = TerminalGrid::new(Dimensions::new(2, 10));
        grid.ingest(b"\x1b[31;7mR\x1b[m");
        let cells = grid.snapshot_row(0).unwrap();
        assert_eq!(cells[0].style.fg, palette::DEFAULT_BG);
        assert_eq!(cells[0].style.bg, Rgb(224, 0, 0));
    }

    #[test]
    fn wide_characters_occupy_one_cell_plus_empty_continuation() {
        let mut grid = TerminalGrid::new(Dimensions::new(2, 10));
        grid.ingest("日".as_bytes());
        let cells = grid.snapshot_row(0).unwrap();
        assert_eq!(cells[0].text, "日");
        assert_eq!(cells[1].text, "");
        assert_eq!(cells[2].text, " ");
        // Concatenated row text counts the wide character once.
        assert_eq!(row_text(&grid, 0), "日        ");
    }

    #[test]
    fn snapshot_row_rejects_out_of_range_rows() {
        let grid = TerminalGrid::new(Dimensions::new(4, 10));
        let err = grid.snapshot_row(4).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn resize_to_same_dims_is_a_noop() {
        let mut grid = TerminalGrid::new(Dimensions::new(4, 10));
        grid.ingest(b"stable");
        let before = grid.contents();
        grid.resize(Dimensions::new(4, 10));
        assert_eq!(grid.contents(), before);
        assert_eq!(grid.dims(), Dimensions::new(4, 10));
    }

    #[test]
    fn resize_changes_reported_dims() {
        let mut grid = TerminalGrid::new(Dimensions::new(4, 10));
        grid.resize(Dimensions::new(4, 6));
        assert_eq!(grid.dims(), Dimensions::new(4, 6));
        assert_eq!(grid.snapshot_row(0).unwrap().len(), 6);
    }

    #[test]
    fn snapshot_covers_every_row() {
        let mut grid = TerminalGrid::new(Dimensions::new(3, 5));
        grid.ingest(b"a\r\nb\r\nc");
        let rows = grid.snapshot();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].text, "a");
        assert_eq!(rows[1][0].text, "b");
        assert_eq!(rows[2][0].text, "c");
    }
}
