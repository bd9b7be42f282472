//! Deterministic snapshot generation
//!
//! Snapshots capture the complete state of one screen buffer in a
//! serializable format for testing, debugging and headless output. Given the
//! same sequence of writes, a buffer must produce identical snapshots.

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use super::geometry::Rect;
use super::grid::Grid;

/// A complete snapshot of a screen buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Buffer dimensions
    pub cols: usize,
    pub rows: usize,
    /// Visible window inside the buffer
    pub window: Rect,
    /// Cursor state
    pub cursor: CursorSnapshot,
    /// Row text (row-major)
    pub lines: Vec<String>,
    /// Attribute words per row
    pub attributes: Vec<Vec<u16>>,
}

/// Snapshot of cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub col: usize,
    pub row: usize,
    pub visible: bool,
}

impl Snapshot {
    pub fn capture(grid: &Grid, cursor: &Cursor, window: Rect) -> Self {
        Self {
            cols: grid.cols(),
            rows: grid.rows(),
            window,
            cursor: CursorSnapshot {
                col: cursor.col,
                row: cursor.row,
                visible: cursor.visible,
            },
            lines: grid.iter_rows().map(|r| r.text()).collect(),
            attributes: grid
                .iter_rows()
                .map(|r| r.cells.iter().map(|c| c.attr.bits()).collect())
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Plain text of the buffer, trailing blanks trimmed per row
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attribute;

    #[test]
    fn test_capture_and_json_roundtrip() {
        let mut grid = Grid::new(4, 2);
        if let Some(cell) = grid.cell_mut(1, 0) {
            cell.ch = 'X';
            cell.attr = Attribute::new(1, 2);
        }
        let mut cursor = Cursor::new();
        cursor.move_to(2, 1, 4, 2);

        let snapshot = Snapshot::capture(&grid, &cursor, Rect::at_origin(4, 2));
        assert_eq!(snapshot.lines, vec![" X  ".to_string(), "    ".to_string()]);
        assert_eq!(snapshot.attributes[0][1], 0x21);
        assert_eq!((snapshot.cursor.col, snapshot.cursor.row), (2, 1));

        let json = snapshot.to_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_to_text_trims_rows() {
        let grid = Grid::new(3, 2);
        let snapshot = Snapshot::capture(&grid, &Cursor::new(), Rect::at_origin(3, 2));
        assert_eq!(snapshot.to_text(), "\n\n");
    }
}
