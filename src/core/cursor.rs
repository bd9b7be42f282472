//! Cursor state management
//!
//! The cursor tracks position, visibility and the attribute applied to newly
//! printed characters. It also supports save/restore (DECSC/DECRC and
//! CSI s/u).

use serde::{Deserialize, Serialize};

use super::Attribute;

/// Cursor state including position, visibility, and current attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Column position (0-indexed)
    pub col: usize,
    /// Row position (0-indexed)
    pub row: usize,
    /// Whether the cursor is visible (DECTCEM)
    pub visible: bool,
    /// Attribute applied to new characters
    pub attr: Attribute,
    /// Pending wrap - cursor is at the right margin, next char will wrap
    pub pending_wrap: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            col: 0,
            row: 0,
            visible: true,
            attr: Attribute::DEFAULT,
            pending_wrap: false,
        }
    }
}

/// Saved cursor state for DECSC/DECRC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavedCursor {
    pub col: usize,
    pub row: usize,
    pub attr: Attribute,
}

impl Cursor {
    /// Create a new cursor at the home position
    pub fn new() -> Self {
        Self::default()
    }

    /// Move cursor to absolute position, clamping to bounds
    pub fn move_to(&mut self, col: usize, row: usize, cols: usize, rows: usize) {
        self.col = col.min(cols.saturating_sub(1));
        self.row = row.min(rows.saturating_sub(1));
        self.pending_wrap = false;
    }

    pub fn move_up(&mut self, n: usize) {
        self.row = self.row.saturating_sub(n);
        self.pending_wrap = false;
    }

    pub fn move_down(&mut self, n: usize, rows: usize) {
        self.row = (self.row + n).min(rows.saturating_sub(1));
        self.pending_wrap = false;
    }

    pub fn move_left(&mut self, n: usize) {
        self.col = self.col.saturating_sub(n);
        self.pending_wrap = false;
    }

    pub fn move_right(&mut self, n: usize, cols: usize) {
        self.col = (self.col + n).min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Carriage return - move to column 0
    pub fn carriage_return(&mut self) {
        self.col = 0;
        self.pending_wrap = false;
    }

    pub fn save(&self) -> SavedCursor {
        SavedCursor {
            col: self.col,
            row: self.row,
            attr: self.attr,
        }
    }

    pub fn restore(&mut self, saved: &SavedCursor, cols: usize, rows: usize) {
        self.move_to(saved.col, saved.row, cols, rows);
        self.attr = saved.attr;
    }

    /// Keep the cursor inside a grid that has just been resized
    pub fn clamp(&mut self, cols: usize, rows: usize) {
        self.col = self.col.min(cols.saturating_sub(1));
        self.row = self.row.min(rows.saturating_sub(1));
        self.pending_wrap = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_default() {
        let cursor = Cursor::default();
        assert_eq!(cursor.col, 0);
        assert_eq!(cursor.row, 0);
        assert!(cursor.visible);
        assert_eq!(cursor.attr, Attribute::DEFAULT);
    }

    #[test]
    fn test_cursor_move_to() {
        let mut cursor = Cursor::new();
        cursor.move_to(5, 10, 80, 24);
        assert_eq!((cursor.col, cursor.row), (5, 10));

        // Test clamping
        cursor.move_to(100, 50, 80, 24);
        assert_eq!((cursor.col, cursor.row), (79, 23));
    }

    #[test]
    fn test_cursor_boundaries() {
        let mut cursor = Cursor::new();

        cursor.move_up(100);
        assert_eq!(cursor.row, 0);

        cursor.move_left(100);
        assert_eq!(cursor.col, 0);

        cursor.move_down(100, 24);
        assert_eq!(cursor.row, 23);

        cursor.move_right(100, 80);
        assert_eq!(cursor.col, 79);
    }

    #[test]
    fn test_cursor_save_restore() {
        let mut cursor = Cursor::new();
        cursor.move_to(15, 8, 80, 24);
        cursor.attr = Attribute::new(1, 0);

        let saved = cursor.save();

        cursor.move_to(0, 0, 80, 24);
        cursor.attr = Attribute::DEFAULT;

        cursor.restore(&saved, 80, 24);
        assert_eq!((cursor.col, cursor.row), (15, 8));
        assert_eq!(cursor.attr, Attribute::new(1, 0));
    }

    #[test]
    fn test_clamp_clears_pending_wrap() {
        let mut cursor = Cursor::new();
        cursor.move_to(79, 23, 80, 24);
        cursor.pending_wrap = true;

        cursor.clamp(40, 10);
        assert_eq!((cursor.col, cursor.row), (39, 9));
        assert!(!cursor.pending_wrap);
    }
}
