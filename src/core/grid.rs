//! Screen-buffer Grid
//!
//! A 2D grid of cells holding the full contents of one screen buffer.

use serde::{Deserialize, Serialize};

use super::cell::{Attribute, Cell};

/// A row of cells in the buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// The cells in this row
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cols: usize, attr: Attribute) -> Self {
        Self {
            cells: vec![Cell::with_attr(' ', attr); cols],
        }
    }

    pub fn resize(&mut self, cols: usize) {
        self.cells.resize(cols, Cell::default());
    }

    pub fn erase(&mut self, attr: Attribute) {
        for cell in &mut self.cells {
            cell.erase(attr);
        }
    }

    /// Erase cells from start to end (inclusive)
    pub fn erase_range(&mut self, start: usize, end: usize, attr: Attribute) {
        let end = end.min(self.cells.len().saturating_sub(1));
        for cell in self.cells.iter_mut().take(end + 1).skip(start) {
            cell.erase(attr);
        }
    }

    /// The row's characters as a string
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.ch).collect()
    }
}

/// The buffer grid - a 2D array of cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    /// The rows in the grid
    rows: Vec<Row>,
    /// Number of columns
    cols: usize,
    /// Number of rows
    num_rows: usize,
}

impl Grid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| Row::new(cols, Attribute::DEFAULT)).collect(),
            cols,
            num_rows: rows,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.num_rows
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cols * self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    pub fn cell_mut(&mut self, col: usize, row: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col))
    }

    pub fn row(&self, row: usize) -> Option<&Row> {
        self.rows.get(row)
    }

    pub fn row_mut(&mut self, row: usize) -> Option<&mut Row> {
        self.rows.get_mut(row)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Resize the grid, preserving content in the overlapping region
    pub fn resize(&mut self, cols: usize, rows: usize) {
        for row in &mut self.rows {
            row.resize(cols);
        }

        use std::cmp::Ordering;
        match rows.cmp(&self.num_rows) {
            Ordering::Greater => {
                for _ in self.num_rows..rows {
                    self.rows.push(Row::new(cols, Attribute::DEFAULT));
                }
            }
            Ordering::Less => {
                self.rows.truncate(rows);
            }
            Ordering::Equal => {}
        }

        self.cols = cols;
        self.num_rows = rows;
    }

    /// Blank every cell with the given attribute
    pub fn erase(&mut self, attr: Attribute) {
        for row in &mut self.rows {
            row.erase(attr);
        }
    }

    /// Drop the top row and append a blank one at the bottom
    pub fn scroll_up(&mut self, attr: Attribute) {
        if self.rows.is_empty() {
            return;
        }
        self.rows.remove(0);
        self.rows.push(Row::new(self.cols, attr));
    }

    /// Cells in row-major order starting at (col, row), wrapping onto
    /// following rows and stopping at the end of the grid.
    pub fn run(&self, col: usize, row: usize, length: usize) -> impl Iterator<Item = &Cell> {
        let start = row * self.cols + col;
        let end = start.saturating_add(length).min(self.len());
        let cols = self.cols;
        (start..end).filter_map(move |i| self.cell(i % cols, i / cols))
    }
}
