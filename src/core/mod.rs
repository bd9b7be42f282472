//! Screen-buffer Core Module
//!
//! Platform-independent state of a console screen buffer. This module
//! contains:
//! - Cell representation with attribute words
//! - Cursor state and positioning
//! - The cell grid
//! - Coordinates and rectangles
//! - Deterministic snapshot generation

mod cell;
mod cursor;
mod geometry;
mod grid;
mod snapshot;

pub use cell::{Attribute, Cell};
pub use cursor::{Cursor, SavedCursor};
pub use geometry::{Coord, Rect};
pub use grid::{Grid, Row};
pub use snapshot::{CursorSnapshot, Snapshot};
