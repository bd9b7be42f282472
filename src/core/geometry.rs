//! Cell coordinates and rectangles

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell coordinate or a size in cells (x = column, y = row)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: u16,
    pub y: u16,
}

impl Coord {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Number of cells in an area of this size
    pub fn area(self) -> usize {
        self.x as usize * self.y as usize
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangle of cells, used for the visible window of a buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(left: u16, top: u16, width: u16, height: u16) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rectangle of the given size anchored at the origin
    pub const fn at_origin(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn size(&self) -> Coord {
        Coord::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.left as u32 + self.width as u32
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.top as u32 + self.height as u32
    }

    /// Whether this rectangle lies entirely inside an area of `size`
    pub fn fits_within(&self, size: Coord) -> bool {
        self.right() <= size.x as u32 && self.bottom() <= size.y as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_fits_within() {
        let rect = Rect::new(10, 5, 70, 20);
        assert!(rect.fits_within(Coord::new(80, 25)));
        assert!(!rect.fits_within(Coord::new(79, 25)));
        assert!(!rect.fits_within(Coord::new(80, 24)));
    }

    #[test]
    fn test_rect_edges_do_not_overflow() {
        let rect = Rect::new(u16::MAX, u16::MAX, u16::MAX, 1);
        assert_eq!(rect.right(), 2 * u16::MAX as u32);
        assert!(!rect.fits_within(Coord::new(u16::MAX, u16::MAX)));
    }

    #[test]
    fn test_coord_area() {
        assert_eq!(Coord::new(120, 30).area(), 3600);
        assert_eq!(Coord::new(0, 30).area(), 0);
    }
}
