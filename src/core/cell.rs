//! Screen-buffer Cell
//!
//! Represents a single cell of a console screen buffer: one character plus
//! the attribute word the console stores for it.

use serde::{Deserialize, Serialize};

/// Per-cell attribute word.
///
/// The low nibble holds the foreground color index, the high nibble the
/// background color index. Indices 0-7 are the standard ANSI colors, 8-15
/// their bright variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attribute(u16);

impl Attribute {
    /// White on black, the attribute of a freshly allocated buffer
    pub const DEFAULT: Attribute = Attribute(0x07);

    /// Default foreground index (white)
    pub const DEFAULT_FOREGROUND: u8 = 7;
    /// Default background index (black)
    pub const DEFAULT_BACKGROUND: u8 = 0;

    /// Intensity bit within a nibble
    const BRIGHT: u8 = 0x08;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn new(foreground: u8, background: u8) -> Self {
        Self(((background as u16 & 0x0F) << 4) | (foreground as u16 & 0x0F))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn foreground(self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    pub const fn background(self) -> u8 {
        ((self.0 >> 4) & 0x0F) as u8
    }

    pub fn with_foreground(self, index: u8) -> Self {
        Self::new(index, self.background())
    }

    pub fn with_background(self, index: u8) -> Self {
        Self::new(self.foreground(), index)
    }

    /// Set or clear the foreground intensity bit (SGR 1 / SGR 22)
    pub const fn is_bright_foreground(self) -> bool {
        self.foreground() & Self::BRIGHT != 0
    }

    pub fn with_bright_foreground(self, bright: bool) -> Self {
        let fg = if bright {
            self.foreground() | Self::BRIGHT
        } else {
            self.foreground() & !Self::BRIGHT
        };
        self.with_foreground(fg)
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A single cell in a screen buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// The character in this cell
    pub ch: char,
    /// The attribute word stored with it
    pub attr: Attribute,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            attr: Attribute::DEFAULT,
        }
    }
}

impl Cell {
    /// Create a new cell with the default attribute
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            ..Default::default()
        }
    }

    pub fn with_attr(ch: char, attr: Attribute) -> Self {
        Self { ch, attr }
    }

    /// Blank the cell, keeping the given attribute (erase operations)
    pub fn erase(&mut self, attr: Attribute) {
        self.ch = ' ';
        self.attr = attr;
    }
}
