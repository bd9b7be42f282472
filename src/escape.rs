//! Escape sequence encoding
//!
//! Pure functions producing the byte-exact sequences surfaces write. Nothing
//! here touches a console.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Attribute;

/// Erase the whole display, then home the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
/// Reset all graphic rendition
pub const RESET: &str = "\x1b[0m";
pub const CURSOR_SHOW: &str = "\x1b[?25h";
pub const CURSOR_HIDE: &str = "\x1b[?25l";

/// The eight standard terminal colours, by SGR index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Colour {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

impl Colour {
    pub const ALL: [Colour; 8] = [
        Colour::Black,
        Colour::Red,
        Colour::Green,
        Colour::Yellow,
        Colour::Blue,
        Colour::Magenta,
        Colour::Cyan,
        Colour::White,
    ];

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Colour for an index in `0..8`
    pub fn from_index(index: u8) -> Option<Colour> {
        Self::ALL.get(usize::from(index)).copied()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Wrap `text` in an SGR sequence selecting the given colours, followed by a
/// reset. A `None` channel is omitted from the opening sequence.
pub fn encode_coloured(text: &str, foreground: Option<Colour>, background: Option<Colour>) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    out.push_str("\x1b[");
    match (foreground, background) {
        (Some(fg), Some(bg)) => {
            out.push_str(&format!("{};{}", 30 + fg.index(), 40 + bg.index()));
        }
        (Some(fg), None) => out.push_str(&(30 + fg.index()).to_string()),
        (None, Some(bg)) => out.push_str(&(40 + bg.index()).to_string()),
        (None, None) => {}
    }
    out.push('m');
    out.push_str(text);
    out.push_str(RESET);
    out
}

/// CUP for a 0-indexed cell
pub fn cursor_position(col: u16, row: u16) -> String {
    format!("\x1b[{};{}H", u32::from(row) + 1, u32::from(col) + 1)
}

pub fn cursor_visibility(visible: bool) -> &'static str {
    if visible {
        CURSOR_SHOW
    } else {
        CURSOR_HIDE
    }
}

/// SGR reproducing an attribute word on a real terminal
pub fn attribute_sgr(attr: Attribute) -> String {
    let sgr = |index: u8, base: u8, bright_base: u8| {
        if index < 8 {
            base + index
        } else {
            bright_base + (index - 8)
        }
    };
    format!(
        "\x1b[{};{}m",
        sgr(attr.foreground(), 30, 90),
        sgr(attr.background(), 40, 100)
    )
}
