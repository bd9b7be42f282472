//! Console Platform Boundary
//!
//! The console subsystem that surfaces are built on. It offers blocking
//! primitives over screen-buffer objects: allocation and release, window and
//! buffer geometry, cursor placement, text writes, read-back of characters
//! and attribute words, and selection of the presented buffer.
//!
//! Every primitive returns a [`ConsoleResult`]; a failing call also records
//! its code as the console's last error.
//!
//! [`VirtualConsole`] is a complete in-process implementation of the
//! boundary. It interprets escape sequences into a cell grid, which makes it
//! usable both headless and as a test double. [`TtyPresenter`] puts its
//! presented buffer on a real terminal.

mod active;
mod screen_buffer;
mod tty;
mod virtual_console;

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::{Attribute, Coord, Rect};

pub use active::ActiveBuffer;
pub use tty::{terminal_size, TtyPresenter};
pub use virtual_console::VirtualConsole;

/// Result type for console primitives
pub type ConsoleResult<T> = Result<T, ErrorCode>;

/// Opaque reference to a screen-buffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(u32);

impl Handle {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Platform error code reported by a failing console call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[error("platform error code {0}")]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const SUCCESS: ErrorCode = ErrorCode(0);
    pub const ACCESS_DENIED: ErrorCode = ErrorCode(5);
    pub const INVALID_HANDLE: ErrorCode = ErrorCode(6);
    pub const NOT_ENOUGH_MEMORY: ErrorCode = ErrorCode(8);
    pub const INVALID_PARAMETER: ErrorCode = ErrorCode(87);

    pub const fn raw(self) -> u32 {
        self.0
    }
}

bitflags! {
    /// Output mode flags of a screen buffer
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OutputMode: u32 {
        /// C0 controls (CR, LF, BS, HT, BEL) act instead of printing
        const PROCESSED_OUTPUT = 0x1;
        /// The cursor wraps to the next row at the end of a line
        const WRAP_AT_EOL = 0x2;
        /// Escape sequences are interpreted instead of printed
        const VIRTUAL_TERMINAL_PROCESSING = 0x4;
    }
}

/// Geometry and state of a screen buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferInfo {
    /// Buffer size in cells
    pub size: Coord,
    /// Cursor position
    pub cursor: Coord,
    /// Attribute applied to newly written characters
    pub attributes: Attribute,
    /// Visible window inside the buffer
    pub window: Rect,
    /// Largest window the display can show
    pub largest_window: Coord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorInfo {
    pub visible: bool,
}

/// Console primitives, named for fault injection and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleCall {
    CreateScreenBuffer,
    CloseHandle,
    ActiveScreenBuffer,
    SetActiveScreenBuffer,
    ScreenBufferInfo,
    SetScreenBufferSize,
    SetWindowInfo,
    OutputMode,
    SetOutputMode,
    SetCursorPosition,
    CursorInfo,
    WriteText,
    ReadCharacters,
    ReadAttributes,
}

/// The console subsystem a surface drives.
///
/// All primitives are blocking and take `&self`; implementations keep their
/// state behind interior mutability so several surfaces can share one
/// console. Only one buffer per console is presented at a time.
pub trait Console {
    /// Allocate a new screen buffer
    fn create_screen_buffer(&self) -> ConsoleResult<Handle>;

    /// Release a screen buffer
    fn close_handle(&self, handle: Handle) -> ConsoleResult<()>;

    /// The buffer currently presented as visible output
    fn active_screen_buffer(&self) -> ConsoleResult<Handle>;

    /// Present a buffer as the visible output
    fn set_active_screen_buffer(&self, handle: Handle) -> ConsoleResult<()>;

    fn screen_buffer_info(&self, handle: Handle) -> ConsoleResult<BufferInfo>;

    /// Resize the buffer. Fails if the buffer would become smaller than its
    /// window.
    fn set_screen_buffer_size(&self, handle: Handle, size: Coord) -> ConsoleResult<()>;

    /// Move or resize the visible window. Fails if the window would extend
    /// past the buffer or exceed the largest window size.
    fn set_window_info(&self, handle: Handle, window: Rect) -> ConsoleResult<()>;

    fn output_mode(&self, handle: Handle) -> ConsoleResult<OutputMode>;

    fn set_output_mode(&self, handle: Handle, mode: OutputMode) -> ConsoleResult<()>;

    fn set_cursor_position(&self, handle: Handle, position: Coord) -> ConsoleResult<()>;

    fn cursor_info(&self, handle: Handle) -> ConsoleResult<CursorInfo>;

    /// Write text at the cursor, returning the number of characters written
    fn write_text(&self, handle: Handle, text: &str) -> ConsoleResult<usize>;

    /// Read up to `length` characters starting at `origin`, row-major
    fn read_output_characters(
        &self,
        handle: Handle,
        origin: Coord,
        length: usize,
    ) -> ConsoleResult<String>;

    /// Read up to `length` attribute words starting at `origin`, row-major
    fn read_output_attributes(
        &self,
        handle: Handle,
        origin: Coord,
        length: usize,
    ) -> ConsoleResult<Vec<Attribute>>;

    /// Code recorded by the most recent failing call
    fn last_error(&self) -> ErrorCode;
}
