//! Terminal surfaces
//!
//! A [`TerminalSurface`] owns one screen buffer of a [`Console`] for its whole
//! lifetime and exposes coordinate-addressed writes, cursor control and
//! read-back on top of it. Geometry is never cached: every query goes to the
//! console.
//!
//! The buffer is released when the surface is dropped, whichever way that
//! happens, including when construction fails halfway.

mod double_buffer;
mod error;

use tracing::{debug, trace, warn};

use crate::console::{BufferInfo, Console, ErrorCode, Handle, OutputMode};
use crate::core::{Coord, Rect};
use crate::escape::{self, Colour};

pub use double_buffer::DoubleBuffer;
pub use error::{SurfaceError, SurfaceResult};

/// Colour indices decoded from a cell's attribute word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colours {
    pub foreground: u8,
    pub background: u8,
}

impl Colours {
    pub fn foreground_colour(&self) -> Option<Colour> {
        Colour::from_index(self.foreground)
    }

    pub fn background_colour(&self) -> Option<Colour> {
        Colour::from_index(self.background)
    }
}

/// One screen buffer bound to a console
pub struct TerminalSurface<'c, C: Console + ?Sized> {
    console: &'c C,
    handle: Handle,
}

impl<'c, C: Console + ?Sized> TerminalSurface<'c, C> {
    /// Acquire a screen buffer, enable escape-sequence processing, clear it
    /// and size it to its window.
    pub fn new(console: &'c C) -> SurfaceResult<Self> {
        let handle = console
            .create_screen_buffer()
            .map_err(SurfaceError::acquisition("Error creating screen buffer"))?;

        // From here on, dropping `surface` releases the handle
        let surface = Self { console, handle };

        let info = surface.buffer_info()?;

        let mode = console
            .output_mode(handle)
            .map_err(SurfaceError::read("Error getting console mode"))?;
        console
            .set_output_mode(handle, mode | OutputMode::VIRTUAL_TERMINAL_PROCESSING)
            .map_err(SurfaceError::platform_call("Error setting console mode"))?;

        surface.clear_screen()?;
        surface.set_size(info.window.width, info.window.height)?;

        debug!("Surface {} created ({})", handle, info.window.size());
        Ok(surface)
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Whether this surface's buffer is the one presented
    pub fn is_active(&self) -> SurfaceResult<bool> {
        let presented = self
            .console
            .active_screen_buffer()
            .map_err(SurfaceError::read("Error getting active screen buffer"))?;
        Ok(presented == self.handle)
    }

    /// Present this surface's buffer
    pub fn set_active(&self) -> SurfaceResult<()> {
        self.console
            .set_active_screen_buffer(self.handle)
            .map_err(SurfaceError::platform_call("Error setting screen buffer to active"))?;
        debug!("Surface {} presented", self.handle);
        Ok(())
    }

    pub fn buffer_info(&self) -> SurfaceResult<BufferInfo> {
        self.console
            .screen_buffer_info(self.handle)
            .map_err(SurfaceError::read("Error getting screen buffer info"))
    }

    pub fn width(&self) -> SurfaceResult<u16> {
        Ok(self.buffer_info()?.size.x)
    }

    pub fn height(&self) -> SurfaceResult<u16> {
        Ok(self.buffer_info()?.size.y)
    }

    /// Number of cells in the buffer
    pub fn size(&self) -> SurfaceResult<usize> {
        Ok(self.buffer_info()?.size.area())
    }

    /// Resize buffer and window together.
    ///
    /// A window may never be larger than its buffer, so shrinking goes
    /// window-first and growing goes buffer-first. When one dimension shrinks
    /// while the other grows, the interim window takes the smaller of old and
    /// new in each dimension.
    pub fn set_size(&self, width: u16, height: u16) -> SurfaceResult<()> {
        let current = self.buffer_info()?.size;

        if width < current.x || height < current.y {
            let interim = Rect::at_origin(width.min(current.x), height.min(current.y));
            self.console
                .set_window_info(self.handle, interim)
                .map_err(SurfaceError::platform_call("Error setting console window size"))?;
        }

        self.console
            .set_screen_buffer_size(self.handle, Coord::new(width, height))
            .map_err(SurfaceError::platform_call("Error setting screen buffer size"))?;

        if width > current.x || height > current.y {
            self.console
                .set_window_info(self.handle, Rect::at_origin(width, height))
                .map_err(SurfaceError::platform_call("Error setting console window size"))?;
        }

        debug!(
            "Surface {} resized from {} to {}x{}",
            self.handle, current, width, height
        );
        Ok(())
    }

    /// Move the cursor to `(x, y)` and write `text` there
    pub fn write_at(&self, x: u16, y: u16, text: &str) -> SurfaceResult<usize> {
        self.set_cursor_position(x, y)?;
        self.write(text)
    }

    /// Write `text` at the cursor
    pub fn write(&self, text: &str) -> SurfaceResult<usize> {
        self.write_with_context(text, "Error writing to screen")
    }

    /// Write `text` at `(x, y)` in the given colours. A `None` channel keeps
    /// the buffer's current rendition for it.
    pub fn write_coloured_at(
        &self,
        x: u16,
        y: u16,
        text: &str,
        foreground: Option<Colour>,
        background: Option<Colour>,
    ) -> SurfaceResult<usize> {
        self.write_at(x, y, &escape::encode_coloured(text, foreground, background))
    }

    /// Blank the whole buffer and home the cursor
    pub fn clear_screen(&self) -> SurfaceResult<()> {
        self.set_cursor_position(0, 0)?;
        self.write_with_context(escape::CLEAR_SCREEN, "Error clearing screen buffer")?;
        Ok(())
    }

    /// Place the cursor. Range checking is left to the console.
    pub fn set_cursor_position(&self, x: u16, y: u16) -> SurfaceResult<()> {
        self.console
            .set_cursor_position(self.handle, Coord::new(x, y))
            .map_err(SurfaceError::platform_call("Error setting cursor position"))
    }

    pub fn cursor_position(&self) -> SurfaceResult<Coord> {
        Ok(self.buffer_info()?.cursor)
    }

    pub fn set_cursor_visibility(&self, visible: bool) -> SurfaceResult<()> {
        self.write_with_context(
            escape::cursor_visibility(visible),
            "Error setting cursor visibility",
        )?;
        Ok(())
    }

    pub fn is_cursor_visible(&self) -> SurfaceResult<bool> {
        let info = self
            .console
            .cursor_info(self.handle)
            .map_err(SurfaceError::read("Error getting cursor info"))?;
        Ok(info.visible)
    }

    /// Read `length` characters from `(x, y)` onwards, continuing on the
    /// following rows. Positions past the end of the buffer read as spaces,
    /// so the result always holds exactly `length` characters.
    pub fn read_text_at(&self, x: u16, y: u16, length: usize) -> SurfaceResult<String> {
        let mut text = self
            .console
            .read_output_characters(self.handle, Coord::new(x, y), length)
            .map_err(SurfaceError::read("Error getting screen text"))?;
        let read = text.chars().count();
        text.extend(std::iter::repeat(' ').take(length.saturating_sub(read)));
        Ok(text)
    }

    pub fn read_all_text(&self) -> SurfaceResult<String> {
        self.read_text_at(0, 0, self.size()?)
    }

    /// Colours stored at `(x, y)`. Only the first cell of the run is
    /// decoded; `length` is passed through to the console read.
    pub fn colours_at(&self, x: u16, y: u16, length: usize) -> SurfaceResult<Colours> {
        let attributes = self
            .console
            .read_output_attributes(self.handle, Coord::new(x, y), length.max(1))
            .map_err(SurfaceError::read("Error getting screen colours"))?;
        let first = attributes.first().ok_or(SurfaceError::Read {
            context: "Error getting screen colours",
            code: ErrorCode::INVALID_PARAMETER,
        })?;
        Ok(Colours {
            foreground: first.foreground(),
            background: first.background(),
        })
    }

    fn write_with_context(&self, text: &str, context: &'static str) -> SurfaceResult<usize> {
        let written = self
            .console
            .write_text(self.handle, text)
            .map_err(SurfaceError::write(context))?;
        trace!("Surface {}: wrote {} chars", self.handle, written);
        Ok(written)
    }
}

impl<C: Console + ?Sized> Drop for TerminalSurface<'_, C> {
    fn drop(&mut self) {
        match self.console.close_handle(self.handle) {
            Ok(()) => debug!("Surface {} released", self.handle),
            Err(code) => warn!("Failed to release surface {}: {}", self.handle, code),
        }
    }
}

impl<C: Console + ?Sized> std::fmt::Debug for TerminalSurface<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSurface")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ConsoleConfig;
    use crate::console::{ConsoleCall, ErrorCode, VirtualConsole};

    fn console() -> VirtualConsole {
        VirtualConsole::new(ConsoleConfig {
            window_columns: 20,
            window_rows: 5,
            ..Default::default()
        })
    }

    #[test]
    fn test_new_surface_matches_window() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();
        assert_eq!(surface.width().unwrap(), 20);
        assert_eq!(surface.height().unwrap(), 5);
        assert_eq!(surface.size().unwrap(), 100);
        assert_eq!(surface.cursor_position().unwrap(), Coord::new(0, 0));
        assert!(surface.is_cursor_visible().unwrap());
        assert!(!surface.is_active().unwrap());

        let mode = console.output_mode(surface.handle()).unwrap();
        assert!(mode.contains(OutputMode::VIRTUAL_TERMINAL_PROCESSING));
    }

    #[test]
    fn test_write_at_advances_cursor() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();
        assert_eq!(surface.write_at(3, 1, "abc").unwrap(), 3);
        assert_eq!(surface.cursor_position().unwrap(), Coord::new(6, 1));
        assert_eq!(surface.read_text_at(3, 1, 3).unwrap(), "abc");

        surface.write("de").unwrap();
        assert_eq!(surface.read_text_at(3, 1, 5).unwrap(), "abcde");
    }

    #[test]
    fn test_coloured_write_stores_attributes() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();
        surface
            .write_coloured_at(0, 0, "hi", Some(Colour::Yellow), Some(Colour::Blue))
            .unwrap();
        let colours = surface.colours_at(0, 0, 2).unwrap();
        assert_eq!(colours.foreground_colour(), Some(Colour::Yellow));
        assert_eq!(colours.background_colour(), Some(Colour::Blue));
        assert_eq!(surface.read_text_at(0, 0, 2).unwrap(), "hi");

        // The trailing reset leaves later text in the default rendition
        surface.write("x").unwrap();
        let colours = surface.colours_at(2, 0, 0).unwrap();
        assert_eq!((colours.foreground, colours.background), (7, 0));
    }

    #[test]
    fn test_cursor_visibility() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();
        surface.set_cursor_visibility(false).unwrap();
        assert!(!surface.is_cursor_visible().unwrap());
        assert_eq!(surface.cursor_position().unwrap(), Coord::new(0, 0));
        surface.set_cursor_visibility(true).unwrap();
        assert!(surface.is_cursor_visible().unwrap());
    }

    #[test]
    fn test_cursor_out_of_range_is_platform_error() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();
        let err = surface.set_cursor_position(20, 0).unwrap_err();
        assert!(matches!(err, SurfaceError::PlatformCall { .. }));
        assert_eq!(err.code(), ErrorCode::INVALID_PARAMETER);
    }

    #[test]
    fn test_write_failure() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();
        console.fail_next(ConsoleCall::WriteText, ErrorCode(232));
        let err = surface.write_at(0, 0, "x").unwrap_err();
        assert_eq!(
            err,
            SurfaceError::Write {
                context: "Error writing to screen",
                code: ErrorCode(232),
            }
        );
    }

    #[test]
    fn test_clear_screen_blanks_buffer() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();
        surface.write_at(5, 2, "junk").unwrap();
        surface.clear_screen().unwrap();
        assert_eq!(surface.read_all_text().unwrap(), " ".repeat(100));
        assert_eq!(surface.cursor_position().unwrap(), Coord::new(0, 0));
    }

    #[test]
    fn test_construction_failure_releases_handle() {
        let console = console();
        console.fail_next(ConsoleCall::SetOutputMode, ErrorCode::ACCESS_DENIED);
        let err = TerminalSurface::new(&console).unwrap_err();
        assert_eq!(err.context(), "Error setting console mode");
        assert_eq!(console.screen_buffer_count(), 1);
    }

    #[test]
    fn test_acquisition_failure() {
        let console = console();
        console.fail_next(ConsoleCall::CreateScreenBuffer, ErrorCode::NOT_ENOUGH_MEMORY);
        let err = TerminalSurface::new(&console).unwrap_err();
        assert!(matches!(err, SurfaceError::Acquisition { .. }));
        assert_eq!(err.code(), ErrorCode::NOT_ENOUGH_MEMORY);
    }

    #[test]
    fn test_read_failures_are_read_errors() {
        let console = console();
        let surface = TerminalSurface::new(&console).unwrap();

        console.fail_next(ConsoleCall::ScreenBufferInfo, ErrorCode::INVALID_HANDLE);
        assert!(matches!(surface.width(), Err(SurfaceError::Read { .. })));

        console.fail_next(ConsoleCall::ReadAttributes, ErrorCode::INVALID_HANDLE);
        assert!(matches!(
            surface.colours_at(0, 0, 1),
            Err(SurfaceError::Read { .. })
        ));
    }
}
