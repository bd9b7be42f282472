//! In-process console subsystem
//!
//! `VirtualConsole` owns a set of screen buffers and the presented-buffer
//! selection, and enforces the same geometry rules a native console does:
//! a window never extends past its buffer, never exceeds the largest window
//! size, and a buffer never shrinks below its window or the configured
//! minimum.
//!
//! It also carries the hooks tests need: live-buffer accounting and one-shot
//! fault injection per primitive.

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::app::ConsoleConfig;
use crate::core::{Attribute, Coord, Rect, Snapshot};

use super::screen_buffer::ScreenBuffer;
use super::{
    ActiveBuffer, BufferInfo, Console, ConsoleCall, ConsoleResult, CursorInfo, ErrorCode, Handle,
    OutputMode,
};

/// Handle of the console's own output buffer
const STANDARD_OUTPUT: Handle = Handle::from_raw(1);

#[derive(Debug)]
struct ConsoleState {
    buffers: BTreeMap<Handle, ScreenBuffer>,
    next_handle: u32,
    active: ActiveBuffer,
    last_error: ErrorCode,
    /// Pending one-shot failures
    faults: Vec<(ConsoleCall, ErrorCode)>,
}

impl ConsoleState {
    fn take_fault(&mut self, call: ConsoleCall) -> Option<ErrorCode> {
        let index = self.faults.iter().position(|(c, _)| *c == call)?;
        Some(self.faults.remove(index).1)
    }

    fn buffer(&mut self, handle: Handle) -> ConsoleResult<&mut ScreenBuffer> {
        self.buffers
            .get_mut(&handle)
            .ok_or(ErrorCode::INVALID_HANDLE)
    }
}

/// A console subsystem living entirely in memory
#[derive(Debug)]
pub struct VirtualConsole {
    config: ConsoleConfig,
    state: RefCell<ConsoleState>,
}

impl Default for VirtualConsole {
    fn default() -> Self {
        Self::new(ConsoleConfig::default())
    }
}

impl VirtualConsole {
    pub fn new(config: ConsoleConfig) -> Self {
        let mut buffers = BTreeMap::new();
        buffers.insert(STANDARD_OUTPUT, ScreenBuffer::new(config.window_size()));

        debug!(
            "Virtual console with {} window (largest {})",
            config.window_size(),
            config.largest_window()
        );

        Self {
            config,
            state: RefCell::new(ConsoleState {
                buffers,
                next_handle: STANDARD_OUTPUT.raw() + 1,
                active: ActiveBuffer::new(STANDARD_OUTPUT),
                last_error: ErrorCode::SUCCESS,
                faults: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// The console's own output buffer, presented until another is activated
    pub fn standard_output(&self) -> Handle {
        STANDARD_OUTPUT
    }

    /// Copy of the current presented-buffer selection
    pub fn active_selection(&self) -> ActiveBuffer {
        self.state.borrow().active
    }

    /// Number of live screen buffers, the standard output buffer included
    pub fn screen_buffer_count(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Make the next invocation of `call` fail with `code`
    pub fn fail_next(&self, call: ConsoleCall, code: ErrorCode) {
        self.state.borrow_mut().faults.push((call, code));
    }

    /// Capture the full state of a buffer
    pub fn snapshot(&self, handle: Handle) -> ConsoleResult<Snapshot> {
        let state = self.state.borrow();
        state
            .buffers
            .get(&handle)
            .map(ScreenBuffer::snapshot)
            .ok_or(ErrorCode::INVALID_HANDLE)
    }

    /// Run one primitive: injected faults win, failures set the last error
    fn call<T>(
        &self,
        call: ConsoleCall,
        f: impl FnOnce(&mut ConsoleState) -> ConsoleResult<T>,
    ) -> ConsoleResult<T> {
        let mut state = self.state.borrow_mut();
        let result = match state.take_fault(call) {
            Some(code) => Err(code),
            None => f(&mut *state),
        };
        if let Err(code) = &result {
            trace!("{:?} failed: {}", call, code);
            state.last_error = *code;
        }
        result
    }

    fn with_buffer<T>(
        &self,
        call: ConsoleCall,
        handle: Handle,
        f: impl FnOnce(&mut ScreenBuffer) -> ConsoleResult<T>,
    ) -> ConsoleResult<T> {
        self.call(call, |state| f(state.buffer(handle)?))
    }
}

impl Console for VirtualConsole {
    fn create_screen_buffer(&self) -> ConsoleResult<Handle> {
        let limit = self.config.max_screen_buffers;
        let size = self.config.window_size();
        self.call(ConsoleCall::CreateScreenBuffer, |state| {
            // The standard output buffer does not count against the limit
            if state.buffers.len() > limit {
                return Err(ErrorCode::NOT_ENOUGH_MEMORY);
            }
            let handle = Handle::from_raw(state.next_handle);
            state.next_handle += 1;
            state.buffers.insert(handle, ScreenBuffer::new(size));
            debug!("Created screen buffer {}", handle);
            Ok(handle)
        })
    }

    fn close_handle(&self, handle: Handle) -> ConsoleResult<()> {
        self.call(ConsoleCall::CloseHandle, |state| {
            if handle == state.active.standard() {
                return Err(ErrorCode::ACCESS_DENIED);
            }
            state
                .buffers
                .remove(&handle)
                .ok_or(ErrorCode::INVALID_HANDLE)?;
            if state.active.release(handle) {
                debug!("Presented buffer {} released, standard output restored", handle);
            }
            debug!("Closed screen buffer {}", handle);
            Ok(())
        })
    }

    fn active_screen_buffer(&self) -> ConsoleResult<Handle> {
        self.call(ConsoleCall::ActiveScreenBuffer, |state| {
            Ok(state.active.presented())
        })
    }

    fn set_active_screen_buffer(&self, handle: Handle) -> ConsoleResult<()> {
        self.call(ConsoleCall::SetActiveScreenBuffer, |state| {
            state.buffer(handle)?;
            state.active.present(handle);
            debug!("Presenting screen buffer {}", handle);
            Ok(())
        })
    }

    fn screen_buffer_info(&self, handle: Handle) -> ConsoleResult<BufferInfo> {
        let largest = self.config.largest_window();
        self.with_buffer(ConsoleCall::ScreenBufferInfo, handle, |buffer| {
            Ok(buffer.info(largest))
        })
    }

    fn set_screen_buffer_size(&self, handle: Handle, size: Coord) -> ConsoleResult<()> {
        let accepted = self.config.accepts_buffer(size);
        self.with_buffer(ConsoleCall::SetScreenBufferSize, handle, |buffer| {
            if !accepted || !buffer.window().fits_within(size) {
                return Err(ErrorCode::INVALID_PARAMETER);
            }
            buffer.resize(size);
            Ok(())
        })
    }

    fn set_window_info(&self, handle: Handle, window: Rect) -> ConsoleResult<()> {
        let largest = self.config.largest_window();
        self.with_buffer(ConsoleCall::SetWindowInfo, handle, |buffer| {
            if window.is_empty()
                || !window.fits_within(buffer.size())
                || window.width > largest.x
                || window.height > largest.y
            {
                return Err(ErrorCode::INVALID_PARAMETER);
            }
            buffer.set_window(window);
            Ok(())
        })
    }

    fn output_mode(&self, handle: Handle) -> ConsoleResult<OutputMode> {
        self.with_buffer(ConsoleCall::OutputMode, handle, |buffer| Ok(buffer.mode()))
    }

    fn set_output_mode(&self, handle: Handle, mode: OutputMode) -> ConsoleResult<()> {
        self.with_buffer(ConsoleCall::SetOutputMode, handle, |buffer| {
            buffer.set_mode(mode);
            Ok(())
        })
    }

    fn set_cursor_position(&self, handle: Handle, position: Coord) -> ConsoleResult<()> {
        self.with_buffer(ConsoleCall::SetCursorPosition, handle, |buffer| {
            buffer.set_cursor_position(position)
        })
    }

    fn cursor_info(&self, handle: Handle) -> ConsoleResult<CursorInfo> {
        self.with_buffer(ConsoleCall::CursorInfo, handle, |buffer| {
            Ok(buffer.cursor_info())
        })
    }

    fn write_text(&self, handle: Handle, text: &str) -> ConsoleResult<usize> {
        self.with_buffer(ConsoleCall::WriteText, handle, |buffer| {
            trace!("write {} chars to {}", text.chars().count(), handle);
            Ok(buffer.write(text))
        })
    }

    fn read_output_characters(
        &self,
        handle: Handle,
        origin: Coord,
        length: usize,
    ) -> ConsoleResult<String> {
        self.with_buffer(ConsoleCall::ReadCharacters, handle, |buffer| {
            buffer.read_characters(origin, length)
        })
    }

    fn read_output_attributes(
        &self,
        handle: Handle,
        origin: Coord,
        length: usize,
    ) -> ConsoleResult<Vec<Attribute>> {
        self.with_buffer(ConsoleCall::ReadAttributes, handle, |buffer| {
            buffer.read_attributes(origin, length)
        })
    }

    fn last_error(&self) -> ErrorCode {
        self.state.borrow().last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> VirtualConsole {
        VirtualConsole::new(ConsoleConfig {
            window_columns: 120,
            window_rows: 30,
            largest_window_columns: 160,
            largest_window_rows: 50,
            min_buffer_columns: 20,
            min_buffer_rows: 1,
            max_screen_buffers: 2,
            ..Default::default()
        })
    }

    #[test]
    fn test_new_buffer_matches_window() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        let info = console.screen_buffer_info(handle).unwrap();
        assert_eq!(info.size, Coord::new(120, 30));
        assert_eq!(info.window, Rect::at_origin(120, 30));
        assert_eq!(info.largest_window, Coord::new(160, 50));
        assert_eq!(info.attributes, Attribute::DEFAULT);
    }

    #[test]
    fn test_buffer_limit() {
        let console = console();
        console.create_screen_buffer().unwrap();
        let second = console.create_screen_buffer().unwrap();
        assert_eq!(
            console.create_screen_buffer(),
            Err(ErrorCode::NOT_ENOUGH_MEMORY)
        );
        assert_eq!(console.last_error(), ErrorCode::NOT_ENOUGH_MEMORY);

        console.close_handle(second).unwrap();
        assert!(console.create_screen_buffer().is_ok());
    }

    #[test]
    fn test_handles_are_not_reused() {
        let console = console();
        let first = console.create_screen_buffer().unwrap();
        console.close_handle(first).unwrap();
        let second = console.create_screen_buffer().unwrap();
        assert_ne!(first, second);
        assert_eq!(
            console.screen_buffer_info(first),
            Err(ErrorCode::INVALID_HANDLE)
        );
    }

    #[test]
    fn test_double_close_fails() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        assert!(console.close_handle(handle).is_ok());
        assert_eq!(console.close_handle(handle), Err(ErrorCode::INVALID_HANDLE));
    }

    #[test]
    fn test_standard_output_cannot_be_closed() {
        let console = console();
        assert_eq!(
            console.close_handle(console.standard_output()),
            Err(ErrorCode::ACCESS_DENIED)
        );
    }

    #[test]
    fn test_buffer_cannot_shrink_below_window() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        assert_eq!(
            console.set_screen_buffer_size(handle, Coord::new(80, 20)),
            Err(ErrorCode::INVALID_PARAMETER)
        );

        console
            .set_window_info(handle, Rect::at_origin(80, 20))
            .unwrap();
        assert!(console
            .set_screen_buffer_size(handle, Coord::new(80, 20))
            .is_ok());
    }

    #[test]
    fn test_window_cannot_exceed_buffer() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        assert_eq!(
            console.set_window_info(handle, Rect::at_origin(140, 30)),
            Err(ErrorCode::INVALID_PARAMETER)
        );

        console
            .set_screen_buffer_size(handle, Coord::new(140, 30))
            .unwrap();
        assert!(console
            .set_window_info(handle, Rect::at_origin(140, 30))
            .is_ok());
    }

    #[test]
    fn test_window_limited_by_largest_window() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        console
            .set_screen_buffer_size(handle, Coord::new(200, 60))
            .unwrap();
        assert_eq!(
            console.set_window_info(handle, Rect::at_origin(200, 30)),
            Err(ErrorCode::INVALID_PARAMETER)
        );
        assert_eq!(
            console.set_window_info(handle, Rect::at_origin(0, 30)),
            Err(ErrorCode::INVALID_PARAMETER)
        );
    }

    #[test]
    fn test_buffer_minimum_size() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        console
            .set_window_info(handle, Rect::at_origin(10, 10))
            .unwrap();
        assert_eq!(
            console.set_screen_buffer_size(handle, Coord::new(10, 10)),
            Err(ErrorCode::INVALID_PARAMETER)
        );
    }

    #[test]
    fn test_buffer_maximum_size() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        assert_eq!(
            console.set_screen_buffer_size(handle, Coord::new(u16::MAX, 30)),
            Err(ErrorCode::INVALID_PARAMETER)
        );
        assert_eq!(
            console.set_screen_buffer_size(handle, Coord::new(32767, 32767)),
            Err(ErrorCode::INVALID_PARAMETER)
        );
        assert_eq!(console.last_error(), ErrorCode::INVALID_PARAMETER);
        assert_eq!(
            console.screen_buffer_info(handle).unwrap().size,
            Coord::new(120, 30)
        );
        assert!(console
            .set_screen_buffer_size(handle, Coord::new(32767, 30))
            .is_ok());
    }

    #[test]
    fn test_closing_presented_buffer_restores_standard_output() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        console.set_active_screen_buffer(handle).unwrap();
        assert_eq!(console.active_screen_buffer(), Ok(handle));

        console.close_handle(handle).unwrap();
        assert_eq!(
            console.active_screen_buffer(),
            Ok(console.standard_output())
        );
    }

    #[test]
    fn test_activating_unknown_handle_fails() {
        let console = console();
        assert_eq!(
            console.set_active_screen_buffer(Handle::from_raw(99)),
            Err(ErrorCode::INVALID_HANDLE)
        );
        assert_eq!(console.active_selection().presented(), console.standard_output());
    }

    #[test]
    fn test_injected_fault_is_one_shot() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        console.fail_next(ConsoleCall::WriteText, ErrorCode(232));

        assert_eq!(console.write_text(handle, "x"), Err(ErrorCode(232)));
        assert_eq!(console.last_error(), ErrorCode(232));
        assert_eq!(console.write_text(handle, "x"), Ok(1));
    }

    #[test]
    fn test_snapshot_of_written_buffer() {
        let console = console();
        let handle = console.create_screen_buffer().unwrap();
        console.write_text(handle, "hi").unwrap();
        let snapshot = console.snapshot(handle).unwrap();
        assert!(snapshot.lines[0].starts_with("hi"));
        assert_eq!(snapshot.cursor.col, 2);
    }
}
