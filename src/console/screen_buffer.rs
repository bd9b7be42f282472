//! Screen Buffer
//!
//! One console screen-buffer object: the cell grid, the cursor, the visible
//! window and the output mode. Written text goes through the escape-sequence
//! parser when virtual-terminal processing is enabled and is stored as
//! characters plus resolved attribute words.

use tracing::{debug, trace};

use crate::core::{Attribute, Cell, Coord, Cursor, Grid, Rect, SavedCursor, Snapshot};
use crate::parser::{Action, ControlCode, CsiAction, EscAction, Parser};

use super::{BufferInfo, ConsoleResult, CursorInfo, ErrorCode, OutputMode};

const TAB_WIDTH: usize = 8;

#[derive(Debug)]
pub(super) struct ScreenBuffer {
    grid: Grid,
    cursor: Cursor,
    saved_cursor: SavedCursor,
    window: Rect,
    mode: OutputMode,
    parser: Parser,
}

impl ScreenBuffer {
    /// A blank buffer whose window covers all of it
    pub fn new(size: Coord) -> Self {
        Self {
            grid: Grid::new(size.x as usize, size.y as usize),
            cursor: Cursor::new(),
            saved_cursor: SavedCursor::default(),
            window: Rect::at_origin(size.x, size.y),
            mode: OutputMode::PROCESSED_OUTPUT | OutputMode::WRAP_AT_EOL,
            parser: Parser::new(),
        }
    }

    pub fn size(&self) -> Coord {
        Coord::new(self.grid.cols() as u16, self.grid.rows() as u16)
    }

    pub fn window(&self) -> Rect {
        self.window
    }

    pub fn info(&self, largest_window: Coord) -> BufferInfo {
        BufferInfo {
            size: self.size(),
            cursor: Coord::new(self.cursor.col as u16, self.cursor.row as u16),
            attributes: self.cursor.attr,
            window: self.window,
            largest_window,
        }
    }

    pub fn cursor_info(&self) -> CursorInfo {
        CursorInfo {
            visible: self.cursor.visible,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: OutputMode) {
        if !mode.contains(OutputMode::VIRTUAL_TERMINAL_PROCESSING) {
            // A half-parsed sequence must not swallow later literal text
            self.parser.reset();
        }
        self.mode = mode;
    }

    /// Resize the grid; the caller has validated `size` against the window.
    pub fn resize(&mut self, size: Coord) {
        self.grid.resize(size.x as usize, size.y as usize);
        self.cursor.clamp(self.grid.cols(), self.grid.rows());
    }

    /// Replace the window; the caller has validated it against the buffer.
    pub fn set_window(&mut self, window: Rect) {
        self.window = window;
    }

    pub fn set_cursor_position(&mut self, position: Coord) -> ConsoleResult<()> {
        if !self.contains(position) {
            return Err(ErrorCode::INVALID_PARAMETER);
        }
        self.cursor.move_to(
            position.x as usize,
            position.y as usize,
            self.grid.cols(),
            self.grid.rows(),
        );
        Ok(())
    }

    /// Write text at the cursor, returning the number of characters consumed
    pub fn write(&mut self, text: &str) -> usize {
        if self.mode.contains(OutputMode::VIRTUAL_TERMINAL_PROCESSING) {
            for action in self.parser.feed(text) {
                self.apply(action);
            }
        } else {
            let processed = self.mode.contains(OutputMode::PROCESSED_OUTPUT);
            for c in text.chars() {
                match ControlCode::from_char(c) {
                    Some(code) if processed => self.control(code),
                    _ => self.print(c),
                }
            }
        }
        text.chars().count()
    }

    pub fn read_characters(&self, origin: Coord, length: usize) -> ConsoleResult<String> {
        if !self.contains(origin) {
            return Err(ErrorCode::INVALID_PARAMETER);
        }
        Ok(self
            .grid
            .run(origin.x as usize, origin.y as usize, length)
            .map(|cell| cell.ch)
            .collect())
    }

    pub fn read_attributes(&self, origin: Coord, length: usize) -> ConsoleResult<Vec<Attribute>> {
        if !self.contains(origin) {
            return Err(ErrorCode::INVALID_PARAMETER);
        }
        Ok(self
            .grid
            .run(origin.x as usize, origin.y as usize, length)
            .map(|cell| cell.attr)
            .collect())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.grid, &self.cursor, self.window)
    }

    fn contains(&self, position: Coord) -> bool {
        (position.x as usize) < self.grid.cols() && (position.y as usize) < self.grid.rows()
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Print(c) => self.print(c),
            Action::Control(code) => self.control(code),
            Action::Csi(csi) => self.csi(&csi),
            Action::Esc(esc) => self.esc(esc),
        }
    }

    fn print(&mut self, c: char) {
        let cols = self.grid.cols();
        if cols == 0 || self.grid.rows() == 0 {
            return;
        }

        if self.cursor.pending_wrap {
            self.newline();
        }

        let (col, row) = (self.cursor.col, self.cursor.row);
        let attr = self.cursor.attr;
        if let Some(cell) = self.grid.cell_mut(col, row) {
            *cell = Cell::with_attr(c, attr);
        }

        if col + 1 >= cols {
            // Delayed wrap: the cursor stays on the last column until the
            // next printable character arrives.
            self.cursor.pending_wrap = self.mode.contains(OutputMode::WRAP_AT_EOL);
        } else {
            self.cursor.col += 1;
        }
    }

    fn control(&mut self, code: ControlCode) {
        match code {
            ControlCode::Bell => trace!("bell"),
            ControlCode::Backspace => self.cursor.move_left(1),
            ControlCode::Tab => {
                let next = (self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH;
                self.cursor.move_right(next - self.cursor.col, self.grid.cols());
            }
            // Console newline semantics: LF also returns the carriage
            ControlCode::LineFeed => self.newline(),
            ControlCode::CarriageReturn => self.cursor.carriage_return(),
        }
    }

    fn newline(&mut self) {
        self.cursor.carriage_return();
        self.index();
    }

    /// Move down one row, scrolling the buffer at the bottom
    fn index(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.row + 1 >= self.grid.rows() {
            self.grid.scroll_up(self.cursor.attr);
        } else {
            self.cursor.row += 1;
        }
    }

    fn esc(&mut self, esc: EscAction) {
        match esc {
            EscAction::SaveCursor => self.saved_cursor = self.cursor.save(),
            EscAction::RestoreCursor => {
                let saved = self.saved_cursor;
                self.cursor
                    .restore(&saved, self.grid.cols(), self.grid.rows());
            }
            EscAction::Index => self.index(),
            EscAction::NextLine => self.newline(),
            EscAction::Unknown(c) => debug!("Unhandled ESC: {:?}", c),
        }
    }

    fn csi(&mut self, csi: &CsiAction) {
        let (cols, rows) = (self.grid.cols(), self.grid.rows());
        let n = csi.param_or_default(0, 1) as usize;

        if csi.private_marker == Some('?') {
            match csi.final_char {
                'h' | 'l' if csi.params.contains(&25) => {
                    self.cursor.visible = csi.final_char == 'h';
                }
                _ => debug!("Unhandled DEC mode: {:?} {}", csi.params, csi.final_char),
            }
            return;
        }

        match csi.final_char {
            'A' => self.cursor.move_up(n),
            'B' => self.cursor.move_down(n, rows),
            'C' => self.cursor.move_right(n, cols),
            'D' => self.cursor.move_left(n),
            'G' => {
                let row = self.cursor.row;
                self.cursor.move_to(n - 1, row, cols, rows);
            }
            'H' | 'f' => {
                let row = csi.param_or_default(0, 1) as usize - 1;
                let col = csi.param_or_default(1, 1) as usize - 1;
                self.cursor.move_to(col, row, cols, rows);
            }
            'J' => self.erase_in_display(csi.param(0, 0)),
            'K' => self.erase_in_line(csi.param(0, 0)),
            'm' => self.select_graphic_rendition(&csi.params),
            's' => self.saved_cursor = self.cursor.save(),
            'u' => {
                let saved = self.saved_cursor;
                self.cursor.restore(&saved, cols, rows);
            }
            _ => debug!("Unhandled CSI: {:?} {}", csi.private_marker, csi.final_char),
        }
    }

    fn erase_in_display(&mut self, mode: u16) {
        let attr = self.cursor.attr;
        let (col, row) = (self.cursor.col, self.cursor.row);
        let last_col = self.grid.cols().saturating_sub(1);
        match mode {
            0 => {
                if let Some(line) = self.grid.row_mut(row) {
                    line.erase_range(col, last_col, attr);
                }
                for r in row + 1..self.grid.rows() {
                    if let Some(line) = self.grid.row_mut(r) {
                        line.erase(attr);
                    }
                }
            }
            1 => {
                for r in 0..row {
                    if let Some(line) = self.grid.row_mut(r) {
                        line.erase(attr);
                    }
                }
                if let Some(line) = self.grid.row_mut(row) {
                    line.erase_range(0, col, attr);
                }
            }
            2 | 3 => self.grid.erase(attr),
            _ => debug!("Unhandled erase-in-display mode: {}", mode),
        }
    }

    fn erase_in_line(&mut self, mode: u16) {
        let attr = self.cursor.attr;
        let col = self.cursor.col;
        let last_col = self.grid.cols().saturating_sub(1);
        let Some(line) = self.grid.row_mut(self.cursor.row) else {
            return;
        };
        match mode {
            0 => line.erase_range(col, last_col, attr),
            1 => line.erase_range(0, col, attr),
            2 => line.erase(attr),
            _ => debug!("Unhandled erase-in-line mode: {}", mode),
        }
    }

    fn select_graphic_rendition(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.cursor.attr = Attribute::DEFAULT;
            return;
        }

        for &param in params {
            let attr = self.cursor.attr;
            self.cursor.attr = match param {
                0 => Attribute::DEFAULT,
                1 => attr.with_bright_foreground(true),
                22 => attr.with_bright_foreground(false),
                // Intensity from SGR 1 survives a colour change
                30..=37 => attr
                    .with_foreground((param - 30) as u8)
                    .with_bright_foreground(attr.is_bright_foreground()),
                39 => attr.with_foreground(Attribute::DEFAULT_FOREGROUND),
                40..=47 => attr.with_background((param - 40) as u8),
                49 => attr.with_background(Attribute::DEFAULT_BACKGROUND),
                90..=97 => attr.with_foreground((param - 90) as u8 + 8),
                100..=107 => attr.with_background((param - 100) as u8 + 8),
                _ => {
                    debug!("Unhandled SGR parameter: {}", param);
                    attr
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vt_buffer(cols: u16, rows: u16) -> ScreenBuffer {
        let mut buffer = ScreenBuffer::new(Coord::new(cols, rows));
        let mode = buffer.mode() | OutputMode::VIRTUAL_TERMINAL_PROCESSING;
        buffer.set_mode(mode);
        buffer
    }

    fn line(buffer: &ScreenBuffer, row: u16) -> String {
        let cols = buffer.size().x as usize;
        buffer.read_characters(Coord::new(0, row), cols).unwrap()
    }

    #[test]
    fn test_write_advances_cursor() {
        let mut buffer = vt_buffer(10, 3);
        assert_eq!(buffer.write("Hello"), 5);
        assert_eq!(line(&buffer, 0), "Hello     ");
        assert_eq!(buffer.info(Coord::new(10, 3)).cursor, Coord::new(5, 0));
    }

    #[test]
    fn test_escapes_are_literal_without_vt_processing() {
        let mut buffer = ScreenBuffer::new(Coord::new(10, 2));
        buffer.write("\x1b[31mA");
        assert_eq!(line(&buffer, 0), "\x1b[31mA   ");
        let attrs = buffer.read_attributes(Coord::new(0, 0), 1).unwrap();
        assert_eq!(attrs[0], Attribute::DEFAULT);
    }

    #[test]
    fn test_sgr_sets_and_resets_attributes() {
        let mut buffer = vt_buffer(10, 2);
        buffer.write("\x1b[32;44mAB\x1b[0mC");
        let attrs = buffer.read_attributes(Coord::new(0, 0), 3).unwrap();
        assert_eq!(attrs[0], Attribute::new(2, 4));
        assert_eq!(attrs[1], Attribute::new(2, 4));
        assert_eq!(attrs[2], Attribute::DEFAULT);
    }

    #[test]
    fn test_sgr_background_only_keeps_foreground() {
        let mut buffer = vt_buffer(10, 2);
        buffer.write("\x1b[45mX");
        let attrs = buffer.read_attributes(Coord::new(0, 0), 1).unwrap();
        assert_eq!(attrs[0].foreground(), Attribute::DEFAULT_FOREGROUND);
        assert_eq!(attrs[0].background(), 5);
    }

    #[test]
    fn test_bright_colors() {
        let mut buffer = vt_buffer(10, 2);
        buffer.write("\x1b[91;102mX\x1b[1;31mY");
        let attrs = buffer.read_attributes(Coord::new(0, 0), 2).unwrap();
        assert_eq!(attrs[0], Attribute::new(9, 10));
        assert_eq!(attrs[1].foreground(), 9);
    }

    #[test]
    fn test_bold_then_colour_stays_bright() {
        let mut buffer = vt_buffer(10, 2);
        buffer.write("\x1b[1m\x1b[31mA\x1b[22mB\x1b[0;32mC");
        let attrs = buffer.read_attributes(Coord::new(0, 0), 3).unwrap();
        assert_eq!(attrs[0].foreground(), 9);
        assert_eq!(attrs[1].foreground(), 1);
        assert_eq!(attrs[2].foreground(), 2);
    }

    #[test]
    fn test_clear_and_home() {
        let mut buffer = vt_buffer(5, 2);
        buffer.write("abcde12345");
        buffer.write("\x1b[2J\x1b[H");
        assert_eq!(line(&buffer, 0), "     ");
        assert_eq!(line(&buffer, 1), "     ");
        assert_eq!(buffer.info(Coord::new(5, 2)).cursor, Coord::new(0, 0));
    }

    #[test]
    fn test_delayed_wrap_fills_last_cell_without_scrolling() {
        let mut buffer = vt_buffer(3, 2);
        buffer.write("abcdef");
        assert_eq!(line(&buffer, 0), "abc");
        assert_eq!(line(&buffer, 1), "def");
        assert_eq!(buffer.info(Coord::new(3, 2)).cursor, Coord::new(2, 1));

        // The next character wraps and scrolls
        buffer.write("g");
        assert_eq!(line(&buffer, 0), "def");
        assert_eq!(line(&buffer, 1), "g  ");
    }

    #[test]
    fn test_newline_returns_carriage() {
        let mut buffer = vt_buffer(6, 3);
        buffer.write("ab\ncd\r\nef");
        assert_eq!(line(&buffer, 0), "ab    ");
        assert_eq!(line(&buffer, 1), "cd    ");
        assert_eq!(line(&buffer, 2), "ef    ");
    }

    #[test]
    fn test_cursor_visibility_sequences() {
        let mut buffer = vt_buffer(4, 1);
        assert!(buffer.cursor_info().visible);
        buffer.write("\x1b[?25l");
        assert!(!buffer.cursor_info().visible);
        buffer.write("\x1b[?25h");
        assert!(buffer.cursor_info().visible);
    }

    #[test]
    fn test_cursor_position_sequence_is_one_based() {
        let mut buffer = vt_buffer(10, 5);
        buffer.write("\x1b[3;5HX");
        let text = buffer.read_characters(Coord::new(4, 2), 1).unwrap();
        assert_eq!(text, "X");
    }

    #[test]
    fn test_set_cursor_position_rejects_out_of_range() {
        let mut buffer = vt_buffer(10, 5);
        assert_eq!(
            buffer.set_cursor_position(Coord::new(10, 0)),
            Err(ErrorCode::INVALID_PARAMETER)
        );
        assert!(buffer.set_cursor_position(Coord::new(9, 4)).is_ok());
    }

    #[test]
    fn test_erase_in_line_uses_current_attribute() {
        let mut buffer = vt_buffer(6, 1);
        buffer.write("abcdef\x1b[1;3H\x1b[41m\x1b[K");
        assert_eq!(line(&buffer, 0), "ab    ");
        let attrs = buffer.read_attributes(Coord::new(2, 0), 1).unwrap();
        assert_eq!(attrs[0].background(), 1);
    }

    #[test]
    fn test_save_restore_cursor() {
        let mut buffer = vt_buffer(10, 3);
        buffer.write("\x1b[2;4H\x1b7\x1b[HX\x1b8Y");
        assert_eq!(buffer.read_characters(Coord::new(3, 1), 1).unwrap(), "Y");
    }

    #[test]
    fn test_read_rejects_origin_outside_buffer() {
        let buffer = vt_buffer(4, 2);
        assert_eq!(
            buffer.read_characters(Coord::new(0, 2), 1),
            Err(ErrorCode::INVALID_PARAMETER)
        );
    }

    #[test]
    fn test_resize_clamps_cursor() {
        let mut buffer = vt_buffer(10, 5);
        buffer.set_cursor_position(Coord::new(9, 4)).unwrap();
        buffer.resize(Coord::new(4, 2));
        assert_eq!(buffer.info(Coord::new(4, 2)).cursor, Coord::new(3, 1));
    }
}
