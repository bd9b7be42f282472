//! Real terminal presentation
//!
//! Puts the presented buffer of a [`VirtualConsole`] on an actual terminal.
//! The presenter remembers the last frame it drew and only rewrites rows that
//! changed, so swapping in a fully drawn back buffer lands in one write.

use std::io::{self, Write};
use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::libc;
use tracing::{debug, trace};

use crate::core::{Attribute, Coord, Snapshot};
use crate::escape;

use super::{Console, ErrorCode, VirtualConsole};

/// Query the size of the terminal behind `fd` in cells
pub fn terminal_size(fd: RawFd) -> io::Result<Coord> {
    let mut winsize = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCGWINSZ only writes into the winsize we hand it
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut winsize) };

    if result < 0 {
        return Err(io::Error::from(Errno::last()));
    }
    if winsize.ws_col == 0 || winsize.ws_row == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "terminal reports an empty window",
        ));
    }
    Ok(Coord::new(winsize.ws_col, winsize.ws_row))
}

fn platform_error(code: ErrorCode) -> io::Error {
    io::Error::new(io::ErrorKind::Other, code)
}

/// The visible window of a buffer, as drawn on the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    size: Coord,
    rows: Vec<Vec<(char, Attribute)>>,
    /// Cursor relative to the window, if it should be shown
    cursor: Option<Coord>,
}

impl Frame {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        let window = snapshot.window;
        let left = usize::from(window.left);
        let top = usize::from(window.top);
        let width = usize::from(window.width);
        let height = usize::from(window.height);

        let rows = (top..top + height)
            .map(|row| {
                let chars: Vec<char> = snapshot
                    .lines
                    .get(row)
                    .map(|line| line.chars().skip(left).take(width).collect())
                    .unwrap_or_default();
                let attrs = snapshot.attributes.get(row);
                (0..width)
                    .map(|col| {
                        // Literal control characters would corrupt the real terminal
                        let ch = match chars.get(col) {
                            Some(&ch) if !ch.is_control() => ch,
                            _ => ' ',
                        };
                        let attr = attrs
                            .and_then(|a| a.get(left + col))
                            .map(|&bits| Attribute::from_bits(bits))
                            .unwrap_or_default();
                        (ch, attr)
                    })
                    .collect()
            })
            .collect();

        let cursor = &snapshot.cursor;
        let cursor = (cursor.visible
            && (left..left + width).contains(&cursor.col)
            && (top..top + height).contains(&cursor.row))
            .then(|| Coord::new((cursor.col - left) as u16, (cursor.row - top) as u16));

        Self {
            size: window.size(),
            rows,
            cursor,
        }
    }
}

/// Draws a console's presented buffer onto a terminal writer
pub struct TtyPresenter<W: Write> {
    out: W,
    last: Option<Frame>,
}

impl<W: Write> TtyPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Draw the presented buffer, rewriting only rows that differ from the
    /// previous frame. A change of window size redraws everything.
    pub fn present(&mut self, console: &VirtualConsole) -> io::Result<()> {
        let handle = console.active_screen_buffer().map_err(platform_error)?;
        let snapshot = console.snapshot(handle).map_err(platform_error)?;
        let frame = Frame::from_snapshot(&snapshot);

        let mut out = String::from(escape::CURSOR_HIDE);
        let previous = match &self.last {
            Some(last) if last.size == frame.size => Some(last),
            _ => {
                debug!("Full redraw of {} at {}", handle, frame.size);
                out.push_str(escape::CLEAR_SCREEN);
                None
            }
        };

        let mut redrawn = 0;
        for (y, row) in frame.rows.iter().enumerate() {
            if previous.and_then(|p| p.rows.get(y)) == Some(row) {
                continue;
            }
            redrawn += 1;
            out.push_str(&escape::cursor_position(0, y as u16));
            let mut current = None;
            for &(ch, attr) in row {
                if current != Some(attr) {
                    out.push_str(&escape::attribute_sgr(attr));
                    current = Some(attr);
                }
                out.push(ch);
            }
        }
        out.push_str(escape::RESET);

        if let Some(cursor) = frame.cursor {
            out.push_str(&escape::cursor_position(cursor.x, cursor.y));
            out.push_str(escape::CURSOR_SHOW);
        }

        trace!("Presented {}: {} rows redrawn", handle, redrawn);
        self.out.write_all(out.as_bytes())?;
        self.out.flush()?;
        self.last = Some(frame);
        Ok(())
    }

    /// Forget the previous frame so the next present redraws everything
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
