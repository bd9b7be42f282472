//! Mochi Surface Library
//!
//! Double-buffered terminal surfaces over a console screen-buffer model.
//! This crate provides:
//!
//! - `core`: Cells, attribute words, cursor, grids and snapshots
//! - `parser`: VT escape sequence parser used by the console
//! - `console`: The console platform boundary and its in-process implementation
//! - `escape`: Pure escape sequence encoding
//! - `surface`: Terminal surfaces and front/back buffer pairs
//! - `app`: Configuration

pub mod app;
pub mod console;
pub mod core;
pub mod escape;
pub mod parser;
pub mod surface;

pub use console::{Console, ErrorCode, Handle, VirtualConsole};
pub use escape::Colour;
pub use surface::{Colours, DoubleBuffer, SurfaceError, SurfaceResult, TerminalSurface};
