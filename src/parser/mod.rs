//! Terminal escape sequence parser
//!
//! A stateful parser that converts written text into terminal actions.
//! Based on the VT500-series parser model from <https://vt100.net/emu/dec_ansi_parser>

mod action;
mod state;

pub use action::{Action, ControlCode, CsiAction, EscAction};
pub use state::Parser;
