//! Parser State Machine
//!
//! Implements a VT500-series compatible parser state machine over Unicode
//! text. Screen buffers receive already-decoded text, so the parser consumes
//! `char`s rather than bytes; everything else follows the model described in
//! "A parser for DEC's ANSI-compatible video terminals" by Paul Williams
//! (<https://vt100.net/emu/dec_ansi_parser>).
//!
//! States:
//! - Ground: Normal text processing
//! - Escape: After ESC, waiting for next character
//! - EscapeIntermediate: ESC followed by intermediate characters
//! - CsiEntry: After CSI (ESC [), collecting parameters
//! - CsiParam: Collecting CSI parameters
//! - CsiIntermediate: CSI with intermediate characters
//! - CsiIgnore: Malformed CSI, consumed up to its final character
//! - StringPayload: OSC/DCS/SOS/PM/APC payload, consumed and discarded
//! - StringEscape: ESC seen inside a string payload (possible ST)

use super::action::{Action, ControlCode, CsiAction, EscAction};

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    StringPayload,
    StringEscape,
}

/// The escape-sequence parser
#[derive(Debug)]
pub struct Parser {
    state: State,
    /// Intermediate characters collected during parsing
    intermediates: Vec<char>,
    /// Parameters for CSI sequences
    params: Vec<u16>,
    /// Current parameter being built
    current_param: u32,
    /// Whether we've seen a digit for the current parameter
    param_has_digit: bool,
    /// Private marker of the current CSI sequence
    private_marker: Option<char>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            intermediates: Vec::with_capacity(4),
            params: Vec::with_capacity(16),
            current_param: 0,
            param_has_digit: false,
            private_marker: None,
        }
    }

    /// Reset the parser to initial state
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.clear_params();
    }

    /// Whether the parser is between sequences
    pub fn is_ground(&self) -> bool {
        self.state == State::Ground
    }

    fn clear_params(&mut self) {
        self.intermediates.clear();
        self.params.clear();
        self.current_param = 0;
        self.param_has_digit = false;
        self.private_marker = None;
    }

    /// Process a chunk of text, returning actions.
    ///
    /// Sequences may be split across calls; state carries over.
    pub fn feed(&mut self, text: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        for c in text.chars() {
            if let Some(action) = self.advance(c) {
                actions.push(action);
            }
        }
        actions
    }

    /// Process a single character
    pub fn advance(&mut self, c: char) -> Option<Action> {
        if self.state == State::StringEscape {
            if c == '\\' {
                // ST terminates the string
                self.state = State::Ground;
                return None;
            }
            // Not a terminator: the ESC starts a new sequence
            self.state = State::Escape;
            self.clear_params();
        }

        if c < '\x20' {
            return self.process_c0(c);
        }

        // DEL is ignored in all states
        if c == '\x7F' {
            return None;
        }

        // C1 controls: only the 8-bit CSI introducer is honoured
        if ('\u{80}'..='\u{9F}').contains(&c) {
            if c == '\u{9B}' && self.state != State::StringPayload {
                self.clear_params();
                self.state = State::CsiEntry;
            }
            return None;
        }

        match self.state {
            State::Ground => Some(Action::Print(c)),
            State::Escape => self.process_escape(c),
            State::EscapeIntermediate => self.process_escape_intermediate(c),
            State::CsiEntry => self.process_csi_entry(c),
            State::CsiParam => self.process_csi_param(c),
            State::CsiIntermediate => self.process_csi_intermediate(c),
            State::CsiIgnore => {
                if is_final(c) {
                    self.state = State::Ground;
                }
                None
            }
            State::StringPayload | State::StringEscape => None,
        }
    }

    /// Process C0 control characters (0x00-0x1F)
    fn process_c0(&mut self, c: char) -> Option<Action> {
        match c {
            // CAN, SUB - cancel current sequence
            '\x18' | '\x1A' => {
                self.state = State::Ground;
                None
            }
            '\x1B' => {
                if self.state == State::StringPayload {
                    self.state = State::StringEscape;
                } else {
                    self.state = State::Escape;
                    self.clear_params();
                }
                None
            }
            _ if self.state == State::StringPayload => {
                // BEL terminates OSC (xterm extension); other controls are ignored
                if c == '\x07' {
                    self.state = State::Ground;
                }
                None
            }
            _ => ControlCode::from_char(c).map(Action::Control),
        }
    }

    fn process_escape(&mut self, c: char) -> Option<Action> {
        match c {
            '\x20'..='\x2F' => {
                self.intermediates.push(c);
                self.state = State::EscapeIntermediate;
                None
            }
            '[' => {
                self.clear_params();
                self.state = State::CsiEntry;
                None
            }
            // OSC, DCS, SOS, PM, APC
            ']' | 'P' | 'X' | '^' | '_' => {
                self.state = State::StringPayload;
                None
            }
            '\x30'..='\x7E' => {
                self.state = State::Ground;
                Some(self.dispatch_esc(c))
            }
            _ => {
                self.state = State::Ground;
                None
            }
        }
    }

    fn process_escape_intermediate(&mut self, c: char) -> Option<Action> {
        match c {
            '\x20'..='\x2F' => {
                self.intermediates.push(c);
                None
            }
            '\x30'..='\x7E' => {
                self.state = State::Ground;
                Some(self.dispatch_esc(c))
            }
            _ => {
                self.state = State::Ground;
                None
            }
        }
    }

    fn dispatch_esc(&mut self, final_char: char) -> Action {
        let action = if self.intermediates.is_empty() {
            match final_char {
                '7' => EscAction::SaveCursor,
                '8' => EscAction::RestoreCursor,
                'D' => EscAction::Index,
                'E' => EscAction::NextLine,
                _ => EscAction::Unknown(final_char),
            }
        } else {
            EscAction::Unknown(final_char)
        };
        self.clear_params();
        Action::Esc(action)
    }

    fn process_csi_entry(&mut self, c: char) -> Option<Action> {
        match c {
            '0'..='9' => {
                self.push_digit(c);
                self.state = State::CsiParam;
                None
            }
            ';' | ':' => {
                self.params.push(0);
                self.state = State::CsiParam;
                None
            }
            '?' | '>' | '<' | '=' => {
                self.private_marker = Some(c);
                self.state = State::CsiParam;
                None
            }
            '\x20'..='\x2F' => {
                self.intermediates.push(c);
                self.state = State::CsiIntermediate;
                None
            }
            _ if is_final(c) => {
                self.state = State::Ground;
                Some(self.dispatch_csi(c))
            }
            _ => {
                self.state = State::CsiIgnore;
                None
            }
        }
    }

    fn process_csi_param(&mut self, c: char) -> Option<Action> {
        match c {
            '0'..='9' => {
                self.push_digit(c);
                None
            }
            ';' | ':' => {
                self.finish_param();
                None
            }
            '\x20'..='\x2F' => {
                if self.param_has_digit {
                    self.finish_param();
                }
                self.intermediates.push(c);
                self.state = State::CsiIntermediate;
                None
            }
            _ if is_final(c) => {
                self.state = State::Ground;
                Some(self.dispatch_csi(c))
            }
            _ => {
                self.state = State::CsiIgnore;
                None
            }
        }
    }

    fn process_csi_intermediate(&mut self, c: char) -> Option<Action> {
        match c {
            '\x20'..='\x2F' => {
                self.intermediates.push(c);
                None
            }
            _ if is_final(c) => {
                self.state = State::Ground;
                Some(self.dispatch_csi(c))
            }
            _ => {
                self.state = State::CsiIgnore;
                None
            }
        }
    }

    fn push_digit(&mut self, c: char) {
        let digit = c.to_digit(10).unwrap_or(0);
        self.current_param = self
            .current_param
            .saturating_mul(10)
            .saturating_add(digit);
        self.param_has_digit = true;
    }

    fn finish_param(&mut self) {
        let value = self.current_param.min(u16::MAX as u32) as u16;
        self.params.push(value);
        self.current_param = 0;
        self.param_has_digit = false;
    }

    fn dispatch_csi(&mut self, final_char: char) -> Action {
        // A trailing separator leaves an empty (zero) parameter behind
        if self.param_has_digit || !self.params.is_empty() {
            self.finish_param();
        }
        let action = CsiAction {
            final_char,
            params: std::mem::take(&mut self.params),
            intermediates: std::mem::take(&mut self.intermediates),
            private_marker: self.private_marker.take(),
        };
        self.clear_params();
        Action::Csi(action)
    }
}

fn is_final(c: char) -> bool {
    ('\x40'..='\x7E').contains(&c)
}
