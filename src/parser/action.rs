//! Terminal Actions
//!
//! Semantic operations produced by the parser that should be applied to a
//! screen buffer.

use serde::{Deserialize, Serialize};

/// A terminal action produced by the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Print a character at the cursor
    Print(char),

    /// Execute a C0 control character
    Control(ControlCode),

    /// Execute a CSI (Control Sequence Introducer) command
    Csi(CsiAction),

    /// Execute an ESC sequence (non-CSI)
    Esc(EscAction),
}

/// C0 control codes acted on by a screen buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCode {
    /// BEL - Bell
    Bell,
    /// BS - Backspace
    Backspace,
    /// HT - Horizontal Tab
    Tab,
    /// LF - Line Feed (VT and FF map here too)
    LineFeed,
    /// CR - Carriage Return
    CarriageReturn,
}

impl ControlCode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\x07' => Some(ControlCode::Bell),
            '\x08' => Some(ControlCode::Backspace),
            '\t' => Some(ControlCode::Tab),
            '\n' | '\x0B' | '\x0C' => Some(ControlCode::LineFeed),
            '\r' => Some(ControlCode::CarriageReturn),
            _ => None,
        }
    }
}

/// CSI (Control Sequence Introducer) actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsiAction {
    /// The final character that identifies the command
    pub final_char: char,
    /// Parameters (semicolon-separated numbers)
    pub params: Vec<u16>,
    /// Intermediate characters
    pub intermediates: Vec<char>,
    /// Private marker (? or > or other)
    pub private_marker: Option<char>,
}

impl CsiAction {
    pub fn new(final_char: char) -> Self {
        Self {
            final_char,
            params: Vec::new(),
            intermediates: Vec::new(),
            private_marker: None,
        }
    }

    /// Get parameter at index, or default value if not present
    pub fn param(&self, index: usize, default: u16) -> u16 {
        self.params.get(index).copied().unwrap_or(default)
    }

    /// Get parameter at index, treating 0 as default
    pub fn param_or_default(&self, index: usize, default: u16) -> u16 {
        match self.params.get(index) {
            Some(&0) | None => default,
            Some(&v) => v,
        }
    }
}

/// ESC sequence actions (non-CSI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscAction {
    /// ESC 7 - Save cursor (DECSC)
    SaveCursor,
    /// ESC 8 - Restore cursor (DECRC)
    RestoreCursor,
    /// ESC D - Index (IND)
    Index,
    /// ESC E - Next Line (NEL)
    NextLine,
    /// Unknown ESC sequence
    Unknown(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csi_action_param() {
        let mut csi = CsiAction::new('H');
        csi.params = vec![10, 20];

        assert_eq!(csi.param(0, 1), 10);
        assert_eq!(csi.param(1, 1), 20);
        assert_eq!(csi.param(2, 1), 1); // default
    }

    #[test]
    fn test_csi_action_param_or_default() {
        let mut csi = CsiAction::new('H');
        csi.params = vec![0, 5];

        assert_eq!(csi.param_or_default(0, 1), 1); // 0 treated as default
        assert_eq!(csi.param_or_default(1, 1), 5);
        assert_eq!(csi.param_or_default(2, 1), 1);
    }

    #[test]
    fn test_control_code_mapping() {
        assert_eq!(ControlCode::from_char('\n'), Some(ControlCode::LineFeed));
        assert_eq!(ControlCode::from_char('\x0C'), Some(ControlCode::LineFeed));
        assert_eq!(ControlCode::from_char('\r'), Some(ControlCode::CarriageReturn));
        assert_eq!(ControlCode::from_char('\x01'), None);
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::Csi(CsiAction {
            final_char: 'h',
            params: vec![25],
            intermediates: vec![],
            private_marker: Some('?'),
        });

        let json = serde_json::to_string(&action).unwrap();
        let restored: Action = serde_json::from_str(&json).unwrap();

        assert_eq!(action, restored);
    }
}
