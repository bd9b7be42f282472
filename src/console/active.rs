//! Presented-buffer selection
//!
//! A console shows exactly one screen buffer at a time. `ActiveBuffer` is the
//! owned record of which one that is; the console holds it and every
//! activation goes through it.

use super::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveBuffer {
    /// The console's own output buffer, presented when nothing else is
    standard: Handle,
    presented: Handle,
}

impl ActiveBuffer {
    pub fn new(standard: Handle) -> Self {
        Self {
            standard,
            presented: standard,
        }
    }

    pub fn standard(&self) -> Handle {
        self.standard
    }

    pub fn presented(&self) -> Handle {
        self.presented
    }

    pub fn is_presented(&self, handle: Handle) -> bool {
        self.presented == handle
    }

    pub fn present(&mut self, handle: Handle) {
        self.presented = handle;
    }

    /// Forget a released buffer. If it was presented, the standard buffer
    /// takes over; returns whether that happened.
    pub fn release(&mut self, handle: Handle) -> bool {
        if self.presented == handle && handle != self.standard {
            self.presented = self.standard;
            true
        } else {
            false
        }
    }
}
