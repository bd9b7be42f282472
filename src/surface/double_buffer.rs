//! Front/back surface pair
//!
//! Draw into the back surface while the front one is presented, then swap.
//! The pair keeps track of which is which; the console keeps track of what
//! is actually shown.

use tracing::trace;

use crate::console::Console;

use super::{SurfaceResult, TerminalSurface};

pub struct DoubleBuffer<'c, C: Console + ?Sized> {
    surfaces: [TerminalSurface<'c, C>; 2],
    /// Index of the presented surface
    front: usize,
}

impl<'c, C: Console + ?Sized> DoubleBuffer<'c, C> {
    /// Create both surfaces and present the first
    pub fn new(console: &'c C) -> SurfaceResult<Self> {
        let surfaces = [TerminalSurface::new(console)?, TerminalSurface::new(console)?];
        surfaces[0].set_active()?;
        Ok(Self { surfaces, front: 0 })
    }

    pub fn front(&self) -> &TerminalSurface<'c, C> {
        &self.surfaces[self.front]
    }

    /// The hidden surface to draw the next frame into
    pub fn back(&self) -> &TerminalSurface<'c, C> {
        &self.surfaces[1 - self.front]
    }

    /// Present the back surface. On failure nothing changes.
    pub fn swap(&mut self) -> SurfaceResult<()> {
        self.back().set_active()?;
        self.front = 1 - self.front;
        trace!("Swapped, {} now presented", self.front().handle());
        Ok(())
    }

    /// Resize both surfaces
    pub fn set_size(&self, width: u16, height: u16) -> SurfaceResult<()> {
        for surface in &self.surfaces {
            surface.set_size(width, height)?;
        }
        Ok(())
    }
}
