//! Read-side coherency for a framebuffer written by another core
//!
//! The producer never synchronises. Before a framebuffer row is handed to
//! the transmit channel, the row `lookahead` lines further down the raster
//! is pushed through the memory visibility capability, so the work is
//! spread one row per line instead of bursting at the top of the frame.

use crate::traits::MemoryVisibility;
use crate::video::{FrameGeometry, FramebufferRef};

/// Lines between the line being programmed and the row being cleaned
pub const DEFAULT_LOOKAHEAD: u16 = 1;

pub struct CoherencyBridge<V> {
    visibility: V,
    lookahead: u16,
}

impl<V: MemoryVisibility> CoherencyBridge<V> {
    pub fn new(visibility: V) -> Self {
        Self::with_lookahead(visibility, DEFAULT_LOOKAHEAD)
    }

    pub fn with_lookahead(visibility: V, lookahead: u16) -> Self {
        Self {
            visibility,
            lookahead,
        }
    }

    /// Maintenance for the moment line `y` is programmed
    ///
    /// Returns the row that was made visible, if the target line is inside
    /// the framebuffer window. Rows past the end are never touched.
    #[inline(always)]
    pub fn maintain(
        &mut self,
        geometry: &FrameGeometry,
        framebuffer: &FramebufferRef,
        y: u16,
    ) -> Option<u16> {
        let total = geometry.total_lines() as u32;
        // Wrap without `%`; the divide helper is not in RAM
        let mut target = y as u32 + self.lookahead as u32;
        while target >= total {
            target -= total;
        }
        let row = geometry.visible_row(target as u16)?;
        self.visibility
            .make_visible(framebuffer.row_addr(geometry, row), geometry.row_bytes());
        Some(row)
    }

    pub fn visibility(&self) -> &V {
        &self.visibility
    }
}
