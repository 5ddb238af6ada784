//! Memory visibility capability

/// Makes a memory range written by another bus master or core visible to
/// the next reader
///
/// Implementations are called from the line interrupt and must complete in
/// bounded time without blocking.
pub trait MemoryVisibility {
    /// Publish `len` bytes starting at `addr`
    fn make_visible(&mut self, addr: usize, len: usize);
}

/// Memory that needs no maintenance (on-chip SRAM)
#[derive(Debug, Clone, Copy, Default)]
pub struct Coherent;

impl MemoryVisibility for Coherent {
    #[inline(always)]
    fn make_visible(&mut self, _addr: usize, _len: usize) {}
}
