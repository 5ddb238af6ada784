//! Descriptor chain hardware seam

use crate::video::LineProgram;

/// Hardware that transfers one line's configuration and pixel data
///
/// The implementation owns the descriptor pair and the two channels that
/// copy them into the transmit channel. `load` is called once per line from
/// interrupt context and must rewrite both descriptors and re-arm the
/// descriptor channels before the current pixel transfer finishes.
pub trait LineDescriptors {
    fn load(&mut self, program: &LineProgram);
}
