//! Emulator core call interface

/// The emulated machine, driven by the glue loop
///
/// Methods map one to one onto the emulator's foreign entry points.
/// Initialisation belongs to whatever constructs the implementation, so
/// none of these can run on an uninitialised machine.
pub trait Emulator {
    /// Byte offset of the framebuffer inside emulated RAM
    fn framebuffer_offset(&self) -> usize;

    /// Run one slice of emulation
    fn step(&mut self);

    /// Deliver a vertical sync tick
    fn vsync(&mut self);

    /// Deliver a one-second tick
    fn one_hz(&mut self);

    /// Deliver a relative pointer movement and the current button level
    fn pointer(&mut self, dx: i32, dy: i32, button: bool);

    /// Deliver a key transition using the emulator's logical key code
    fn key(&mut self, code: u8, pressed: bool);
}
