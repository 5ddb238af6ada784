//! Collaborator traits
//!
//! These traits define the seams between the board-agnostic logic and
//! the hardware or foreign code it drives.

pub mod disk;
pub mod emulator;
pub mod memory;
pub mod scanout;

pub use disk::{DiskBackend, DiskDescriptor, DiskError};
pub use emulator::Emulator;
pub use memory::MemoryVisibility;
pub use scanout::LineDescriptors;
