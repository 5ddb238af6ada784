//! Raster video output model
//!
//! Everything the line interrupt needs that can be expressed without
//! touching registers: frame timing, descriptor source selection and the
//! coherency policy.

pub mod coherency;
pub mod geometry;
pub mod scanout;

pub use coherency::{CoherencyBridge, DEFAULT_LOOKAHEAD};
pub use geometry::{
    DisplayMode, FrameGeometry, GeometryError, LineClass, MAC_FB_HEIGHT, MAC_FB_WIDTH,
    PIXELS_PER_WORD, VGA_640X480_60, VSYNC_FLAG,
};
pub use scanout::{DataSource, FramebufferRef, LineProgram, ScanBuffers, ScanOut};
