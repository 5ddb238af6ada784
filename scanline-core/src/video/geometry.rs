//! Frame timing model
//!
//! Maps a raster line index to its sync and visibility classification and
//! folds the horizontal timing into the two configuration word pairs that
//! precede every line's pixel data on the way to the PIO program.
//!
//! Configuration word 0 layout (consumed MSB first):
//!
//! ```text
//!  31  30      23 22      15 14       7 6     0
//! ┌──┬──────────┬──────────┬──────────┬───────┐
//! │VS│ HS - 1   │ BP - 3   │ FP - 4   │   0   │
//! └──┴──────────┴──────────┴──────────┴───────┘
//! ```
//!
//! Word 1 is the active pixel count minus one. The porch offsets absorb the
//! instructions the PIO program spends outside its counted loops.

/// Pixels packed into one transfer word (1 bit per pixel)
pub const PIXELS_PER_WORD: u16 = 32;

/// Set in configuration word 0 on lines inside vertical sync
pub const VSYNC_FLAG: u32 = 0x8000_0000;

const HSYNC_SHIFT: u32 = 23;
const BACK_PORCH_SHIFT: u32 = 15;
const FRONT_PORCH_SHIFT: u32 = 7;

/// PIO cycles spent outside the back porch loop, in pixels
const BACK_PORCH_OVERHEAD: u16 = 3;
/// PIO cycles spent outside the front porch loop, in pixels
const FRONT_PORCH_OVERHEAD: u16 = 4;

/// Errors from building a frame geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Framebuffer width is not a multiple of the 32-pixel word
    WidthNotWordAligned,
    /// Framebuffer is larger than the active raster
    FramebufferTooLarge,
    /// A packed horizontal count does not fit its 8-bit field
    TimingFieldOverflow,
    /// A porch is too short to cover the PIO program's fixed overhead
    PorchTooShort,
    /// Zero-sized mode or framebuffer
    Empty,
}

/// Display mode timing, in pixels and lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayMode {
    pub h_sync: u16,
    pub h_back_porch: u16,
    pub h_active: u16,
    pub h_front_porch: u16,
    pub v_sync: u16,
    pub v_back_porch: u16,
    pub v_active: u16,
    pub v_front_porch: u16,
}

impl DisplayMode {
    /// Total lines per frame
    pub const fn total_lines(&self) -> u16 {
        self.v_sync + self.v_back_porch + self.v_active + self.v_front_porch
    }

    /// Total pixels per line
    pub const fn total_pixels(&self) -> u16 {
        self.h_sync + self.h_back_porch + self.h_active + self.h_front_porch
    }
}

/// VESA 640x480 at 60 Hz
pub const VGA_640X480_60: DisplayMode = DisplayMode {
    h_sync: 96,
    h_back_porch: 48,
    h_active: 640,
    h_front_porch: 16,
    v_sync: 2,
    v_back_porch: 33,
    v_active: 480,
    v_front_porch: 10,
};

/// Compact Mac framebuffer width in pixels
pub const MAC_FB_WIDTH: u16 = 512;
/// Compact Mac framebuffer height in lines
pub const MAC_FB_HEIGHT: u16 = 342;

/// Classification of one raster line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineClass {
    /// Line lies inside vertical sync
    pub vsync: bool,
    /// Zero-based framebuffer row when the line shows framebuffer data
    pub visible_row: Option<u16>,
}

/// Immutable frame geometry, computed once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameGeometry {
    total_lines: u16,
    v_sync: u16,
    vis_start: u16,
    vis_end: u16,
    width_px: u16,
    words_per_line: u16,
    config_sync: [u32; 2],
    config_normal: [u32; 2],
}

impl FrameGeometry {
    /// Build the geometry for a framebuffer centred inside `mode`
    pub fn new(mode: &DisplayMode, fb_width: u16, fb_height: u16) -> Result<Self, GeometryError> {
        if fb_width == 0 || fb_height == 0 || mode.total_lines() == 0 {
            return Err(GeometryError::Empty);
        }
        if fb_width % PIXELS_PER_WORD != 0 {
            return Err(GeometryError::WidthNotWordAligned);
        }
        if fb_width > mode.h_active || fb_height > mode.v_active {
            return Err(GeometryError::FramebufferTooLarge);
        }

        let pad = (mode.h_active - fb_width) / 2;
        let back_porch = (mode.h_back_porch + pad)
            .checked_sub(BACK_PORCH_OVERHEAD)
            .ok_or(GeometryError::PorchTooShort)?;
        let front_porch = (mode.h_front_porch + pad)
            .checked_sub(FRONT_PORCH_OVERHEAD)
            .ok_or(GeometryError::PorchTooShort)?;
        let hsync = mode.h_sync.checked_sub(1).ok_or(GeometryError::PorchTooShort)?;

        let timing = pack_field(hsync, HSYNC_SHIFT)?
            | pack_field(back_porch, BACK_PORCH_SHIFT)?
            | pack_field(front_porch, FRONT_PORCH_SHIFT)?;
        let pixel_count = (fb_width - 1) as u32;

        let vis_start = mode.v_sync + mode.v_back_porch + (mode.v_active - fb_height) / 2;

        Ok(Self {
            total_lines: mode.total_lines(),
            v_sync: mode.v_sync,
            vis_start,
            vis_end: vis_start + fb_height,
            width_px: fb_width,
            words_per_line: fb_width / PIXELS_PER_WORD,
            config_sync: [timing | VSYNC_FLAG, pixel_count],
            config_normal: [timing, pixel_count],
        })
    }

    /// 512x342 framebuffer on a 640x480@60 raster
    pub fn mac_on_vga() -> Result<Self, GeometryError> {
        Self::new(&VGA_640X480_60, MAC_FB_WIDTH, MAC_FB_HEIGHT)
    }

    /// Classify line `y`
    #[inline(always)]
    pub fn classify(&self, y: u16) -> LineClass {
        LineClass {
            vsync: self.is_vsync(y),
            visible_row: self.visible_row(y),
        }
    }

    #[inline(always)]
    pub fn is_vsync(&self, y: u16) -> bool {
        y < self.v_sync
    }

    /// Framebuffer row shown on line `y`, if any
    #[inline(always)]
    pub fn visible_row(&self, y: u16) -> Option<u16> {
        if y >= self.vis_start && y < self.vis_end {
            Some(y - self.vis_start)
        } else {
            None
        }
    }

    /// Configuration pair for a line with the given sync state
    #[inline(always)]
    pub fn config_words(&self, vsync: bool) -> &[u32; 2] {
        if vsync {
            &self.config_sync
        } else {
            &self.config_normal
        }
    }

    #[inline(always)]
    pub fn total_lines(&self) -> u16 {
        self.total_lines
    }

    /// First raster line showing framebuffer row 0
    pub fn vis_start(&self) -> u16 {
        self.vis_start
    }

    /// One past the last raster line showing framebuffer data
    pub fn vis_end(&self) -> u16 {
        self.vis_end
    }

    pub fn visible_rows(&self) -> u16 {
        self.vis_end - self.vis_start
    }

    pub fn width_px(&self) -> u16 {
        self.width_px
    }

    /// Active width in transfer words
    #[inline(always)]
    pub fn words_per_line(&self) -> usize {
        self.words_per_line as usize
    }

    /// Framebuffer stride in bytes
    #[inline(always)]
    pub fn row_bytes(&self) -> usize {
        self.words_per_line() * 4
    }

    /// Size of the whole framebuffer in bytes
    pub fn framebuffer_bytes(&self) -> usize {
        self.row_bytes() * self.visible_rows() as usize
    }
}

fn pack_field(value: u16, shift: u32) -> Result<u32, GeometryError> {
    if value > 0xFF {
        return Err(GeometryError::TimingFieldOverflow);
    }
    Ok((value as u32) << shift)
}
