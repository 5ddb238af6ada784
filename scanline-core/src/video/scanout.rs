//! Scan-out sequencer
//!
//! Pure half of the per-line reprogram routine. The line interrupt owns one
//! [`ScanOut`] and calls [`ScanOut::on_line_complete`] each time the data
//! descriptor has been handed to the transmit channel. That gives the
//! routine a whole line period to prepare the next pair of descriptors.
//!
//! The scan position is the line whose descriptors will be written next.
//! It starts at 0 and wraps at the frame's total line count.

use crate::traits::{LineDescriptors, MemoryVisibility};
use crate::video::{CoherencyBridge, FrameGeometry};

/// Address of a 1bpp framebuffer with the geometry's row stride
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramebufferRef {
    base: usize,
}

impl FramebufferRef {
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Address of the first word of `row`
    #[inline(always)]
    pub fn row_addr(&self, geometry: &FrameGeometry, row: u16) -> usize {
        self.base + row as usize * geometry.row_bytes()
    }
}

/// Addresses the transmit descriptors may point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanBuffers {
    /// Configuration pair for lines inside vertical sync
    pub config_sync: usize,
    /// Configuration pair for all other lines
    pub config_normal: usize,
    /// One line of blank pattern, `words_per_line` long
    pub blank: usize,
    pub framebuffer: FramebufferRef,
}

/// Where a line's pixel words come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataSource {
    Blank,
    Row(u16),
}

/// Source addresses for one line's descriptor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineProgram {
    pub line: u16,
    pub vsync: bool,
    pub source: DataSource,
    /// Read address for the configuration descriptor
    pub config_addr: usize,
    /// Read address for the data descriptor
    pub data_addr: usize,
}

/// Scan position and descriptor selection for a running raster
pub struct ScanOut<V> {
    geometry: FrameGeometry,
    buffers: ScanBuffers,
    coherency: CoherencyBridge<V>,
    position: u16,
    frames: u32,
}

impl<V: MemoryVisibility> ScanOut<V> {
    pub fn new(geometry: FrameGeometry, buffers: ScanBuffers, coherency: CoherencyBridge<V>) -> Self {
        Self {
            geometry,
            buffers,
            coherency,
            position: 0,
            frames: 0,
        }
    }

    /// Descriptor sources for line `y`, with no side effects
    #[inline(always)]
    pub fn program_for(&self, y: u16) -> LineProgram {
        let class = self.geometry.classify(y);
        let config_addr = if class.vsync {
            self.buffers.config_sync
        } else {
            self.buffers.config_normal
        };
        let (source, data_addr) = match class.visible_row {
            Some(row) => (
                DataSource::Row(row),
                self.buffers.framebuffer.row_addr(&self.geometry, row),
            ),
            None => (DataSource::Blank, self.buffers.blank),
        };
        LineProgram {
            line: y,
            vsync: class.vsync,
            source,
            config_addr,
            data_addr,
        }
    }

    /// Program the line at the scan position and advance it
    #[inline(always)]
    pub fn next_line(&mut self) -> LineProgram {
        let y = self.position;
        self.coherency
            .maintain(&self.geometry, &self.buffers.framebuffer, y);
        let program = self.program_for(y);

        self.position += 1;
        if self.position >= self.geometry.total_lines() {
            self.position = 0;
            self.frames = self.frames.wrapping_add(1);
        }
        program
    }

    /// The reprogram routine: select, publish and re-arm
    #[inline(always)]
    pub fn on_line_complete<D: LineDescriptors>(&mut self, descriptors: &mut D) -> LineProgram {
        let program = self.next_line();
        descriptors.load(&program);
        program
    }

    /// Line whose descriptors will be written next
    #[inline(always)]
    pub fn position(&self) -> u16 {
        self.position
    }

    /// Completed frames since start
    #[inline(always)]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn buffers(&self) -> &ScanBuffers {
        &self.buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::memory::Coherent;
    use proptest::prelude::*;

    const CFG_SYNC: usize = 0x2000_0000;
    const CFG_NORMAL: usize = 0x2000_0008;
    const BLANK: usize = 0x2000_0100;
    const FB: usize = 0x2001_0000;

    fn scanout() -> ScanOut<Coherent> {
        let buffers = ScanBuffers {
            config_sync: CFG_SYNC,
            config_normal: CFG_NORMAL,
            blank: BLANK,
            framebuffer: FramebufferRef::new(FB),
        };
        ScanOut::new(
            FrameGeometry::mac_on_vga().unwrap(),
            buffers,
            CoherencyBridge::new(Coherent),
        )
    }

    #[derive(Default)]
    struct FakeChain {
        loads: u32,
        last: Option<LineProgram>,
    }

    impl LineDescriptors for FakeChain {
        fn load(&mut self, program: &LineProgram) {
            self.loads += 1;
            self.last = Some(*program);
        }
    }

    #[test]
    fn test_starts_at_line_zero() {
        let mut scan = scanout();
        assert_eq!(scan.position(), 0);

        let first = scan.next_line();
        assert_eq!(first.line, 0);
        assert!(first.vsync);
        assert_eq!(first.config_addr, CFG_SYNC);
        assert_eq!(first.source, DataSource::Blank);
        assert_eq!(scan.position(), 1);
    }

    #[test]
    fn test_position_wraps_after_one_frame() {
        let mut scan = scanout();
        for _ in 0..525 {
            scan.next_line();
        }
        assert_eq!(scan.position(), 0);
        assert_eq!(scan.frames(), 1);
    }

    #[test]
    fn test_sync_lines_use_sync_config() {
        let scan = scanout();
        assert_eq!(scan.program_for(1).config_addr, CFG_SYNC);
        assert_eq!(scan.program_for(2).config_addr, CFG_NORMAL);
        assert_eq!(scan.program_for(300).config_addr, CFG_NORMAL);
    }

    #[test]
    fn test_visible_line_points_into_framebuffer() {
        let scan = scanout();
        let program = scan.program_for(104);
        assert_eq!(program.source, DataSource::Row(0));
        assert_eq!(program.data_addr, FB);

        let program = scan.program_for(445);
        assert_eq!(program.source, DataSource::Row(341));
        assert_eq!(program.data_addr, FB + 341 * 16 * 4);
    }

    #[test]
    fn test_reprogram_loads_descriptors() {
        let mut scan = scanout();
        let mut chain = FakeChain::default();

        for _ in 0..105 {
            scan.on_line_complete(&mut chain);
        }
        assert_eq!(chain.loads, 105);
        let last = chain.last.unwrap();
        assert_eq!(last.line, 104);
        assert_eq!(last.data_addr, FB);
        assert_eq!(scan.position(), 105);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Clean(usize, usize),
        Load(u16),
    }

    type Log = core::cell::RefCell<heapless::Vec<Step, 512>>;

    struct RecordingVisibility<'a>(&'a Log);

    impl MemoryVisibility for RecordingVisibility<'_> {
        fn make_visible(&mut self, addr: usize, len: usize) {
            self.0.borrow_mut().push(Step::Clean(addr, len)).unwrap();
        }
    }

    struct RecordingChain<'a>(&'a Log);

    impl LineDescriptors for RecordingChain<'_> {
        fn load(&mut self, program: &LineProgram) {
            self.0.borrow_mut().push(Step::Load(program.line)).unwrap();
        }
    }

    #[test]
    fn test_next_row_cleaned_before_descriptors_load() {
        let log = Log::default();
        let buffers = ScanBuffers {
            config_sync: CFG_SYNC,
            config_normal: CFG_NORMAL,
            blank: BLANK,
            framebuffer: FramebufferRef::new(FB),
        };
        let mut scan = ScanOut::new(
            FrameGeometry::mac_on_vga().unwrap(),
            buffers,
            CoherencyBridge::new(RecordingVisibility(&log)),
        );
        let mut chain = RecordingChain(&log);

        for _ in 0..103 {
            scan.next_line();
        }
        assert!(log.borrow().is_empty());

        // Line 103 is the last blank line; row 0 is shown on line 104
        scan.on_line_complete(&mut chain);
        scan.on_line_complete(&mut chain);
        assert_eq!(
            log.borrow().as_slice(),
            &[
                Step::Clean(FB, 64),
                Step::Load(103),
                Step::Clean(FB + 64, 64),
                Step::Load(104),
            ]
        );
    }

    #[test]
    fn test_no_clean_for_last_visible_line() {
        let log = Log::default();
        let buffers = ScanBuffers {
            config_sync: CFG_SYNC,
            config_normal: CFG_NORMAL,
            blank: BLANK,
            framebuffer: FramebufferRef::new(FB),
        };
        let mut scan = ScanOut::new(
            FrameGeometry::mac_on_vga().unwrap(),
            buffers,
            CoherencyBridge::new(RecordingVisibility(&log)),
        );
        let mut chain = RecordingChain(&log);

        for _ in 0..445 {
            scan.next_line();
        }
        log.borrow_mut().clear();

        scan.on_line_complete(&mut chain);
        assert_eq!(log.borrow().as_slice(), &[Step::Load(445)]);
    }

    proptest! {
        #[test]
        fn prop_data_source_selection(y in 0u16..525) {
            let scan = scanout();
            let program = scan.program_for(y);
            if (104..446).contains(&y) {
                prop_assert_eq!(program.data_addr, FB + (y as usize - 104) * 16 * 4);
            } else {
                prop_assert_eq!(program.data_addr, BLANK);
                prop_assert_eq!(program.source, DataSource::Blank);
            }
        }

        #[test]
        fn prop_position_is_count_mod_total(n in 0u32..2000) {
            let mut scan = scanout();
            for _ in 0..n {
                scan.next_line();
            }
            prop_assert_eq!(scan.position() as u32, n % 525);
            prop_assert_eq!(scan.frames(), n / 525);
        }
    }
}
