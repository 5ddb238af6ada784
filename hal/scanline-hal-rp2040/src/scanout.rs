//! DMA line chain and line interrupt
//!
//! Three channels keep the video state machine fed without CPU help inside
//! a line:
//!
//! ```text
//!        ┌──────────── loads config descriptor ◄────────────┐
//!        ▼                                                  │
//!   B ──► A (2 config words) ──chain──► C ──► A (pixel words) ──chain──► B
//!                                       │
//!                                       └─► DMA_IRQ_1: program next line
//! ```
//!
//! A is the transmit channel, paced by the PIO TX FIFO. B and C copy a
//! four-word descriptor into A's register block (read, write, count,
//! control-with-trigger), so the last word they write starts A. C is the
//! only channel that interrupts. By then both descriptors have been
//! consumed for the current line, and the handler has a whole line of
//! pixel output to rewrite them for the next one.

use core::ptr::{addr_of, addr_of_mut};

use embassy_rp::dma::Channel;
use embassy_rp::interrupt;
use embassy_rp::interrupt::InterruptExt;
use embassy_rp::pac;
use embassy_rp::pac::dma::regs::CtrlTrig;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::Peri;
use portable_atomic::{AtomicU16, AtomicU32, Ordering};
use scanline_core::traits::memory::Coherent;
use scanline_core::traits::LineDescriptors;
use scanline_core::video::{
    CoherencyBridge, FrameGeometry, FramebufferRef, GeometryError, LineProgram, ScanBuffers,
    ScanOut, MAC_FB_WIDTH, PIXELS_PER_WORD,
};
use static_cell::StaticCell;

use crate::pio::{VideoPio, VIDEO_TX_DREQ};
use crate::slot::IsrSlot;

/// Memory visibility policy for the framebuffer
///
/// The DMA engine reads on-chip SRAM coherently with both cores, so there
/// is nothing to clean.
pub type FramebufferVisibility = Coherent;

/// On-chip SRAM, including the two 4 KiB scratch banks
pub const SRAM: core::ops::Range<usize> = 0x2000_0000..0x2004_2000;

/// Words in one line of pixels
const LINE_WORDS: usize = (MAC_FB_WIDTH / PIXELS_PER_WORD) as usize;

/// Words in a channel register block up to and including CTRL_TRIG
const DESCRIPTOR_WORDS: u32 = 4;

/// log2 of the descriptor size in bytes, for the write ring
const DESCRIPTOR_RING_BITS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VideoError {
    AlreadyStarted,
    /// Framebuffer base is not word aligned
    Misaligned,
    /// Framebuffer is not entirely in on-chip SRAM
    NotInSram,
    Geometry(GeometryError),
}

impl From<GeometryError> for VideoError {
    fn from(e: GeometryError) -> Self {
        VideoError::Geometry(e)
    }
}

/// One register block image for the transmit channel
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Default)]
struct Descriptor {
    read_addr: u32,
    write_addr: u32,
    trans_count: u32,
    ctrl_trig: u32,
}

#[repr(C)]
struct DescriptorPair {
    config: Descriptor,
    data: Descriptor,
}

/// Constant per-line data the config and blank descriptors point at
#[repr(C, align(4))]
struct LineBuffers {
    config_sync: [u32; 2],
    config_normal: [u32; 2],
    blank: [u32; LINE_WORDS],
}

/// Descriptor pair plus the two loader channels
pub struct DmaChain {
    descriptors: &'static mut DescriptorPair,
    /// Loads the config descriptor (B)
    config_loader: u8,
    /// Loads the data descriptor and raises the line interrupt (C)
    data_loader: u8,
}

impl DmaChain {
    #[inline(always)]
    fn rearm(channel: u8, descriptor: *const Descriptor) {
        let ch = pac::DMA.ch(channel as usize);
        ch.read_addr().write_value(descriptor as u32);
        ch.trans_count().write_value(DESCRIPTOR_WORDS);
    }
}

impl LineDescriptors for DmaChain {
    #[inline(always)]
    fn load(&mut self, program: &LineProgram) {
        let config = addr_of_mut!(self.descriptors.config.read_addr);
        let data = addr_of_mut!(self.descriptors.data.read_addr);
        // SAFETY: both fields live in a 'static descriptor pair owned by the
        // chain; the DMA engine only reads them after the next trigger.
        unsafe {
            config.write_volatile(program.config_addr as u32);
            data.write_volatile(program.data_addr as u32);
        }

        Self::rearm(self.config_loader, addr_of!(self.descriptors.config));
        Self::rearm(self.data_loader, addr_of!(self.descriptors.data));
    }
}

struct LineIrq {
    scan: ScanOut<FramebufferVisibility>,
    chain: DmaChain,
}

static LINE_IRQ: IsrSlot<LineIrq> = IsrSlot::new();
static LINE_STATE: StaticCell<LineIrq> = StaticCell::new();

static DESCRIPTORS: StaticCell<DescriptorPair> = StaticCell::new();
static LINE_BUFFERS: StaticCell<LineBuffers> = StaticCell::new();

static SCAN_POSITION: AtomicU16 = AtomicU16::new(0);
static FRAME_COUNT: AtomicU32 = AtomicU32::new(0);

/// Line whose descriptors the interrupt will write next
pub fn scan_position() -> u16 {
    SCAN_POSITION.load(Ordering::Relaxed)
}

/// Frames completed since video start
pub fn frame_count() -> u32 {
    FRAME_COUNT.load(Ordering::Relaxed)
}

/// Whether `len` bytes from `addr` lie in on-chip SRAM
pub fn in_sram(addr: usize, len: usize) -> bool {
    match addr.checked_add(len) {
        Some(end) => SRAM.start <= addr && end <= SRAM.end,
        None => false,
    }
}

/// Control word for the transmit channel
fn tx_ctrl(chain_to: u8, bswap: bool) -> CtrlTrig {
    let mut w = CtrlTrig(0);
    w.set_en(true);
    w.set_data_size(DataSize::SIZE_WORD);
    w.set_incr_read(true);
    w.set_incr_write(false);
    w.set_treq_sel(TreqSel::from(VIDEO_TX_DREQ));
    w.set_chain_to(chain_to);
    w.set_bswap(bswap);
    w.set_irq_quiet(true);
    w
}

/// Control word for a descriptor loader
fn loader_ctrl(channel: u8, raise_irq: bool) -> CtrlTrig {
    let mut w = CtrlTrig(0);
    w.set_en(true);
    w.set_data_size(DataSize::SIZE_WORD);
    w.set_incr_read(true);
    w.set_incr_write(true);
    w.set_ring_sel(true);
    w.set_ring_size(DESCRIPTOR_RING_BITS);
    w.set_treq_sel(TreqSel::PERMANENT);
    // Chaining to itself means no chain
    w.set_chain_to(channel);
    w.set_irq_quiet(!raise_irq);
    w
}

/// Build the descriptor chain and start the raster
///
/// `framebuffer` must stay valid and word aligned for as long as the
/// system runs; video never stops once started. Lines outside the
/// framebuffer window are filled with `blank_fill`.
pub fn start_video(
    pio: &mut VideoPio<'_>,
    tx: Peri<'static, impl Channel>,
    config_loader: Peri<'static, impl Channel>,
    data_loader: Peri<'static, impl Channel>,
    framebuffer: usize,
    blank_fill: u32,
    visibility: FramebufferVisibility,
) -> Result<(), VideoError> {
    if framebuffer % 4 != 0 {
        return Err(VideoError::Misaligned);
    }
    let geometry = FrameGeometry::mac_on_vga()?;
    if !in_sram(framebuffer, geometry.framebuffer_bytes()) {
        return Err(VideoError::NotInSram);
    }

    let buffers = LINE_BUFFERS
        .try_init(LineBuffers {
            config_sync: *geometry.config_words(true),
            config_normal: *geometry.config_words(false),
            blank: [blank_fill; LINE_WORDS],
        })
        .ok_or(VideoError::AlreadyStarted)?;

    let (a, b, c) = (tx.number(), config_loader.number(), data_loader.number());
    let fifo = pio.tx_fifo_addr();

    let descriptors = DESCRIPTORS
        .try_init(DescriptorPair {
            config: Descriptor {
                read_addr: 0,
                write_addr: fifo,
                trans_count: 2,
                ctrl_trig: tx_ctrl(c, false).0,
            },
            data: Descriptor {
                read_addr: 0,
                write_addr: fifo,
                trans_count: geometry.words_per_line() as u32,
                // Framebuffer bytes are big-endian; shift out MSB first
                ctrl_trig: tx_ctrl(b, true).0,
            },
        })
        .ok_or(VideoError::AlreadyStarted)?;

    let tx_block = pac::DMA.ch(a as usize).read_addr().as_ptr() as u32;
    for (channel, descriptor, raise_irq) in [
        (b, addr_of!(descriptors.config), false),
        (c, addr_of!(descriptors.data), true),
    ] {
        let ch = pac::DMA.ch(channel as usize);
        ch.read_addr().write_value(descriptor as u32);
        ch.write_addr().write_value(tx_block);
        ch.trans_count().write_value(DESCRIPTOR_WORDS);
        // Non-triggering alias; B is kicked off below
        ch.al1_ctrl().write_value(loader_ctrl(channel, raise_irq).0);
    }

    // Keep these channels away from the HAL's own DMA interrupt
    let mask = (1u32 << a) | (1u32 << b) | (1u32 << c);
    pac::DMA.inte(0).modify(|w| *w &= !mask);
    pac::DMA.ints(1).write_value(1 << c);
    pac::DMA.inte(1).modify(|w| *w |= 1 << c);

    let scan_buffers = ScanBuffers {
        config_sync: buffers.config_sync.as_ptr() as usize,
        config_normal: buffers.config_normal.as_ptr() as usize,
        blank: buffers.blank.as_ptr() as usize,
        framebuffer: FramebufferRef::new(framebuffer),
    };
    let mut scan = ScanOut::new(geometry, scan_buffers, CoherencyBridge::new(visibility));
    let mut chain = DmaChain {
        descriptors,
        config_loader: b,
        data_loader: c,
    };
    scan.on_line_complete(&mut chain);
    SCAN_POSITION.store(scan.position(), Ordering::Relaxed);

    let line = LINE_STATE
        .try_init(LineIrq { scan, chain })
        .ok_or(VideoError::AlreadyStarted)?;
    if !LINE_IRQ.install(line) {
        return Err(VideoError::AlreadyStarted);
    }

    interrupt::DMA_IRQ_1.unpend();
    // SAFETY: the handler only touches state installed above.
    unsafe { interrupt::DMA_IRQ_1.enable() };

    pio.start();
    pac::DMA
        .ch(b as usize)
        .ctrl_trig()
        .write_value(loader_ctrl(b, false));
    Ok(())
}

#[link_section = ".data"]
#[interrupt]
unsafe fn DMA_IRQ_1() {
    let pending = pac::DMA.ints(1).read();
    pac::DMA.ints(1).write_value(pending);

    // SAFETY: this handler is the only reader of the slot and does not
    // re-enter itself.
    if let Some(line) = unsafe { LINE_IRQ.get() } {
        line.scan.on_line_complete(&mut line.chain);
        SCAN_POSITION.store(line.scan.position(), Ordering::Relaxed);
        FRAME_COUNT.store(line.scan.frames(), Ordering::Relaxed);
    }
}
