//! Binding to the umac emulator core
//!
//! The core is C code linked from `libumac.a`. It owns emulated RAM once
//! initialised and calls back into Rust for disk access through the
//! function pointers in its drive table.

use alloc::boxed::Box;
use core::ffi::{c_int, c_uint, c_void};
use core::ptr;

use defmt::*;
use portable_atomic::{AtomicBool, Ordering};
use scanline_core::traits::{DiskBackend, DiskDescriptor, DiskError, Emulator};
use static_cell::ConstStaticCell;

/// Emulated RAM size
pub const RAM_SIZE: usize = 128 * 1024;

/// Drives in the core's drive table
const DISC_NUM_DRIVES: usize = 2;

/// Emulated RAM, word aligned for the video DMA
#[repr(C, align(4))]
pub struct Ram(pub [u8; RAM_SIZE]);

static RAM: ConstStaticCell<Ram> = ConstStaticCell::new(Ram([0; RAM_SIZE]));

/// Claim emulated RAM, once
pub fn take_ram() -> Option<&'static mut Ram> {
    RAM.try_take()
}

type DiscOp =
    unsafe extern "C" fn(ctx: *mut c_void, data: *mut u8, offset: c_uint, len: c_uint) -> c_int;

/// One entry of the core's drive table
#[repr(C)]
struct DiscDescr {
    /// In-memory image, or null to use the ops
    base: *const c_void,
    size: c_uint,
    read_only: c_int,
    op_ctx: *mut c_void,
    op_read: Option<DiscOp>,
    op_write: Option<DiscOp>,
}

impl DiscDescr {
    const EMPTY: Self = Self {
        base: ptr::null(),
        size: 0,
        read_only: 1,
        op_ctx: ptr::null_mut(),
        op_read: None,
        op_write: None,
    };
}

extern "C" {
    fn umac_init(ram_base: *mut c_void, rom_base: *mut c_void, discs: *mut DiscDescr) -> c_int;
    fn umac_get_fb_offset() -> c_uint;
    fn umac_loop() -> c_int;
    fn umac_vsync_event();
    fn umac_1hz_event();
    fn umac_mouse(deltax: c_int, deltay: c_int, button: c_int);
    fn umac_kbd_event(scancode: u8, down: c_int);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UmacError {
    AlreadyInitialised,
    /// No ROM image was linked in
    NoRom,
    /// `umac_init` returned non-zero
    Init(i32),
}

static INITIALISED: AtomicBool = AtomicBool::new(false);

/// Slot handed to the core as the drive's op context
type BackendSlot = &'static mut dyn DiskBackend;

fn status(result: Result<(), DiskError>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(e) => {
            warn!("Disk access failed: {:?}", e);
            e.as_status()
        }
    }
}

unsafe extern "C" fn disc_read(
    ctx: *mut c_void,
    data: *mut u8,
    offset: c_uint,
    len: c_uint,
) -> c_int {
    // SAFETY: ctx is the leaked slot installed by `Umac::init`, and the
    // core passes a buffer of `len` bytes it owns for the call.
    let (backend, buf) = unsafe {
        (
            &mut *(ctx as *mut BackendSlot),
            core::slice::from_raw_parts_mut(data, len as usize),
        )
    };
    status(backend.read(offset as usize, buf))
}

unsafe extern "C" fn disc_write(
    ctx: *mut c_void,
    data: *mut u8,
    offset: c_uint,
    len: c_uint,
) -> c_int {
    // SAFETY: as for `disc_read`.
    let (backend, buf) = unsafe {
        (
            &mut *(ctx as *mut BackendSlot),
            core::slice::from_raw_parts(data as *const u8, len as usize),
        )
    };
    status(backend.write(offset as usize, buf))
}

fn descriptor(disk: DiskDescriptor<'static>) -> DiscDescr {
    let size = disk.size() as c_uint;
    let read_only = disk.read_only() as c_int;
    match disk {
        DiskDescriptor::Image(data) => DiscDescr {
            base: data.as_ptr() as *const c_void,
            size,
            read_only,
            ..DiscDescr::EMPTY
        },
        DiskDescriptor::Backend(backend) => {
            let slot: &'static mut BackendSlot = Box::leak(Box::new(backend));
            DiscDescr {
                base: ptr::null(),
                size,
                read_only,
                op_ctx: slot as *mut BackendSlot as *mut c_void,
                op_read: Some(disc_read),
                op_write: Some(disc_write),
            }
        }
    }
}

/// Framebuffer offset, queried only if `umac_init` returned 0
fn offset_after_init(rc: c_int, query: impl FnOnce() -> c_uint) -> Result<usize, UmacError> {
    if rc != 0 {
        return Err(UmacError::Init(rc));
    }
    Ok(query() as usize)
}

/// The initialised emulator
///
/// Only one can exist; constructing it runs `umac_init`.
pub struct Umac {
    ram_base: usize,
    fb_offset: usize,
}

impl Umac {
    /// Initialise the core with its RAM, ROM and drive 0
    pub fn init(
        ram: &'static mut Ram,
        rom: &'static [u8],
        disk: DiskDescriptor<'static>,
    ) -> Result<Self, UmacError> {
        if rom.is_empty() {
            return Err(UmacError::NoRom);
        }
        if INITIALISED.swap(true, Ordering::AcqRel) {
            return Err(UmacError::AlreadyInitialised);
        }

        let discs: &'static mut [DiscDescr; DISC_NUM_DRIVES] =
            Box::leak(Box::new([descriptor(disk), DiscDescr::EMPTY]));
        let ram_base = ram.0.as_mut_ptr();

        // SAFETY: RAM, ROM and the drive table are 'static and handed over
        // for good; the core only reads the ROM.
        let rc = unsafe {
            umac_init(
                ram_base as *mut c_void,
                rom.as_ptr() as *mut c_void,
                discs.as_mut_ptr(),
            )
        };
        // SAFETY: only queried once umac_init has succeeded.
        let fb_offset = offset_after_init(rc, || unsafe { umac_get_fb_offset() })?;

        Ok(Self {
            ram_base: ram_base as usize,
            fb_offset,
        })
    }

    /// Address of the framebuffer inside emulated RAM
    pub fn framebuffer_addr(&self) -> usize {
        self.ram_base + self.fb_offset
    }
}

impl Emulator for Umac {
    fn framebuffer_offset(&self) -> usize {
        self.fb_offset
    }

    fn step(&mut self) {
        // SAFETY: construction ran umac_init.
        unsafe { umac_loop() };
    }

    fn vsync(&mut self) {
        unsafe { umac_vsync_event() };
    }

    fn one_hz(&mut self) {
        unsafe { umac_1hz_event() };
    }

    fn pointer(&mut self, dx: i32, dy: i32, button: bool) {
        unsafe { umac_mouse(dx, dy, button as c_int) };
    }

    fn key(&mut self, code: u8, pressed: bool) {
        unsafe { umac_kbd_event(code, pressed as c_int) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_offset_not_queried_after_failed_init() {
        let queried = Cell::new(false);
        let result = offset_after_init(-1, || {
            queried.set(true);
            0
        });
        assert_eq!(result, Err(UmacError::Init(-1)));
        assert!(!queried.get());
    }

    #[test]
    fn test_offset_after_successful_init() {
        assert_eq!(offset_after_init(0, || 0x1_2700), Ok(0x1_2700));
    }
}
