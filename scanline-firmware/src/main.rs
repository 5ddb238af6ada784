//! Scanline - VGA video and HID input for an emulated compact Mac
//!
//! Main firmware binary for RP2040-based boards. Core 0 runs the emulator
//! poll loop and owns the video line interrupt; core 1 runs the USB-host
//! bridge link and the status LED.
//!
//! ```text
//!  core 1                                 core 0
//!  ┌──────────────┐  KEY_QUEUE   ┌───────────────┐  umac_*  ┌──────────┐
//!  │ bridge_rx    ├─────────────►│   GlueLoop    ├─────────►│   umac   │
//!  │              ├─────────────►│               │          └────┬─────┘
//!  └──────────────┘   POINTER    └───────────────┘               │ RAM
//!  ┌──────────────┐                                       ┌──────▼─────┐
//!  │ bridge_link  │                            DMA_IRQ_1 ─►│ video DMA  │─► VGA
//!  │ led          │                                       └────────────┘
//!  └──────────────┘
//! ```

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::{Executor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::{clk_sys_freq, ClockConfig};
use embassy_rp::config::Config;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{DMA_CH0, FLASH, PIO0, UART0};
use embassy_rp::pio::Pio;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_rp::Peri;
use embassy_time::{Instant, Timer};
use embedded_alloc::LlffHeap as Heap;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use scanline_core::config::{BoardConfig, DiskSource};
use scanline_core::emulator::GlueLoop;
use scanline_core::traits::{DiskBackend, DiskDescriptor};
use scanline_hal_rp2040::flash::{FlashDisk, Rp2040FlashStorage};
use scanline_hal_rp2040::pio::{VideoPio, SYS_CLK_HZ};
use scanline_hal_rp2040::scanout::{self, start_video, FramebufferVisibility};

use crate::channels::{KEY_QUEUE, POINTER};
use crate::config::{log_config_summary, parse_config, ConfigPersistence};
use crate::umac::Umac;

mod channels;
mod config;
mod tasks;
mod umac;

// Heap allocator for TOML parsing and the emulator drive table
#[global_allocator]
static HEAP: Heap = Heap::empty();

const HEAP_SIZE: usize = 16 * 1024;

/// Embedded default configuration (compiled into firmware)
/// Edit board.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../board.toml");

#[repr(C, align(4))]
struct Aligned<T: ?Sized>(T);

/// Mac ROM image, staged by build.rs
static UMAC_ROM: &Aligned<[u8]> =
    &Aligned(*include_bytes!(concat!(env!("OUT_DIR"), "/umac-rom.bin")));

/// Read-only boot disk image, staged by build.rs
static UMAC_DISC: &Aligned<[u8]> =
    &Aligned(*include_bytes!(concat!(env!("OUT_DIR"), "/umac-disc.bin")));

// Board pin assignments
// Video: DATA=GPIO18, VSYNC=GPIO19, CLOCK=GPIO20, HSYNC=GPIO21
// Bridge UART0: TX=GPIO0, RX=GPIO1
// Status LED: GPIO25

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static FLASH_DISK: StaticCell<FlashDisk<'static>> = StaticCell::new();

static CORE1_STACK: ConstStaticCell<Stack<8192>> = ConstStaticCell::new(Stack::new());
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Scanline firmware starting...");

    init_heap();

    let mut p = embassy_rp::init(board_config());
    let sys_clk_hz = clk_sys_freq();
    info!("Peripherals initialized, clk_sys {} Hz", sys_clk_hz);

    let config = load_config_from_flash(p.FLASH.reborrow(), p.DMA_CH0.reborrow()).await;

    // Bridge link and status LED go to core 1. The UART is built there so
    // UART0_IRQ is enabled in core 1's NVIC only.
    let baud = config.bridge.baud;
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = baud;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let (uart0, uart_tx_pin, uart_rx_pin) = (p.UART0, p.PIN_0, p.PIN_1);

    let led = Output::new(p.PIN_25, Level::Low);
    let (keys_tx, keys_rx) = KEY_QUEUE.take().split();

    let input = config.input;
    let link_timeout_ms = config.bridge.link_timeout_ms;
    let blink_ms = config.status.blink_ms;
    spawn_core1(p.CORE1, CORE1_STACK.take(), move || {
        let uart = Uart::new_blocking(uart0, uart_tx_pin, uart_rx_pin, uart_config);
        let (tx, rx) = uart.into_buffered(Irqs, tx_buf, rx_buf).split();
        info!("Bridge UART initialized at {} baud", baud);

        let executor1 = EXECUTOR1.init(Executor::new());
        executor1.run(|spawner| {
            spawner.spawn(tasks::bridge_rx_task(rx, keys_tx, input)).unwrap();
            spawner
                .spawn(tasks::bridge_link_task(tx, link_timeout_ms))
                .unwrap();
            spawner.spawn(tasks::led_task(led, blink_ms)).unwrap();
        })
    });
    info!("Core 1 started");

    // Emulator
    let disk = open_disk(p.FLASH, &config);
    let Some(ram) = umac::take_ram() else {
        error!("Emulated RAM already claimed");
        halt().await
    };
    let emulator = match Umac::init(ram, &UMAC_ROM.0, disk) {
        Ok(emulator) => emulator,
        Err(e) => {
            error!("Emulator init failed: {:?}", e);
            halt().await
        }
    };
    info!("Emulator initialized, framebuffer at {=usize:#x}", emulator.framebuffer_addr());

    // Video
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let mut video = VideoPio::new(
        &mut common,
        sm0,
        p.PIN_18,
        p.PIN_19,
        p.PIN_20,
        p.PIN_21,
        sys_clk_hz,
        config.video.high_drive,
    );
    match start_video(
        &mut video,
        p.DMA_CH1,
        p.DMA_CH2,
        p.DMA_CH3,
        emulator.framebuffer_addr(),
        config.video.blank.fill_word(),
        FramebufferVisibility::default(),
    ) {
        Ok(()) => info!("Video started, 640x480@60"),
        Err(e) => error!("Video start failed: {:?}", e),
    }

    let mut glue = GlueLoop::new(emulator, keys_rx, &POINTER, config.input.invert_y).with_periods(
        config.emulator.vsync_period_us as u64,
        config.emulator.second_period_us as u64,
    );
    info!("Emulation running");

    loop {
        let done = glue.poll(Instant::now().as_micros());
        if done.one_hz {
            trace!(
                "frame {} line {}",
                scanout::frame_count(),
                scanout::scan_position()
            );
        }
        yield_now().await;
    }
}

/// Clock tree for the video pixel clock
///
/// Falls back to the stock clocks if the PLL cannot reach the target; the
/// PIO divider follows whatever clk_sys ends up being.
fn board_config() -> Config {
    match ClockConfig::system_freq(SYS_CLK_HZ) {
        Ok(clocks) => Config::new(clocks),
        Err(e) => {
            warn!(
                "Cannot run clk_sys at {} Hz: {:?}",
                SYS_CLK_HZ,
                defmt::Debug2Format(&e)
            );
            Config::default()
        }
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Load configuration from flash storage
///
/// Attempts to load the stored config from flash. If not found or invalid,
/// returns the embedded default configuration.
async fn load_config_from_flash(flash: Peri<'_, FLASH>, dma: Peri<'_, DMA_CH0>) -> BoardConfig {
    let storage = Rp2040FlashStorage::new(flash, dma);
    let mut persistence = ConfigPersistence::new(storage);

    match persistence.load().await {
        Ok(config) => {
            info!("Loaded configuration from flash");
            config
        }
        Err(e) => {
            info!(
                "No valid configuration in flash ({:?}), using embedded defaults",
                e
            );
            create_default_config()
        }
    }
}

/// Create the embedded default configuration
///
/// Parses the board.toml file that was embedded at compile time.
fn create_default_config() -> BoardConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            log_config_summary(&config);
            config
        }
        Err(e) => {
            // build.rs validates board.toml, so this is a parser mismatch
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using built-in fallback configuration");
            BoardConfig::default()
        }
    }
}

/// Pick drive 0 from the configured source
fn open_disk(flash: Peri<'static, FLASH>, config: &BoardConfig) -> DiskDescriptor<'static> {
    let embedded = DiskDescriptor::Image(&UMAC_DISC.0);

    match config.disk.source {
        DiskSource::Embedded => {
            info!("Using embedded disk image, {} bytes", embedded.size());
            embedded
        }
        DiskSource::Flash => match FlashDisk::open(flash, config.disk.read_only) {
            Some(disk) => {
                let disk = FLASH_DISK.init(disk);
                info!(
                    "Using flash disk, {} bytes{}",
                    disk.size(),
                    if config.disk.read_only { " (read-only)" } else { "" }
                );
                DiskDescriptor::Backend(disk)
            }
            None => {
                warn!("Flash disk partition holds no image, using embedded disk image");
                embedded
            }
        },
    }
}

/// Park core 0 after a fatal boot error
///
/// Core 1 keeps the LED and bridge link alive.
async fn halt() -> ! {
    loop {
        Timer::after_secs(60).await;
    }
}
