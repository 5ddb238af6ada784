//! PIO video program
//!
//! One state machine produces the whole raster. Per line it consumes a
//! two-word configuration pair followed by the line's pixel words:
//!
//! ```text
//! word 0: VS[31] | HS-1[30:23] | HBP-3[22:15] | HFP-4[14:7] | unused[6:0]
//! word 1: pixel count - 1
//! ```
//!
//! Pins are consecutive from the data pin: DATA, VS, CLK, HS. CLK and HS are
//! driven by side-set (bit 0 and bit 1), VS by `set`, DATA by `out`. Every
//! instruction takes one cycle and the clock toggles every instruction, so
//! a pixel is two cycles. Loop counts are biased by the instructions
//! surrounding each loop, which is where the -1/-3/-4 in word 0 come from.

use embassy_rp::gpio::{Drive, SlewRate};
use embassy_rp::pac;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, FifoJoin, PioPin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use embassy_rp::Peri;
use fixed::types::U24F8;

/// Target system clock for exact VGA pixel timing
pub const SYS_CLK_HZ: u32 = 250_000_000;

/// Pixel clock for 640x480@60 (nominally 25.175 MHz)
pub const PIXEL_CLOCK_HZ: u32 = 25_000_000;

/// PIO cycles per pixel
pub const CYCLES_PER_PIXEL: u32 = 2;

/// DREQ of PIO0 state machine 0 TX FIFO
pub const VIDEO_TX_DREQ: u8 = 0;

/// State machine clock divider for a pixel rate
///
/// The divider is 16.8 fixed point and cannot go below 1.0.
pub fn calc_clock_divider(sys_clk_hz: u32, pixel_hz: u32) -> U24F8 {
    if pixel_hz == 0 {
        return U24F8::from_bits(0xFFFF_FF00);
    }
    let bits = (sys_clk_hz as u64 * 256) / (pixel_hz as u64 * CYCLES_PER_PIXEL as u64);
    U24F8::from_bits(bits.clamp(0x100, 0xFFFF_FF00) as u32)
}

/// The raster state machine
pub struct VideoPio<'d> {
    sm: StateMachine<'d, PIO0, 0>,
}

impl<'d> VideoPio<'d> {
    /// Load the program and configure state machine 0 of PIO0
    ///
    /// The state machine is left disabled; call [`VideoPio::start`] once the
    /// DMA chain is ready to feed it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        common: &mut Common<'d, PIO0>,
        mut sm: StateMachine<'d, PIO0, 0>,
        data: Peri<'d, impl PioPin>,
        vsync: Peri<'d, impl PioPin>,
        clock: Peri<'d, impl PioPin>,
        hsync: Peri<'d, impl PioPin>,
        sys_clk_hz: u32,
        high_drive: bool,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".side_set 2",
            ".wrap_target",
            "    out x, 1           side 0b01",
            "    jmp !x novsync     side 0b00",
            "    set pins, 1        side 0b01",
            "    jmp hsync_count    side 0b00",
            "novsync:",
            "    set pins, 0        side 0b01",
            "    nop                side 0b00",
            "hsync_count:",
            "    out x, 8           side 0b01",
            "hsync:",
            "    nop                side 0b10",
            "    jmp x-- hsync      side 0b11",
            "    out x, 8           side 0b00",
            "backporch:",
            "    nop                side 0b01",
            "    jmp x-- backporch  side 0b00",
            "    out y, 8           side 0b01",
            "    out null, 7        side 0b00",
            "    out x, 32          side 0b01",
            "pixels:",
            "    out pins, 1        side 0b00",
            "    jmp x-- pixels     side 0b01",
            "    mov pins, !null    side 0b00",
            "frontporch:",
            "    nop                side 0b01",
            "    jmp y-- frontporch side 0b00",
            ".wrap"
        );
        let installed = common.load_program(&prg.program);

        let mut data = common.make_pio_pin(data);
        let vsync = common.make_pio_pin(vsync);
        let clock = common.make_pio_pin(clock);
        let hsync = common.make_pio_pin(hsync);

        data.set_slew_rate(SlewRate::Fast);
        if high_drive {
            data.set_drive_strength(Drive::_12mA);
        }

        // Sync pulses are active low and the framebuffer stores black as 1;
        // flip all three at the pad so the program can work active high.
        for pin in [data.pin(), vsync.pin(), hsync.pin()] {
            pac::IO_BANK0
                .gpio(pin as usize)
                .ctrl()
                .modify(|w| w.set_outover(pac::io::vals::Outover::INVERT));
        }

        let mut cfg = Config::default();
        cfg.use_program(&installed, &[&clock, &hsync]);
        cfg.set_out_pins(&[&data]);
        cfg.set_set_pins(&[&vsync]);
        cfg.shift_out = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg.clock_divider = calc_clock_divider(sys_clk_hz, PIXEL_CLOCK_HZ);

        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[&data, &vsync, &clock, &hsync]);

        Self { sm }
    }

    /// Address the transmit channel writes pixel and config words to
    pub fn tx_fifo_addr(&self) -> u32 {
        pac::PIO0.txf(0).as_ptr() as u32
    }

    /// Let the state machine run; it stalls on its first pull until fed
    pub fn start(&mut self) {
        self.sm.set_enable(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divider_at_target_clock() {
        assert_eq!(calc_clock_divider(SYS_CLK_HZ, PIXEL_CLOCK_HZ).to_bits(), 0x500);
    }

    #[test]
    fn test_divider_at_default_clock() {
        // 125 MHz gives 2.5
        assert_eq!(calc_clock_divider(125_000_000, PIXEL_CLOCK_HZ).to_bits(), 0x280);
    }

    #[test]
    fn test_divider_floor() {
        assert_eq!(calc_clock_divider(10_000_000, PIXEL_CLOCK_HZ).to_bits(), 0x100);
    }
}
