//! Status LED task
//!
//! Blinks at the configured rate while the bridge link is up and four
//! times slower otherwise, so a board without input is visibly alive.

use embassy_rp::gpio::Output;
use embassy_time::Timer;
use portable_atomic::Ordering;

use crate::channels::LINK_UP;

#[embassy_executor::task]
pub async fn led_task(mut led: Output<'static>, blink_ms: u32) {
    defmt::info!("LED task started");

    loop {
        led.toggle();
        let half_period = if LINK_UP.load(Ordering::Relaxed) {
            blink_ms
        } else {
            blink_ms * 4
        };
        Timer::after_millis(half_period as u64).await;
    }
}
