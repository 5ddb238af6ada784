//! Bridge link task
//!
//! Answers PINGs and watches for the bridge going quiet.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{Duration, Ticker};
use embedded_io_async::Write;
use portable_atomic::Ordering;

use scanline_core::link::{LinkMonitor, LinkStatus};
use scanline_protocol::{FirmwareMessage, MAX_FRAME_SIZE};

use crate::channels::{BRIDGE_ACTIVITY, LINK_UP, PONG_REQUEST};

/// Link monitor tick interval in milliseconds
const LINK_TICK_MS: u32 = 100;

#[embassy_executor::task]
pub async fn bridge_link_task(mut tx: BufferedUartTx, timeout_ms: u32) {
    info!("Bridge link task started, timeout {} ms", timeout_ms);

    let mut monitor = LinkMonitor::new(timeout_ms);
    let mut ticker = Ticker::every(Duration::from_millis(LINK_TICK_MS as u64));

    loop {
        let change = match select3(PONG_REQUEST.wait(), BRIDGE_ACTIVITY.wait(), ticker.next()).await
        {
            Either3::First(()) => {
                send_pong(&mut tx).await;
                None
            }
            Either3::Second(()) => monitor.frame_received(),
            Either3::Third(()) => monitor.update_time(LINK_TICK_MS),
        };

        if let Some(status) = change {
            match status {
                LinkStatus::Up => info!("Bridge link up"),
                LinkStatus::Lost => warn!("Bridge silent for {} ms", timeout_ms),
                LinkStatus::Waiting => {}
            }
            LINK_UP.store(status == LinkStatus::Up, Ordering::Relaxed);
        }
    }
}

/// Send PONG response to the bridge
async fn send_pong(tx: &mut BufferedUartTx) {
    let frame = FirmwareMessage::Pong.to_frame();
    let mut buf = [0u8; MAX_FRAME_SIZE];
    match frame.encode(&mut buf) {
        Ok(len) => {
            if let Err(e) = tx.write_all(&buf[..len]).await {
                warn!("Failed to send PONG: {:?}", e);
            } else {
                trace!("PONG sent");
            }
        }
        Err(e) => warn!("Failed to encode PONG: {:?}", e),
    }
}
