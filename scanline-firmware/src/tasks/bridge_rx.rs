//! Bridge UART receive task
//!
//! Receives HID reports from the USB-host bridge, turns keyboard reports
//! into queued key transitions and folds mouse reports into the shared
//! pointer state.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use scanline_core::config::InputConfig;
use scanline_core::input::{
    InputEvent, KeyboardTranslator, PointerAccumulator, Producer, KEY_QUEUE_SIZE,
};
use scanline_protocol::{BridgeMessage, DeviceKind, FrameParser, MouseReport};

use crate::channels::{BRIDGE_ACTIVITY, POINTER, PONG_REQUEST};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

type KeyProducer = Producer<'static, InputEvent, KEY_QUEUE_SIZE>;

struct InputPipeline {
    keys: KeyProducer,
    keyboard: KeyboardTranslator,
    pointer: PointerAccumulator<'static>,
}

impl InputPipeline {
    fn handle(&mut self, msg: BridgeMessage) {
        match msg {
            BridgeMessage::Ping => {
                trace!("PING received");
                PONG_REQUEST.signal(());
            }
            BridgeMessage::Keyboard(report) => {
                let out = self.keyboard.process(&report, &mut self.keys);
                if out.dropped > 0 {
                    warn!("Dropped {} key transitions", out.dropped);
                }
            }
            BridgeMessage::Mouse(report) => {
                trace!("Mouse: {:?}", report);
                self.pointer.apply(&report);
            }
            BridgeMessage::Attached { kind } => {
                info!("Bridge device attached: {:?}", kind);
            }
            BridgeMessage::Detached { kind } => {
                info!("Bridge device detached: {:?}", kind);
                match kind {
                    DeviceKind::Keyboard => {
                        let out = self.keyboard.release_all(&mut self.keys);
                        if out.dropped > 0 {
                            warn!("Dropped {} key releases on detach", out.dropped);
                        }
                    }
                    // Let go of the button
                    DeviceKind::Mouse => self.pointer.apply(&MouseReport::default()),
                }
            }
        }
    }
}

/// Bridge RX task - receives and parses frames from the USB-host bridge
#[embassy_executor::task]
pub async fn bridge_rx_task(mut rx: BufferedUartRx, keys: KeyProducer, input: InputConfig) {
    info!("Bridge RX task started");

    let mut pipeline = InputPipeline {
        keys,
        keyboard: KeyboardTranslator::new(),
        pointer: PointerAccumulator::new(&POINTER)
            .with_max_delta(input.pointer_clamp)
            .with_button_mask(input.button_mask()),
    };
    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => {
                            BRIDGE_ACTIVITY.signal(());
                            match BridgeMessage::from_frame(&frame) {
                                Ok(msg) => pipeline.handle(msg),
                                Err(e) => {
                                    warn!("Failed to parse bridge message: {:?}", e);
                                }
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
