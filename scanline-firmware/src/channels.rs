//! Cross-task and cross-core shared state
//!
//! The key queue and pointer state carry input from the bridge task on
//! core 1 to the emulator loop on core 0. The signals only connect tasks
//! on core 1.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;
use static_cell::ConstStaticCell;

use scanline_core::input::{EventQueue, InputEvent, PointerState, KEY_QUEUE_SIZE};

/// Key transitions from the bridge to the emulator
pub type KeyQueue = EventQueue<InputEvent, KEY_QUEUE_SIZE>;

pub static KEY_QUEUE: ConstStaticCell<KeyQueue> = ConstStaticCell::new(EventQueue::new());

/// Absolute pointer position and button level
pub static POINTER: PointerState = PointerState::new();

/// A PING arrived and wants a PONG
pub static PONG_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// A valid frame arrived from the bridge
pub static BRIDGE_ACTIVITY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Bridge link is up, for the status LED
pub static LINK_UP: AtomicBool = AtomicBool::new(false);
