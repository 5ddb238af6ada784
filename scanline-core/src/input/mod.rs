//! Human input pipeline
//!
//! Raw HID reports come in, normalized events go out:
//!
//! ```text
//! KeyboardReport ──► KeyboardTranslator ──► Producer::push_key ──► EventQueue ──► Consumer
//! MouseReport    ──► PointerAccumulator ──► PointerState ◄── PointerTracker (sampled)
//! ```

pub mod event;
pub mod keyboard;
pub mod keymap;
pub mod pointer;
pub mod queue;

pub use event::InputEvent;
pub use keyboard::{KeySink, KeyboardTranslator, Translation};
pub use keymap::{map_usage, MacKey};
pub use pointer::{
    clamp_delta, PointerAccumulator, PointerSample, PointerState, PointerTracker,
    DEFAULT_MAX_DELTA,
};
pub use queue::{Consumer, EventQueue, Producer, KEY_QUEUE_SIZE};
