//! Emulator poll loop
//!
//! Each iteration advances the emulator by one step, delivers vertical sync
//! and one-second ticks when due, forwards pointer movement if any, and
//! drains at most one queued key event. Nothing here blocks; the caller
//! decides how often to iterate and supplies the clock.

use crate::emulator::ticks::{Periodic, ONE_HZ_PERIOD_US, VSYNC_PERIOD_US};
use crate::input::{Consumer, InputEvent, PointerState, PointerTracker};
use crate::traits::Emulator;

/// What one iteration delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Iteration {
    pub vsync: bool,
    pub one_hz: bool,
    pub pointer: bool,
    pub key: bool,
}

pub struct GlueLoop<'a, E, const N: usize> {
    emulator: E,
    keys: Consumer<'a, InputEvent, N>,
    pointer: &'a PointerState,
    tracker: PointerTracker,
    vsync: Periodic,
    one_hz: Periodic,
}

impl<'a, E: Emulator, const N: usize> GlueLoop<'a, E, N> {
    pub fn new(
        emulator: E,
        keys: Consumer<'a, InputEvent, N>,
        pointer: &'a PointerState,
        invert_y: bool,
    ) -> Self {
        Self {
            emulator,
            keys,
            pointer,
            tracker: PointerTracker::new(invert_y),
            vsync: Periodic::new(VSYNC_PERIOD_US),
            one_hz: Periodic::new(ONE_HZ_PERIOD_US),
        }
    }

    /// Override the tick periods
    pub fn with_periods(mut self, vsync_us: u64, one_hz_us: u64) -> Self {
        self.vsync = Periodic::new(vsync_us);
        self.one_hz = Periodic::new(one_hz_us);
        self
    }

    /// Run one iteration at time `now_us`
    pub fn poll(&mut self, now_us: u64) -> Iteration {
        let mut done = Iteration::default();

        self.emulator.step();

        if self.vsync.poll(now_us) {
            self.emulator.vsync();
            done.vsync = true;
        }
        if self.one_hz.poll(now_us) {
            self.emulator.one_hz();
            done.one_hz = true;
        }

        if let Some(event) = self.tracker.poll(self.pointer) {
            self.deliver(event);
            done.pointer = true;
        }

        if let Some(event) = self.keys.pop() {
            self.deliver(event);
            done.key = true;
        }

        done
    }

    fn deliver(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, pressed } => self.emulator.key(key.code(), pressed),
            InputEvent::Pointer { dx, dy, button } => self.emulator.pointer(dx, dy, button),
        }
    }

    pub fn emulator(&self) -> &E {
        &self.emulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{EventQueue, MacKey, PointerAccumulator};
    use heapless::Vec;
    use scanline_protocol::MouseReport;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Step,
        Vsync,
        OneHz,
        Pointer(i32, i32, bool),
        Key(u8, bool),
    }

    #[derive(Default)]
    struct MockEmulator {
        calls: Vec<Call, 64>,
    }

    impl MockEmulator {
        fn count(&self, call: Call) -> usize {
            self.calls.iter().filter(|c| **c == call).count()
        }
    }

    impl Emulator for MockEmulator {
        fn framebuffer_offset(&self) -> usize {
            0x1_A700
        }

        fn step(&mut self) {
            self.calls.push(Call::Step).unwrap();
        }

        fn vsync(&mut self) {
            self.calls.push(Call::Vsync).unwrap();
        }

        fn one_hz(&mut self) {
            self.calls.push(Call::OneHz).unwrap();
        }

        fn pointer(&mut self, dx: i32, dy: i32, button: bool) {
            self.calls.push(Call::Pointer(dx, dy, button)).unwrap();
        }

        fn key(&mut self, code: u8, pressed: bool) {
            self.calls.push(Call::Key(code, pressed)).unwrap();
        }
    }

    #[test]
    fn test_step_every_iteration() {
        let mut queue: EventQueue<InputEvent, 8> = EventQueue::new();
        let (_, rx) = queue.split();
        let pointer = PointerState::new();
        let mut glue = GlueLoop::new(MockEmulator::default(), rx, &pointer, true);

        for t in 0..5 {
            glue.poll(t);
        }
        assert_eq!(glue.emulator().count(Call::Step), 5);
        assert_eq!(glue.emulator().count(Call::Vsync), 0);
    }

    #[test]
    fn test_periodic_ticks() {
        let mut queue: EventQueue<InputEvent, 8> = EventQueue::new();
        let (_, rx) = queue.split();
        let pointer = PointerState::new();
        let mut glue = GlueLoop::new(MockEmulator::default(), rx, &pointer, true);

        let first = glue.poll(16_667);
        assert!(first.vsync);
        assert!(!first.one_hz);

        let later = glue.poll(1_000_000);
        assert!(later.vsync);
        assert!(later.one_hz);
        assert_eq!(glue.emulator().count(Call::OneHz), 1);
    }

    #[test]
    fn test_one_key_per_iteration() {
        let mut queue: EventQueue<InputEvent, 8> = EventQueue::new();
        let (mut tx, rx) = queue.split();
        let pointer = PointerState::new();

        assert!(tx.push_key(0x04, true));
        assert!(tx.push_key(0x04, false));

        let mut glue = GlueLoop::new(MockEmulator::default(), rx, &pointer, true);
        assert!(glue.poll(0).key);
        assert_eq!(glue.emulator().count(Call::Key(MacKey::A.code(), true)), 1);
        assert_eq!(glue.emulator().count(Call::Key(MacKey::A.code(), false)), 0);

        assert!(glue.poll(1).key);
        assert!(!glue.poll(2).key);
        assert_eq!(glue.emulator().count(Call::Key(MacKey::A.code(), false)), 1);
    }

    #[test]
    fn test_pointer_delivered_on_change() {
        let mut queue: EventQueue<InputEvent, 8> = EventQueue::new();
        let (_, rx) = queue.split();
        let pointer = PointerState::new();
        let mut acc = PointerAccumulator::new(&pointer);
        let mut glue = GlueLoop::new(MockEmulator::default(), rx, &pointer, true);

        assert!(!glue.poll(0).pointer);

        acc.apply(&MouseReport {
            buttons: 1,
            dx: 2,
            dy: 3,
            wheel: 0,
        });
        assert!(glue.poll(1).pointer);
        assert_eq!(glue.emulator().count(Call::Pointer(2, -3, true)), 1);
        assert!(!glue.poll(2).pointer);
    }

    #[test]
    fn test_custom_periods() {
        let mut queue: EventQueue<InputEvent, 8> = EventQueue::new();
        let (_, rx) = queue.split();
        let pointer = PointerState::new();
        let mut glue =
            GlueLoop::new(MockEmulator::default(), rx, &pointer, true).with_periods(100, 1_000);

        assert!(glue.poll(100).vsync);
        assert!(glue.poll(1_000).one_hz);
    }
}
