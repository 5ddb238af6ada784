//! Pointer accumulation
//!
//! Mouse reports are clamped and summed into an absolute position that the
//! emulator side samples whenever it likes. Position and button are level
//! signals, so nothing is queued: a sample taken after several reports sees
//! their sum.
//!
//! [`PointerState`] is shared between the input core and the emulator core.
//! The input side writes it through a [`PointerAccumulator`], the emulator
//! side reads it through a [`PointerTracker`].

use portable_atomic::{AtomicBool, AtomicI32, Ordering};
use scanline_protocol::MouseReport;

use crate::input::event::InputEvent;

/// Default per-report delta bound, in device counts
pub const DEFAULT_MAX_DELTA: u8 = 8;

/// Left button bit in a boot mouse report
pub const BUTTON_LEFT: u8 = 0x01;

/// Clamp a raw delta into `[-max, max]`
#[inline]
pub fn clamp_delta(raw: i32, max: u8) -> i32 {
    let max = max as i32;
    raw.clamp(-max, max)
}

/// Absolute pointer position and button level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerSample {
    pub x: i32,
    pub y: i32,
    pub button: bool,
}

/// Shared pointer state
pub struct PointerState {
    x: AtomicI32,
    y: AtomicI32,
    button: AtomicBool,
}

impl PointerState {
    pub const fn new() -> Self {
        Self {
            x: AtomicI32::new(0),
            y: AtomicI32::new(0),
            button: AtomicBool::new(false),
        }
    }

    /// Current position and button level
    pub fn sample(&self) -> PointerSample {
        PointerSample {
            x: self.x.load(Ordering::Relaxed),
            y: self.y.load(Ordering::Relaxed),
            button: self.button.load(Ordering::Relaxed),
        }
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer side of a [`PointerState`]
pub struct PointerAccumulator<'a> {
    state: &'a PointerState,
    max_delta: u8,
    button_mask: u8,
}

impl<'a> PointerAccumulator<'a> {
    pub fn new(state: &'a PointerState) -> Self {
        Self {
            state,
            max_delta: DEFAULT_MAX_DELTA,
            button_mask: BUTTON_LEFT,
        }
    }

    /// Per-report delta bound
    pub fn with_max_delta(mut self, max_delta: u8) -> Self {
        self.max_delta = max_delta.max(1);
        self
    }

    /// Report buttons that count as the emulated single button
    pub fn with_button_mask(mut self, mask: u8) -> Self {
        self.button_mask = mask;
        self
    }

    /// Fold one report into the shared state
    pub fn apply(&mut self, report: &MouseReport) {
        let dx = clamp_delta(report.dx as i32, self.max_delta);
        let dy = clamp_delta(report.dy as i32, self.max_delta);
        self.state.x.fetch_add(dx, Ordering::Relaxed);
        self.state.y.fetch_add(dy, Ordering::Relaxed);
        self.state
            .button
            .store(report.buttons & self.button_mask != 0, Ordering::Relaxed);
    }
}

/// Reader side: turns samples into deltas since the last delivery
#[derive(Debug, Clone)]
pub struct PointerTracker {
    last: PointerSample,
    invert_y: bool,
}

impl PointerTracker {
    pub fn new(invert_y: bool) -> Self {
        Self {
            last: PointerSample::default(),
            invert_y,
        }
    }

    /// Pointer event for whatever changed since the previous delivery
    ///
    /// Returns `None` when neither position nor button moved.
    pub fn poll(&mut self, state: &PointerState) -> Option<InputEvent> {
        let now = state.sample();
        if now == self.last {
            return None;
        }

        let dx = now.x.wrapping_sub(self.last.x);
        let dy = now.y.wrapping_sub(self.last.y);
        self.last = now;

        Some(InputEvent::Pointer {
            dx,
            dy: if self.invert_y { -dy } else { dy },
            button: now.button,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mouse(buttons: u8, dx: i8, dy: i8) -> MouseReport {
        MouseReport {
            buttons,
            dx,
            dy,
            wheel: 0,
        }
    }

    #[test]
    fn test_clamp_large_delta() {
        let state = PointerState::new();
        let mut acc = PointerAccumulator::new(&state);

        acc.apply(&mouse(0, 100, 0));
        assert_eq!(state.sample().x, DEFAULT_MAX_DELTA as i32);
        acc.apply(&mouse(0, 100, 0));
        assert_eq!(state.sample().x, 2 * DEFAULT_MAX_DELTA as i32);
    }

    #[test]
    fn test_clamp_delta_bounds() {
        assert_eq!(clamp_delta(5, 0), 0);
        assert_eq!(clamp_delta(-5, 0), 0);
        assert_eq!(clamp_delta(-300, u8::MAX), -255);
        assert_eq!(clamp_delta(i32::MIN, 1), -1);
        assert_eq!(clamp_delta(i32::MAX, 1), 1);
    }

    #[test]
    fn test_zero_bound_is_raised_to_one() {
        let state = PointerState::new();
        let mut acc = PointerAccumulator::new(&state).with_max_delta(0);

        acc.apply(&mouse(0, 50, -50));
        assert_eq!(state.sample(), PointerSample { x: 1, y: -1, button: false });
    }

    #[test]
    fn test_negative_clamp() {
        let state = PointerState::new();
        let mut acc = PointerAccumulator::new(&state).with_max_delta(4);

        acc.apply(&mouse(0, -128, -3));
        assert_eq!(state.sample(), PointerSample { x: -4, y: -3, button: false });
    }

    #[test]
    fn test_button_is_level() {
        let state = PointerState::new();
        let mut acc = PointerAccumulator::new(&state);

        acc.apply(&mouse(BUTTON_LEFT, 0, 0));
        assert!(state.sample().button);
        acc.apply(&mouse(BUTTON_LEFT, 1, 0));
        assert!(state.sample().button);
        acc.apply(&mouse(0, 0, 0));
        assert!(!state.sample().button);
    }

    #[test]
    fn test_right_button_ignored_by_default() {
        let state = PointerState::new();
        let mut acc = PointerAccumulator::new(&state);
        acc.apply(&mouse(0x02, 0, 0));
        assert!(!state.sample().button);

        let mut any = PointerAccumulator::new(&state).with_button_mask(0x07);
        any.apply(&mouse(0x02, 0, 0));
        assert!(state.sample().button);
    }

    #[test]
    fn test_tracker_reports_changes_only() {
        let state = PointerState::new();
        let mut acc = PointerAccumulator::new(&state);
        let mut tracker = PointerTracker::new(true);

        assert_eq!(tracker.poll(&state), None);

        acc.apply(&mouse(0, 3, 5));
        acc.apply(&mouse(0, 2, 1));
        assert_eq!(
            tracker.poll(&state),
            Some(InputEvent::Pointer { dx: 5, dy: -6, button: false })
        );
        assert_eq!(tracker.poll(&state), None);

        acc.apply(&mouse(BUTTON_LEFT, 0, 0));
        assert_eq!(
            tracker.poll(&state),
            Some(InputEvent::Pointer { dx: 0, dy: 0, button: true })
        );
    }

    #[test]
    fn test_tracker_without_inversion() {
        let state = PointerState::new();
        let mut acc = PointerAccumulator::new(&state);
        let mut tracker = PointerTracker::new(false);

        acc.apply(&mouse(0, 0, 4));
        assert_eq!(
            tracker.poll(&state),
            Some(InputEvent::Pointer { dx: 0, dy: 4, button: false })
        );
    }

    proptest! {
        #[test]
        fn prop_clamp_never_exceeds_bound(raw in any::<i32>(), max in any::<u8>()) {
            let step = clamp_delta(raw, max);
            prop_assert!(step.unsigned_abs() <= max as u32);
        }

        #[test]
        fn prop_clamped_sum(deltas in proptest::collection::vec(any::<i8>(), 1..64)) {
            let state = PointerState::new();
            let mut acc = PointerAccumulator::new(&state);
            let mut expected = 0i32;
            for d in &deltas {
                acc.apply(&mouse(0, *d, 0));
                let step = clamp_delta(*d as i32, DEFAULT_MAX_DELTA);
                prop_assert!(step.abs() <= DEFAULT_MAX_DELTA as i32);
                expected += step;
            }
            prop_assert_eq!(state.sample().x, expected);
        }
    }
}
