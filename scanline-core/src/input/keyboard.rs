//! Keyboard report translator
//!
//! Boot keyboard reports are level snapshots: a modifier byte and up to six
//! held key usages. The translator keeps the previous report and turns the
//! difference into press and release transitions.

use scanline_protocol::KeyboardReport;

use crate::input::keymap::{MOD_ALT, MOD_CONTROL, MOD_GUI, MOD_SHIFT, USAGE_MODIFIER_BASE};

/// Receiver for translated key transitions
pub trait KeySink {
    /// Accept a transition for a keyboard page usage
    ///
    /// Returns false if the transition was dropped.
    fn key(&mut self, usage: u8, pressed: bool) -> bool;
}

/// Coalesced modifier bits in emit order
const MODIFIER_ORDER: [u8; 4] = [MOD_CONTROL, MOD_SHIFT, MOD_ALT, MOD_GUI];

/// Transition counts for one processed report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Translation {
    /// Transitions the sink accepted
    pub accepted: u8,
    /// Transitions the sink dropped (full queue or no mapping)
    pub dropped: u8,
}

impl Translation {
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.accepted += 1;
        } else {
            self.dropped += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accepted == 0 && self.dropped == 0
    }
}

/// Edge detector over successive keyboard reports
///
/// One instance per keyboard; state starts as "nothing held".
#[derive(Debug, Clone, Default)]
pub struct KeyboardTranslator {
    previous: KeyboardReport,
}

impl KeyboardTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `report` against the previous one and emit transitions
    ///
    /// Key slots are walked in order; for each slot a newly held key is
    /// pressed before a no-longer-held key is released. Modifier presses
    /// follow, in control, shift, option, command order, then modifier
    /// releases in the same order. Left and right modifiers are coalesced
    /// before diffing so holding both sides reads as one key.
    pub fn process<S: KeySink>(&mut self, report: &KeyboardReport, sink: &mut S) -> Translation {
        let mut out = Translation::default();
        let previous = &self.previous;

        for (&now, &before) in report.keys.iter().zip(previous.keys.iter()) {
            if now != 0 && !previous.holds(now) {
                out.record(sink.key(now, true));
            }
            if before != 0 && !report.holds(before) {
                out.record(sink.key(before, false));
            }
        }

        let now = coalesce(report.modifiers);
        let before = coalesce(previous.modifiers);
        let changed = now ^ before;
        if changed != 0 {
            for (bit, &mask) in MODIFIER_ORDER.iter().enumerate() {
                if changed & now & mask != 0 {
                    out.record(sink.key(USAGE_MODIFIER_BASE + bit as u8, true));
                }
            }
            for (bit, &mask) in MODIFIER_ORDER.iter().enumerate() {
                if changed & before & mask != 0 {
                    out.record(sink.key(USAGE_MODIFIER_BASE + bit as u8, false));
                }
            }
        }

        self.previous = report.clone();
        out
    }

    /// Release everything still held, as if an empty report arrived
    pub fn release_all<S: KeySink>(&mut self, sink: &mut S) -> Translation {
        self.process(&KeyboardReport::default(), sink)
    }

    pub fn previous(&self) -> &KeyboardReport {
        &self.previous
    }
}

/// Fold right-hand modifier bits onto the left-hand ones
fn coalesce(modifiers: u8) -> u8 {
    (modifiers | (modifiers >> 4)) & 0x0F
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    const KEY_A: u8 = 0x04;
    const KEY_B: u8 = 0x05;
    const KEY_C: u8 = 0x06;
    const LEFT_CTRL: u8 = 0xE0;
    const LEFT_SHIFT: u8 = 0xE1;

    #[derive(Default)]
    struct Recorder {
        events: Vec<(u8, bool), 32>,
        accept: bool,
    }

    impl Recorder {
        fn accepting() -> Self {
            Self {
                events: Vec::new(),
                accept: true,
            }
        }
    }

    impl KeySink for Recorder {
        fn key(&mut self, usage: u8, pressed: bool) -> bool {
            self.events.push((usage, pressed)).unwrap();
            self.accept
        }
    }

    fn report(modifiers: u8, keys: &[u8]) -> KeyboardReport {
        let mut r = KeyboardReport {
            modifiers,
            ..Default::default()
        };
        r.keys[..keys.len()].copy_from_slice(keys);
        r
    }

    #[test]
    fn test_press_then_partial_release() {
        let mut kb = KeyboardTranslator::new();
        let mut sink = Recorder::accepting();

        kb.process(&report(0, &[KEY_A, KEY_B]), &mut sink);
        assert_eq!(sink.events.as_slice(), &[(KEY_A, true), (KEY_B, true)]);

        sink.events.clear();
        kb.process(&report(0, &[KEY_B, KEY_C]), &mut sink);
        assert_eq!(sink.events.as_slice(), &[(KEY_A, false), (KEY_C, true)]);
    }

    #[test]
    fn test_repeated_report_is_silent() {
        let mut kb = KeyboardTranslator::new();
        let mut sink = Recorder::accepting();
        let r = report(0x02, &[KEY_A, KEY_C]);

        kb.process(&r, &mut sink);
        sink.events.clear();
        let out = kb.process(&r, &mut sink);
        assert!(sink.events.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_modifier_edges() {
        let mut kb = KeyboardTranslator::new();
        let mut sink = Recorder::accepting();

        kb.process(&report(0x03, &[]), &mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[(LEFT_CTRL, true), (LEFT_SHIFT, true)]
        );

        sink.events.clear();
        kb.process(&report(0x00, &[]), &mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[(LEFT_CTRL, false), (LEFT_SHIFT, false)]
        );
    }

    #[test]
    fn test_right_modifier_coalesced() {
        let mut kb = KeyboardTranslator::new();
        let mut sink = Recorder::accepting();

        // Right shift alone reads as shift
        kb.process(&report(0x20, &[]), &mut sink);
        assert_eq!(sink.events.as_slice(), &[(LEFT_SHIFT, true)]);

        // Adding left shift while right is held changes nothing
        sink.events.clear();
        kb.process(&report(0x22, &[]), &mut sink);
        assert!(sink.events.is_empty());

        // Shift stays down until both sides are up
        kb.process(&report(0x02, &[]), &mut sink);
        assert!(sink.events.is_empty());
        kb.process(&report(0x00, &[]), &mut sink);
        assert_eq!(sink.events.as_slice(), &[(LEFT_SHIFT, false)]);
    }

    #[test]
    fn test_keys_before_modifiers() {
        let mut kb = KeyboardTranslator::new();
        let mut sink = Recorder::accepting();

        kb.process(&report(0x08, &[KEY_A]), &mut sink);
        assert_eq!(sink.events.as_slice(), &[(KEY_A, true), (0xE3, true)]);
    }

    #[test]
    fn test_release_all() {
        let mut kb = KeyboardTranslator::new();
        let mut sink = Recorder::accepting();

        kb.process(&report(0x01, &[KEY_B]), &mut sink);
        sink.events.clear();
        let out = kb.release_all(&mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[(KEY_B, false), (LEFT_CTRL, false)]
        );
        assert_eq!(out.accepted, 2);
        assert_eq!(kb.previous(), &KeyboardReport::default());
    }

    #[test]
    fn test_dropped_transitions_counted() {
        let mut kb = KeyboardTranslator::new();
        let mut sink = Recorder::default();

        let out = kb.process(&report(0, &[KEY_A, KEY_B]), &mut sink);
        assert_eq!(out.accepted, 0);
        assert_eq!(out.dropped, 2);
        // State still advances so the next identical report is silent
        sink.events.clear();
        kb.process(&report(0, &[KEY_A, KEY_B]), &mut sink);
        assert!(sink.events.is_empty());
    }
}
