//! Bounded single-producer/single-consumer event queue
//!
//! A thin layer over `heapless::spsc::Queue` that fixes the overflow policy:
//! a push into a full queue fails and the new event is dropped, nothing
//! queued is ever evicted. Capacity `N` must be a power of two and one slot
//! stays unused, so at most `N - 1` events are held.
//!
//! [`EventQueue::split`] hands out one [`Producer`] and one [`Consumer`];
//! each side can only be used through its own handle.

use heapless::spsc;

use crate::input::event::InputEvent;
use crate::input::keyboard::KeySink;
use crate::input::keymap::map_usage;

/// Default queue size for key events
pub const KEY_QUEUE_SIZE: usize = 32;

pub struct EventQueue<T, const N: usize> {
    inner: spsc::Queue<T, N>,
}

impl<T, const N: usize> EventQueue<T, N> {
    const POWER_OF_TWO: () = assert!(N.is_power_of_two() && N >= 2, "queue size must be a power of two");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::POWER_OF_TWO;
        Self {
            inner: spsc::Queue::new(),
        }
    }

    /// Maximum number of queued events
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Split into the producer and consumer handles
    pub fn split(&mut self) -> (Producer<'_, T, N>, Consumer<'_, T, N>) {
        let (producer, consumer) = self.inner.split();
        (Producer { inner: producer }, Consumer { inner: consumer })
    }
}

impl<T, const N: usize> Default for EventQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write side of an [`EventQueue`]
pub struct Producer<'a, T, const N: usize> {
    inner: spsc::Producer<'a, T, N>,
}

impl<'a, T, const N: usize> Producer<'a, T, N> {
    /// Queue `event`, or drop it and return false when full
    #[inline]
    pub fn push(&mut self, event: T) -> bool {
        self.inner.enqueue(event).is_ok()
    }

    pub fn is_full(&self) -> bool {
        !self.inner.ready()
    }
}

impl<'a, const N: usize> Producer<'a, InputEvent, N> {
    /// Map a keyboard usage and queue the transition
    ///
    /// Returns false if the usage has no emulated key or the queue is full.
    pub fn push_key(&mut self, usage: u8, pressed: bool) -> bool {
        match map_usage(usage) {
            Some(key) => self.push(InputEvent::key(key, pressed)),
            None => false,
        }
    }
}

impl<'a, const N: usize> KeySink for Producer<'a, InputEvent, N> {
    fn key(&mut self, usage: u8, pressed: bool) -> bool {
        self.push_key(usage, pressed)
    }
}

/// Read side of an [`EventQueue`]
pub struct Consumer<'a, T, const N: usize> {
    inner: spsc::Consumer<'a, T, N>,
}

impl<'a, T, const N: usize> Consumer<'a, T, N> {
    /// Oldest queued event, if any
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.inner.dequeue()
    }

    pub fn is_empty(&self) -> bool {
        !self.inner.ready()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keymap::MacKey;
    use proptest::prelude::*;

    #[test]
    fn test_empty_queue() {
        let mut queue: EventQueue<u8, 8> = EventQueue::new();
        let (_, mut rx) = queue.split();
        assert!(rx.is_empty());
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let mut queue: EventQueue<u8, 8> = EventQueue::new();
        assert_eq!(queue.capacity(), 7);
        let (mut tx, mut rx) = queue.split();

        for i in 0..7 {
            assert!(tx.push(i));
        }
        assert!(tx.is_full());
        assert!(!tx.push(99));
        assert_eq!(rx.len(), 7);

        for i in 0..7 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_room_after_pop() {
        let mut queue: EventQueue<u8, 4> = EventQueue::new();
        let (mut tx, mut rx) = queue.split();
        assert!(tx.push(1));
        assert!(tx.push(2));
        assert!(tx.push(3));
        assert!(!tx.push(4));
        assert_eq!(rx.pop(), Some(1));
        assert!(tx.push(4));
        assert_eq!(rx.pop(), Some(2));
        assert_eq!(rx.pop(), Some(3));
        assert_eq!(rx.pop(), Some(4));
    }

    #[test]
    fn test_push_key_maps_usage() {
        let mut queue: EventQueue<InputEvent, 8> = EventQueue::new();
        let (mut tx, mut rx) = queue.split();

        assert!(tx.push_key(0x04, true));
        assert_eq!(rx.pop(), Some(InputEvent::key(MacKey::A, true)));
    }

    #[test]
    fn test_push_key_unmapped_is_rejected() {
        let mut queue: EventQueue<InputEvent, 8> = EventQueue::new();
        let (mut tx, rx) = queue.split();

        assert!(!tx.push_key(0x53, true));
        assert!(rx.is_empty());
    }

    proptest! {
        #[test]
        fn prop_fifo_order(events in proptest::collection::vec(any::<u16>(), 0..32)) {
            let mut queue: EventQueue<u16, 32> = EventQueue::new();
            let (mut tx, mut rx) = queue.split();
            for e in &events {
                prop_assert!(tx.push(*e));
            }
            for e in &events {
                prop_assert_eq!(rx.pop(), Some(*e));
            }
            prop_assert_eq!(rx.pop(), None);
        }

        #[test]
        fn prop_full_queue_unchanged(extra in any::<u16>()) {
            let mut queue: EventQueue<u16, 16> = EventQueue::new();
            let (mut tx, mut rx) = queue.split();
            for i in 0..15u16 {
                prop_assert!(tx.push(i));
            }
            prop_assert!(!tx.push(extra));
            prop_assert_eq!(rx.len(), 15);
            for i in 0..15u16 {
                prop_assert_eq!(rx.pop(), Some(i));
            }
        }
    }
}
