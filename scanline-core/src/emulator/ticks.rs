//! Elapsed-time tick generation

/// Nominal 60 Hz vertical sync period
pub const VSYNC_PERIOD_US: u64 = 16_667;

/// One second
pub const ONE_HZ_PERIOD_US: u64 = 1_000_000;

/// Fires when at least one period has elapsed since it last fired
///
/// Missed periods are not caught up: a late check fires once and restarts
/// the period from that moment.
#[derive(Debug, Clone)]
pub struct Periodic {
    period_us: u64,
    last_us: u64,
}

impl Periodic {
    /// A tick whose first period runs from time zero
    pub const fn new(period_us: u64) -> Self {
        Self {
            period_us,
            last_us: 0,
        }
    }

    /// Check the tick at `now_us`, returning true if it fires
    #[inline]
    pub fn poll(&mut self, now_us: u64) -> bool {
        if now_us.saturating_sub(self.last_us) >= self.period_us {
            self.last_us = now_us;
            true
        } else {
            false
        }
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_period() {
        let mut tick = Periodic::new(VSYNC_PERIOD_US);
        assert!(!tick.poll(0));
        assert!(!tick.poll(16_666));
        assert!(tick.poll(16_667));
        assert!(!tick.poll(16_668));
        assert!(tick.poll(33_334));
    }

    #[test]
    fn test_late_poll_fires_once() {
        let mut tick = Periodic::new(ONE_HZ_PERIOD_US);
        assert!(tick.poll(3_500_000));
        assert!(!tick.poll(3_600_000));
        assert!(tick.poll(4_500_000));
    }
}
