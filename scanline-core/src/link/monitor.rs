//! Link monitor for the HID bridge UART
//!
//! Tracks time since the last valid frame and reports transitions between
//! a live and a silent bridge, so callers log once per change instead of
//! once per tick.

/// Silence after which the bridge is considered gone
pub const DEFAULT_LINK_TIMEOUT_MS: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// No frame seen since boot
    Waiting,
    /// Frames arriving within the timeout
    Up,
    /// No frame for at least the timeout
    Lost,
}

#[derive(Debug, Clone)]
pub struct LinkMonitor {
    timeout_ms: u32,
    since_frame_ms: u32,
    status: LinkStatus,
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TIMEOUT_MS)
    }
}

impl LinkMonitor {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            since_frame_ms: 0,
            status: LinkStatus::Waiting,
        }
    }

    /// Record a valid frame
    ///
    /// Returns the new status if this changed it.
    pub fn frame_received(&mut self) -> Option<LinkStatus> {
        self.since_frame_ms = 0;
        self.transition(LinkStatus::Up)
    }

    /// Advance time by `delta_ms`
    ///
    /// Returns the new status if the link just went silent.
    pub fn update_time(&mut self, delta_ms: u32) -> Option<LinkStatus> {
        self.since_frame_ms = self.since_frame_ms.saturating_add(delta_ms);
        if self.status == LinkStatus::Up && self.since_frame_ms >= self.timeout_ms {
            return self.transition(LinkStatus::Lost);
        }
        None
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    fn transition(&mut self, to: LinkStatus) -> Option<LinkStatus> {
        if self.status == to {
            None
        } else {
            self.status = to;
            Some(to)
        }
    }
}
