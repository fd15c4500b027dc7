//! Rate limiter for progress-update renders.
//!
//! One throttle per report stream. Start/finish events bypass it with
//! `force`, progress updates ask `ready` first.

use std::time::{Duration, Instant};

/// Default minimum gap between progress-update renders on one stream.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ReportThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ReportThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true (and records `now`) when a report may be rendered.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Record an unconditional report (start/finish events always render).
    pub fn force(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// Forget the last report so the next `ready` succeeds.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for ReportThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_INTERVAL)
    }
}
