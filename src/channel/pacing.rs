//! Caller-side pacing for driver writes.

use crate::settings::WRITE_DELAY_MS;
use std::time::{Duration, Instant};

/// Tracks the last write and reports when the next one is allowed.
#[derive(Debug, Clone)]
pub struct WritePacer {
    /// Minimum spacing between two writes
    min_interval: Duration,

    last_write: Option<Instant>,
}

impl Default for WritePacer {
    /// Paced at the published write delay.
    fn default() -> Self {
        Self::new(Duration::from_millis(WRITE_DELAY_MS as u64))
    }
}

impl WritePacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_write: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left until a write is allowed; zero when one is allowed now.
    pub fn remaining(&self) -> Duration {
        match self.last_write {
            Some(at) => self.min_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Returns true and records the write if one is allowed now.
    pub fn should_write(&mut self) -> bool {
        if self.remaining().is_zero() {
            self.mark();
            true
        } else {
            false
        }
    }

    pub fn mark(&mut self) {
        self.last_write = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_published_delay() {
        assert_eq!(WritePacer::default().min_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn first_write_is_immediate() {
        let mut pacer = WritePacer::default();
        assert_eq!(pacer.remaining(), Duration::ZERO);
        assert!(pacer.should_write());
        assert!(!pacer.should_write());
        assert!(pacer.remaining() > Duration::ZERO);
    }

    #[test]
    fn write_allowed_after_interval() {
        let mut pacer = WritePacer::new(Duration::from_millis(20));
        assert!(pacer.should_write());
        std::thread::sleep(Duration::from_millis(30));
        assert!(pacer.should_write());
    }
}
