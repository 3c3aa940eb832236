//! Rate limit for status-message edits.

use std::time::{Duration, Instant};

/// Allows at most one edit per interval.
///
/// Callers coalesce suppressed updates and retry once
/// [`Self::remaining`] has elapsed, so the most recent text always wins at
/// the next allowed edit.
#[derive(Debug)]
pub struct EditThrottle {
    interval: Duration,
    last_edit: Option<Instant>,
}

impl EditThrottle {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_edit: None,
        }
    }

    /// Returns true when an edit is allowed at `now`, recording it.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let allowed = self
            .last_edit
            .is_none_or(|last| now.duration_since(last) >= self.interval);
        if allowed {
            self.last_edit = Some(now);
        }
        allowed
    }

    /// Time left until the next edit is allowed. Zero when one is allowed
    /// right now.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last_edit.map_or(Duration::ZERO, |last| {
            self.interval.saturating_sub(now.duration_since(last))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edit_is_always_allowed() {
        let mut throttle = EditThrottle::new(Duration::from_secs(3));
        assert!(throttle.try_acquire(Instant::now()));
    }

    #[test]
    fn burst_of_updates_yields_one_edit() {
        let mut throttle = EditThrottle::new(Duration::from_secs(3));
        let start = Instant::now();

        // 10 updates within one second: only the first may edit.
        let allowed = (0..10)
            .filter(|i| throttle.try_acquire(start + Duration::from_millis(i * 100)))
            .count();
        assert_eq!(allowed, 1);
    }

    #[test]
    fn edit_allowed_again_after_interval() {
        let mut throttle = EditThrottle::new(Duration::from_secs(3));
        let start = Instant::now();
        assert!(throttle.try_acquire(start));
        assert!(!throttle.try_acquire(start + Duration::from_secs(2)));
        assert!(throttle.try_acquire(start + Duration::from_secs(3)));
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let mut throttle = EditThrottle::new(Duration::from_secs(3));
        let start = Instant::now();
        assert_eq!(throttle.remaining(start), Duration::ZERO);

        assert!(throttle.try_acquire(start));
        assert_eq!(
            throttle.remaining(start + Duration::from_secs(1)),
            Duration::from_secs(2)
        );
        assert_eq!(
            throttle.remaining(start + Duration::from_secs(5)),
            Duration::ZERO
        );
    }
}
