//! Per-session spam guard: a minimum gap between messages plus a sliding
//! window cap.
//!
//! The limiter itself is stateless; the accepted-message timestamps live on
//! the session so they are checked and updated under the session's lock.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use parley_types::config::RateLimitConfig;

/// Result of checking one inbound message against the limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Message accepted and recorded.
    Allowed,
    /// Sent sooner than the minimum gap after the previous accepted message.
    TooFast,
    /// The sliding window already holds the maximum number of messages.
    WindowFull,
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        self == RateDecision::Allowed
    }
}

/// Minimum-gap and sliding-window message limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_gap: Duration,
    window: Duration,
    max_messages: usize,
}

pub(crate) fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or_else(|_| Duration::days(365 * 100))
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            min_gap: to_chrono(config.min_gap()),
            window: to_chrono(config.window()),
            max_messages: config.max_messages,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop timestamps that fell out of the window. Idempotent for a given `now`.
    pub fn prune(&self, recent: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while recent.front().is_some_and(|ts| *ts <= cutoff) {
            recent.pop_front();
        }
    }

    /// Check a message arriving at `now` and record it when allowed.
    ///
    /// Rejected messages leave `recent` unchanged apart from pruning.
    pub fn check(&self, recent: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) -> RateDecision {
        if recent.back().is_some_and(|last| now - *last < self.min_gap) {
            return RateDecision::TooFast;
        }

        self.prune(recent, now);
        if recent.len() >= self.max_messages {
            return RateDecision::WindowFull;
        }

        recent.push_back(now);
        RateDecision::Allowed
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_min_gap_rejects_rapid_messages() {
        let limiter = RateLimiter::default();
        let mut recent = VecDeque::new();

        assert_eq!(limiter.check(&mut recent, at(0)), RateDecision::Allowed);
        assert_eq!(limiter.check(&mut recent, at(2)), RateDecision::TooFast);
        assert_eq!(recent.len(), 1);
        assert_eq!(limiter.check(&mut recent, at(3)), RateDecision::Allowed);
    }

    #[test]
    fn test_window_caps_messages() {
        let limiter = RateLimiter::default();
        let mut recent = VecDeque::new();

        for i in 0..20 {
            assert!(limiter.check(&mut recent, at(i * 5)).is_allowed());
        }
        // 21st message inside the same 10 minutes
        assert_eq!(limiter.check(&mut recent, at(100)), RateDecision::WindowFull);
        assert_eq!(recent.len(), 20);

        // Once the first message leaves the window, room opens up again
        assert_eq!(limiter.check(&mut recent, at(600)), RateDecision::Allowed);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let limiter = RateLimiter::default();
        let mut recent: VecDeque<_> = [at(0), at(100), at(700)].into_iter().collect();

        limiter.prune(&mut recent, at(750));
        let once = recent.clone();
        limiter.prune(&mut recent, at(750));
        assert_eq!(recent, once);
        assert_eq!(recent, VecDeque::from(vec![at(700)]));
    }

    #[test]
    fn test_custom_limits() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            min_gap_secs: 0,
            window_secs: 60,
            max_messages: 2,
        });
        let mut recent = VecDeque::new();
        assert!(limiter.check(&mut recent, at(0)).is_allowed());
        assert!(limiter.check(&mut recent, at(0)).is_allowed());
        assert_eq!(limiter.check(&mut recent, at(1)), RateDecision::WindowFull);
        assert!(limiter.check(&mut recent, at(61)).is_allowed());
    }
}
