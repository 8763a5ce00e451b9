//! Rate-limited logging
//!
//! Emits at most one message per interval per message key. Used for
//! warnings that would otherwise repeat on every invocation, such as a
//! nibble column with no supporting index.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::events::Event;
use super::logger::Logger;

/// Per-key rate limiter in front of `Logger`
#[derive(Debug)]
pub struct RateLimitedLogger {
    interval: Duration,
    /// key -> time the message was last emitted
    last_emitted: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl RateLimitedLogger {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emitted: RwLock::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true (and records `now`) if `key` may be emitted at `now`.
    ///
    /// A clock that moved backwards suppresses the message.
    pub fn should_log(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut last = match self.last_emitted.write() {
            Ok(guard) => guard,
            // A poisoned limiter degrades to plain logging
            Err(_) => return true,
        };

        let due = match last.get(key) {
            None => true,
            Some(previous) => (now - *previous)
                .to_std()
                .map_or(false, |elapsed| elapsed >= self.interval),
        };
        if due {
            last.insert(key.to_string(), now);
        }
        due
    }

    /// Logs `event` unless `key` was logged within the interval
    pub fn try_log(&self, key: &str, event: Event, fields: &[(&str, &str)]) -> bool {
        self.try_log_at(Utc::now(), key, event, fields)
    }

    /// `try_log` with an explicit clock
    pub fn try_log_at(
        &self,
        now: DateTime<Utc>,
        key: &str,
        event: Event,
        fields: &[(&str, &str)],
    ) -> bool {
        if !self.should_log(key, now) {
            return false;
        }
        Logger::log(event.severity(), event.as_str(), fields);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_once_per_interval_per_key() {
        let limiter = RateLimitedLogger::new(Duration::from_secs(60));
        assert!(limiter.should_log("events.ts", at(0)));
        assert!(!limiter.should_log("events.ts", at(1)));
        assert!(!limiter.should_log("events.ts", at(59)));
        assert!(limiter.should_log("events.ts", at(60)));
        assert!(!limiter.should_log("events.ts", at(61)));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimitedLogger::new(Duration::from_secs(60));
        assert!(limiter.should_log("a.x", at(0)));
        assert!(limiter.should_log("b.x", at(0)));
        assert!(!limiter.should_log("a.x", at(10)));
    }

    #[test]
    fn test_clock_moving_backwards_suppresses() {
        let limiter = RateLimitedLogger::new(Duration::from_secs(60));
        assert!(limiter.should_log("k", at(100)));
        assert!(!limiter.should_log("k", at(0)));
    }

    #[test]
    fn test_try_log_at_reports_emission() {
        let limiter = RateLimitedLogger::new(Duration::from_secs(60));
        assert!(limiter.try_log_at(at(0), "k", Event::IndexUnavailable, &[("column", "ts")]));
        assert!(!limiter.try_log_at(at(5), "k", Event::IndexUnavailable, &[("column", "ts")]));
    }
}
