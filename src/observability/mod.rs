//! Observability subsystem for nibbledb
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Per-key rate-limited warnings
//! - Monotonic counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution; logging failures are swallowed
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use nibbledb::observability::{Event, Logger, RateLimitedLogger};
//!
//! Logger::info("NIBBLE_EXPORT_COMPLETE", &[("exported_rows", "100")]);
//!
//! let limiter = RateLimitedLogger::new(std::time::Duration::from_secs(60));
//! limiter.try_log("events.ts", Event::IndexUnavailable, &[("column", "ts")]);
//! ```

mod events;
mod logger;
mod metrics;
mod rate_limit;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, NibbleMetrics};
pub use rate_limit::RateLimitedLogger;
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event at its default severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
