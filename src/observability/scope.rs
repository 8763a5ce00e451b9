//! ObservationScope for invocation begin/complete logging
//!
//! - Logs the begin event on creation
//! - Logs the complete event (with elapsed time) on `complete`
//! - Logs `NIBBLE_ABORTED` on `fail`, regardless of `enabled`
//! - Logs `NIBBLE_SCOPE_INCOMPLETE` if dropped without either

use std::time::Instant;

use super::events::Event;
use super::logger::{Logger, Severity};

/// A scope that logs the lifecycle of one invocation
pub struct ObservationScope {
    complete_event: Event,
    enabled: bool,
    finished: bool,
    fields: Vec<(&'static str, String)>,
    timer: Timer,
}

impl ObservationScope {
    /// Opens a scope, logging `begin` with `fields` when enabled
    pub fn new(
        begin: Event,
        complete: Event,
        enabled: bool,
        fields: Vec<(&'static str, String)>,
    ) -> Self {
        let scope = Self {
            complete_event: complete,
            enabled,
            finished: false,
            fields,
            timer: Timer::new(),
        };
        scope.emit(begin.severity(), begin, &[]);
        scope
    }

    fn emit(&self, severity: Severity, event: Event, extra: &[(&str, &str)]) {
        if self.enabled {
            self.emit_always(severity, event, extra);
        }
    }

    fn emit_always(&self, severity: Severity, event: Event, extra: &[(&str, &str)]) {
        let mut all_fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all_fields.extend(extra.iter().copied());
        Logger::log(severity, event.as_str(), &all_fields);
    }

    /// Closes the scope successfully
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.timer.elapsed_ms();
        let mut all: Vec<(&str, &str)> = vec![("elapsed_ms", elapsed.as_str())];
        all.extend(extra.iter().copied());
        self.emit(self.complete_event.severity(), self.complete_event, &all);
    }

    /// Closes the scope with an abort reason; logged even when disabled
    pub fn fail(mut self, code: &str, reason: &str) {
        self.finished = true;
        self.emit_always(
            Event::NibbleAborted.severity(),
            Event::NibbleAborted,
            &[("code", code), ("reason", reason)],
        );
    }

    /// Check if the scope has been closed
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished && self.enabled {
            Logger::warn(
                "NIBBLE_SCOPE_INCOMPLETE",
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// A simple duration timer for logging elapsed time
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
