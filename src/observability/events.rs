//! Observable nibble events
//!
//! Events are explicit and typed; their string names are stable and show up
//! as the `event` field of every log line.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded
    ConfigLoaded,
    /// Export/delete-with-chunking invocation begins
    NibbleExportBegin,
    /// Export/delete-with-chunking invocation committed its work
    NibbleExportComplete,
    /// Delete-only invocation begins
    NibbleDeleteBegin,
    /// Delete-only invocation finished
    NibbleDeleteComplete,
    /// Invocation aborted; the caller's transaction rolls back
    NibbleAborted,
    /// No index leads with the nibble column; running on full scans
    IndexUnavailable,
    /// A tighter cutoff bound replaced the caller's bound
    CutoffResolved,
    /// Statements built for a new key
    StatementsResolved,
    /// Schema version changed; cached statements dropped
    StatementCacheInvalidated,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::NibbleExportBegin => "NIBBLE_EXPORT_BEGIN",
            Event::NibbleExportComplete => "NIBBLE_EXPORT_COMPLETE",
            Event::NibbleDeleteBegin => "NIBBLE_DELETE_BEGIN",
            Event::NibbleDeleteComplete => "NIBBLE_DELETE_COMPLETE",
            Event::NibbleAborted => "NIBBLE_ABORTED",
            Event::IndexUnavailable => "NIBBLE_INDEX_UNAVAILABLE",
            Event::CutoffResolved => "NIBBLE_CUTOFF_RESOLVED",
            Event::StatementsResolved => "NIBBLE_STATEMENTS_RESOLVED",
            Event::StatementCacheInvalidated => "NIBBLE_STATEMENT_CACHE_INVALIDATED",
        }
    }

    /// Default severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IndexUnavailable => Severity::Warn,
            Event::NibbleAborted => Severity::Error,
            Event::CutoffResolved | Event::StatementsResolved => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_stable() {
        assert_eq!(Event::NibbleExportBegin.as_str(), "NIBBLE_EXPORT_BEGIN");
        assert_eq!(Event::IndexUnavailable.to_string(), "NIBBLE_INDEX_UNAVAILABLE");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::IndexUnavailable.severity(), Severity::Warn);
        assert_eq!(Event::NibbleAborted.severity(), Severity::Error);
        assert_eq!(Event::NibbleExportComplete.severity(), Severity::Info);
        assert_eq!(Event::CutoffResolved.severity(), Severity::Trace);
    }
}
