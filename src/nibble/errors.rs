//! Nibble error types
//!
//! Error codes:
//! - NIBBLE_NOT_FOUND
//! - NIBBLE_INVALID_ARGUMENT
//! - NIBBLE_SCHEMA_MISMATCH
//! - NIBBLE_STATEMENT_BINDING_FAILURE
//! - NIBBLE_EXECUTION_FAILED
//!
//! Every nibble error aborts the invocation. The caller's transaction rolls
//! back, so an aborted invocation has no partial effect.

use std::fmt;

use crate::sql::ExecutionError;

/// Nibble-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NibbleErrorCode {
    /// Table, sink table or column absent from the catalog
    NibbleNotFound,
    /// Malformed invocation arguments
    NibbleInvalidArgument,
    /// Request disagrees with table metadata
    NibbleSchemaMismatch,
    /// A required statement could not be built
    NibbleStatementBindingFailure,
    /// The SQL executor failed while running a statement
    NibbleExecutionFailed,
}

impl NibbleErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            NibbleErrorCode::NibbleNotFound => "NIBBLE_NOT_FOUND",
            NibbleErrorCode::NibbleInvalidArgument => "NIBBLE_INVALID_ARGUMENT",
            NibbleErrorCode::NibbleSchemaMismatch => "NIBBLE_SCHEMA_MISMATCH",
            NibbleErrorCode::NibbleStatementBindingFailure => "NIBBLE_STATEMENT_BINDING_FAILURE",
            NibbleErrorCode::NibbleExecutionFailed => "NIBBLE_EXECUTION_FAILED",
        }
    }
}

impl fmt::Display for NibbleErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Nibble error with context
#[derive(Debug)]
pub struct NibbleError {
    code: NibbleErrorCode,
    message: String,
    source: Option<ExecutionError>,
}

impl NibbleError {
    fn new(code: NibbleErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Table absent from the catalog
    pub fn table_not_found(table: &str) -> Self {
        Self::new(
            NibbleErrorCode::NibbleNotFound,
            format!("table '{}' does not exist", table),
        )
    }

    /// Sink table absent from the catalog
    pub fn sink_not_found(sink: &str) -> Self {
        Self::new(
            NibbleErrorCode::NibbleNotFound,
            format!("sink table '{}' does not exist", sink),
        )
    }

    /// Column absent from its table
    pub fn column_not_found(table: &str, column: &str) -> Self {
        Self::new(
            NibbleErrorCode::NibbleNotFound,
            format!("column '{}' does not exist on table '{}'", column, table),
        )
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::new(NibbleErrorCode::NibbleInvalidArgument, reason)
    }

    pub fn schema_mismatch(reason: impl Into<String>) -> Self {
        Self::new(NibbleErrorCode::NibbleSchemaMismatch, reason)
    }

    pub fn statement_binding_failure(reason: impl Into<String>) -> Self {
        Self::new(NibbleErrorCode::NibbleStatementBindingFailure, reason)
    }

    /// Executor failure while running the named statement
    pub fn execution_failed(statement: &str, source: ExecutionError) -> Self {
        Self {
            code: NibbleErrorCode::NibbleExecutionFailed,
            message: format!("statement '{}' failed: {}", statement, source),
            source: Some(source),
        }
    }

    /// A statement returned a result of unexpected shape
    pub fn unexpected_result(statement: &str, reason: impl Into<String>) -> Self {
        Self::new(
            NibbleErrorCode::NibbleExecutionFailed,
            format!("statement '{}' returned {}", statement, reason.into()),
        )
    }

    pub fn code(&self) -> NibbleErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The executor error behind an execution failure
    pub fn execution_error(&self) -> Option<&ExecutionError> {
        self.source.as_ref()
    }
}

impl fmt::Display for NibbleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ABORT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for NibbleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for nibble operations
pub type NibbleResult<T> = Result<T, NibbleError>;
