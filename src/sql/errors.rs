//! Statement execution errors

use thiserror::Error;

use crate::catalog::ColumnType;

/// Result type for statement execution
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Failures reported by a SQL executor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },

    #[error("Statement {statement} expects {expected} parameters, got {actual}")]
    ParameterCount {
        statement: String,
        expected: usize,
        actual: usize,
    },

    #[error("Type mismatch for {target}: expected {expected}, got {actual}")]
    TypeMismatch {
        target: String,
        expected: ColumnType,
        actual: ColumnType,
    },

    #[error("Constraint violation on {table}: {reason}")]
    ConstraintViolation { table: String, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Table already exists: {0}")]
    TableExists(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExecutionError::TypeMismatch {
            target: "events.ts".into(),
            expected: ColumnType::Timestamp,
            actual: ColumnType::BigInt,
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for events.ts: expected TIMESTAMP, got BIGINT"
        );
    }
}
