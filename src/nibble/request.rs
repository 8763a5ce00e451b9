//! Typed nibble request

use crate::catalog::Value;
use crate::sql::ComparisonOperator;

/// One chunked delete (or export-then-delete) invocation.
///
/// Matches rows where `column <operator> bound`. Without a sink the rows are
/// only deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct NibbleRequest {
    pub table: String,
    pub column: String,
    pub operator: ComparisonOperator,
    pub bound: Value,
    /// Target rows per invocation; must be positive
    pub chunk_size: i64,
    /// Must match the table's replicated flag
    pub replicated: bool,
    pub sink: Option<String>,
}

impl NibbleRequest {
    /// A partitioned, sink-less request
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        operator: ComparisonOperator,
        bound: Value,
        chunk_size: i64,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            operator,
            bound,
            chunk_size,
            replicated: false,
            sink: None,
        }
    }

    /// Copy rows into `sink` before deleting them
    pub fn with_sink(mut self, sink: impl Into<String>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    pub fn replicated(mut self, replicated: bool) -> Self {
        self.replicated = replicated;
        self
    }
}
