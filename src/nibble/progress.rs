//! Invocation progress reporting

use crate::catalog::{ColumnType, Value};
use crate::sql::{ResultColumn, ResultTable};

pub const EXPORTED_ROWS: &str = "EXPORTED_ROWS";
pub const LEFT_ROWS: &str = "LEFT_ROWS";

/// Outcome of one chunked invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NibbleProgress {
    /// Rows moved (exported and/or deleted) by this invocation
    pub exported_rows: i64,
    /// Rows that matched at invocation start and were not moved
    pub left_rows: i64,
}

impl NibbleProgress {
    pub fn new(exported_rows: i64, left_rows: i64) -> Self {
        Self {
            exported_rows,
            left_rows,
        }
    }

    /// True once nothing matching is left
    pub fn is_drained(&self) -> bool {
        self.left_rows == 0
    }

    /// One-row table `EXPORTED_ROWS BIGINT, LEFT_ROWS BIGINT`
    pub fn to_result_table(&self) -> ResultTable {
        ResultTable::new(
            vec![
                ResultColumn::new(EXPORTED_ROWS, ColumnType::BigInt),
                ResultColumn::new(LEFT_ROWS, ColumnType::BigInt),
            ],
            vec![vec![
                Value::BigInt(self.exported_rows),
                Value::BigInt(self.left_rows),
            ]],
        )
    }

    /// Reads a table produced by `to_result_table`
    pub fn from_result_table(table: &ResultTable) -> Option<Self> {
        let row = table.fetch_row(0)?;
        let exported_rows = row.get(table.column_index(EXPORTED_ROWS)?)?.as_i64()?;
        let left_rows = row.get(table.column_index(LEFT_ROWS)?)?.as_i64()?;
        Some(Self::new(exported_rows, left_rows))
    }
}
