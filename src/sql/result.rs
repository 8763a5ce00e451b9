//! Tabular statement results
//!
//! A `ResultTable` is a small row set with a cursor. Callers either iterate
//! with `advance_row` and read the current row by ordinal, or address rows
//! directly with `fetch_row`.

use crate::catalog::{ColumnType, Value};

/// Column metadata of a result table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub column_type: ColumnType,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Row set returned by statement execution
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<ResultColumn>,
    rows: Vec<Vec<Value>>,
    /// Cursor; None before the first `advance_row`
    position: Option<usize>,
}

impl ResultTable {
    /// Creates a result with the given columns and rows
    pub fn new(columns: Vec<ResultColumn>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            position: None,
        }
    }

    /// Creates an empty result with the given columns
    pub fn empty(columns: Vec<ResultColumn>) -> Self {
        Self::new(columns, Vec::new())
    }

    /// Single-row, single-column BIGINT result
    pub fn scalar_long(name: impl Into<String>, value: i64) -> Self {
        Self::new(
            vec![ResultColumn::new(name, ColumnType::BigInt)],
            vec![vec![Value::BigInt(value)]],
        )
    }

    /// Single-row, single-column result holding an arbitrary value
    pub fn single_value(name: impl Into<String>, value: Value) -> Self {
        Self::new(
            vec![ResultColumn::new(name, value.value_type())],
            vec![vec![value]],
        )
    }

    /// Appends a row
    pub fn add_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn column_type(&self, ordinal: usize) -> Option<ColumnType> {
        self.columns.get(ordinal).map(|c| c.column_type)
    }

    pub fn column_name(&self, ordinal: usize) -> Option<&str> {
        self.columns.get(ordinal).map(|c| c.name.as_str())
    }

    /// Case-insensitive column ordinal lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Moves the cursor to the next row; false once past the last row
    pub fn advance_row(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.rows.len());
            false
        }
    }

    /// Rewinds the cursor to before the first row
    pub fn reset_row_position(&mut self) {
        self.position = None;
    }

    /// Value at `ordinal` in the current row
    pub fn get(&self, ordinal: usize) -> Option<&Value> {
        self.current_row().and_then(|row| row.get(ordinal))
    }

    /// Integer value at `ordinal` in the current row, widened to i64
    pub fn get_long(&self, ordinal: usize) -> Option<i64> {
        self.get(ordinal).and_then(Value::as_i64)
    }

    /// The row under the cursor
    pub fn current_row(&self) -> Option<&[Value]> {
        self.position
            .and_then(|p| self.rows.get(p))
            .map(Vec::as_slice)
    }

    /// Row at an absolute index, independent of the cursor
    pub fn fetch_row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// First column of the first row as i64 (aggregate readers)
    pub fn as_scalar_long(&self) -> Option<i64> {
        self.fetch_row(0)
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rows() -> ResultTable {
        ResultTable::new(
            vec![
                ResultColumn::new("ID", ColumnType::Integer),
                ResultColumn::new("NAME", ColumnType::Varchar),
            ],
            vec![
                vec![Value::Integer(1), Value::varchar("a")],
                vec![Value::Integer(2), Value::varchar("b")],
            ],
        )
    }

    #[test]
    fn test_cursor_iteration() {
        let mut table = two_rows();
        assert!(table.get(0).is_none());

        assert!(table.advance_row());
        assert_eq!(table.get_long(0), Some(1));
        assert!(table.advance_row());
        assert_eq!(table.get(1), Some(&Value::varchar("b")));
        assert!(!table.advance_row());
        assert!(table.current_row().is_none());
        assert!(!table.advance_row());

        table.reset_row_position();
        assert!(table.advance_row());
        assert_eq!(table.get_long(0), Some(1));
    }

    #[test]
    fn test_introspection() {
        let table = two_rows();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_type(1), Some(ColumnType::Varchar));
        assert_eq!(table.column_index("name"), Some(1));
        assert_eq!(table.column_index("missing"), None);
        assert_eq!(table.fetch_row(1).unwrap()[0], Value::Integer(2));
    }

    #[test]
    fn test_scalar_long() {
        let table = ResultTable::scalar_long("C1", 42);
        assert_eq!(table.as_scalar_long(), Some(42));

        let empty = ResultTable::empty(vec![ResultColumn::new("C1", ColumnType::BigInt)]);
        assert_eq!(empty.as_scalar_long(), None);
        assert!(empty.is_empty());
    }
}
