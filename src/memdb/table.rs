//! Row storage for one table
//!
//! Rows live in a BTreeMap keyed by primary-key values (or a synthetic row
//! id for keyless tables such as export sinks). Every countable index whose
//! leading column is set gets an `OrderedIndex` maintained on insert/delete.

use std::collections::BTreeMap;

use crate::catalog::{TableDescriptor, Value};
use crate::sql::{ComparisonOperator, ExecutionError, ExecutionResult, SortOrder};

use super::index::{OrderedIndex, RowKey};

/// A stored row, values in column order
pub type Row = Vec<Value>;

#[derive(Debug, Clone)]
struct MaintainedIndex {
    name: String,
    column: usize,
    tree: OrderedIndex,
}

/// Rows and indexes of a single table
#[derive(Debug, Clone)]
pub struct TableData {
    descriptor: TableDescriptor,
    key_ordinals: Vec<usize>,
    rows: BTreeMap<RowKey, Row>,
    indexes: Vec<MaintainedIndex>,
    next_row_id: i64,
}

impl TableData {
    /// Creates empty storage for a normalized descriptor
    pub fn new(descriptor: TableDescriptor) -> Self {
        let key_ordinals = descriptor
            .primary_key_columns()
            .iter()
            .map(|c| c.ordinal)
            .collect();
        let indexes = Self::maintained_indexes(&descriptor);
        Self {
            descriptor,
            key_ordinals,
            rows: BTreeMap::new(),
            indexes,
            next_row_id: 0,
        }
    }

    fn maintained_indexes(descriptor: &TableDescriptor) -> Vec<MaintainedIndex> {
        descriptor
            .indexes
            .iter()
            .filter(|i| i.countable)
            .filter_map(|i| {
                let column = descriptor.column(i.leading_column()?)?;
                Some(MaintainedIndex {
                    name: i.name.clone(),
                    column: column.ordinal,
                    tree: OrderedIndex::new(),
                })
            })
            .collect()
    }

    /// Swaps in a new descriptor and rebuilds every index from the rows
    pub fn rebuild(&mut self, descriptor: TableDescriptor) {
        self.indexes = Self::maintained_indexes(&descriptor);
        self.descriptor = descriptor;
        for (key, row) in &self.rows {
            for index in &mut self.indexes {
                index.tree.insert(row[index.column].clone(), key.clone());
            }
        }
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in key order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn get(&self, key: &RowKey) -> Option<&Row> {
        self.rows.get(key)
    }

    fn check_row(&self, row: &[Value]) -> ExecutionResult<()> {
        if row.len() != self.descriptor.columns.len() {
            return Err(ExecutionError::ParameterCount {
                statement: format!("INSERT INTO {}", self.descriptor.name),
                expected: self.descriptor.columns.len(),
                actual: row.len(),
            });
        }
        for (column, value) in self.descriptor.columns.iter().zip(row) {
            if value.value_type() != column.column_type {
                return Err(ExecutionError::TypeMismatch {
                    target: format!("{}.{}", self.descriptor.name, column.name),
                    expected: column.column_type,
                    actual: value.value_type(),
                });
            }
        }
        Ok(())
    }

    /// Inserts a row, enforcing arity, column types and key uniqueness
    pub fn insert(&mut self, row: Row) -> ExecutionResult<()> {
        self.check_row(&row)?;

        let key = if self.key_ordinals.is_empty() {
            self.next_row_id += 1;
            vec![Value::BigInt(self.next_row_id)]
        } else {
            self.key_ordinals.iter().map(|&o| row[o].clone()).collect()
        };

        if self.rows.contains_key(&key) {
            return Err(ExecutionError::ConstraintViolation {
                table: self.descriptor.name.clone(),
                reason: format!(
                    "duplicate primary key ({})",
                    key.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                ),
            });
        }

        for index in &mut self.indexes {
            index.tree.insert(row[index.column].clone(), key.clone());
        }
        self.rows.insert(key, row);
        Ok(())
    }

    /// Deletes the row with the given key; returns whether it existed
    pub fn delete_by_key(&mut self, key: &RowKey) -> bool {
        match self.rows.remove(key) {
            Some(row) => {
                for index in &mut self.indexes {
                    index.tree.remove(&row[index.column], key);
                }
                true
            }
            None => false,
        }
    }

    /// Deletes every row whose columns at `ordinals` equal `values`
    pub fn delete_where(&mut self, ordinals: &[usize], values: &[Value]) -> usize {
        let keys: Vec<RowKey> = self
            .rows
            .iter()
            .filter(|(_, row)| ordinals.iter().zip(values).all(|(&o, v)| &row[o] == v))
            .map(|(key, _)| key.clone())
            .collect();
        keys.iter().filter(|key| self.delete_by_key(key)).count()
    }

    /// Ordinals of the primary-key columns
    pub fn key_ordinals(&self) -> &[usize] {
        &self.key_ordinals
    }

    fn usable_index(&self, name: Option<&str>, column: usize) -> Option<&OrderedIndex> {
        let name = name?;
        self.indexes
            .iter()
            .find(|i| i.column == column && i.name.eq_ignore_ascii_case(name))
            .map(|i| &i.tree)
    }

    /// Sorted (value, key) pairs of every row; the unindexed fallback
    fn full_scan(&self, column: usize) -> Vec<(&Value, &RowKey)> {
        let mut entries: Vec<_> = self.rows.iter().map(|(k, row)| (&row[column], k)).collect();
        entries.sort();
        entries
    }

    /// Keys of rows matching `column <op> bound`, in the requested order
    pub fn matching_keys(
        &self,
        column: usize,
        operator: ComparisonOperator,
        bound: &Value,
        order: SortOrder,
        index: Option<&str>,
    ) -> Vec<RowKey> {
        if let Some(tree) = self.usable_index(index, column) {
            return tree.scan(operator, bound, order);
        }
        let mut keys: Vec<RowKey> = self
            .full_scan(column)
            .into_iter()
            .filter(|(value, _)| operator.matches(value, bound))
            .map(|(_, key)| key.clone())
            .collect();
        if order == SortOrder::Descending {
            keys.reverse();
        }
        keys
    }

    /// Number of rows matching `column <op> bound`
    pub fn count_matching(
        &self,
        column: usize,
        operator: ComparisonOperator,
        bound: &Value,
        index: Option<&str>,
    ) -> usize {
        match self.usable_index(index, column) {
            Some(tree) => tree.count(operator, bound),
            None => self
                .rows
                .values()
                .filter(|row| operator.matches(&row[column], bound))
                .count(),
        }
    }

    /// Column value of the row at `offset` in the requested order
    pub fn value_at(
        &self,
        column: usize,
        offset: usize,
        order: SortOrder,
        index: Option<&str>,
    ) -> Option<Value> {
        if let Some(tree) = self.usable_index(index, column) {
            return tree.value_at(offset, order);
        }
        let entries = self.full_scan(column);
        let found = match order {
            SortOrder::Ascending => entries.get(offset),
            SortOrder::Descending => entries.iter().rev().nth(offset),
        };
        found.map(|(value, _)| (*value).clone())
    }
}
