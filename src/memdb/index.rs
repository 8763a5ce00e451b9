//! BTreeMap-based ordered index
//!
//! Maps a column value to the sorted keys of the rows holding it. Iteration
//! order is deterministic: ascending by value, then by row key. Descending
//! scans are the exact reverse of that order.
//!
//! The index is rank-capable: `value_at` walks entry counts to find the
//! value at a given offset, and `count` sums the matching range.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::catalog::Value;
use crate::sql::{ComparisonOperator, SortOrder};

/// Row identity: primary-key values, or a synthetic row id for keyless tables
pub type RowKey = Vec<Value>;

/// A single-column ordered index
#[derive(Debug, Clone, Default)]
pub struct OrderedIndex {
    /// Maps values to sorted lists of row keys
    tree: BTreeMap<Value, Vec<RowKey>>,
}

impl OrderedIndex {
    /// Creates a new empty index
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert a row key under a value.
    ///
    /// Maintains sorted ascending key order.
    pub fn insert(&mut self, value: Value, row: RowKey) {
        let rows = self.tree.entry(value).or_default();

        match rows.binary_search(&row) {
            Ok(_) => {}
            Err(pos) => rows.insert(pos, row),
        }
    }

    /// Remove a row key from a value.
    ///
    /// If the value has no more rows, removes the value entirely.
    pub fn remove(&mut self, value: &Value, row: &RowKey) {
        if let Some(rows) = self.tree.get_mut(value) {
            if let Ok(pos) = rows.binary_search(row) {
                rows.remove(pos);
            }
            if rows.is_empty() {
                self.tree.remove(value);
            }
        }
    }

    /// All row keys for an exact value, sorted ascending
    pub fn lookup_eq(&self, value: &Value) -> Vec<RowKey> {
        self.tree.get(value).cloned().unwrap_or_default()
    }

    fn bounds<'v>(operator: ComparisonOperator, bound: &'v Value) -> (Bound<&'v Value>, Bound<&'v Value>) {
        match operator {
            ComparisonOperator::Lt => (Bound::Unbounded, Bound::Excluded(bound)),
            ComparisonOperator::Le => (Bound::Unbounded, Bound::Included(bound)),
            ComparisonOperator::Gt => (Bound::Excluded(bound), Bound::Unbounded),
            ComparisonOperator::Ge => (Bound::Included(bound), Bound::Unbounded),
            ComparisonOperator::Eq => (Bound::Included(bound), Bound::Included(bound)),
        }
    }

    /// Row keys whose value satisfies `value <op> bound`, in scan order
    pub fn scan(&self, operator: ComparisonOperator, bound: &Value, order: SortOrder) -> Vec<RowKey> {
        let range = self.tree.range(Self::bounds(operator, bound));
        match order {
            SortOrder::Ascending => range.flat_map(|(_, rows)| rows.iter().cloned()).collect(),
            SortOrder::Descending => range
                .rev()
                .flat_map(|(_, rows)| rows.iter().rev().cloned())
                .collect(),
        }
    }

    /// Number of rows whose value satisfies `value <op> bound`
    pub fn count(&self, operator: ComparisonOperator, bound: &Value) -> usize {
        self.tree
            .range(Self::bounds(operator, bound))
            .map(|(_, rows)| rows.len())
            .sum()
    }

    /// Value of the row at `offset` (0-based) in the given order
    pub fn value_at(&self, offset: usize, order: SortOrder) -> Option<Value> {
        let mut remaining = offset;
        let mut entries: Box<dyn Iterator<Item = (&Value, &Vec<RowKey>)>> = match order {
            SortOrder::Ascending => Box::new(self.tree.iter()),
            SortOrder::Descending => Box::new(self.tree.iter().rev()),
        };
        entries.find_map(|(value, rows)| {
            if remaining < rows.len() {
                Some(value.clone())
            } else {
                remaining -= rows.len();
                None
            }
        })
    }

    /// Returns the number of distinct values
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns the total number of indexed rows
    pub fn entry_count(&self) -> usize {
        self.tree.values().map(|v| v.len()).sum()
    }
}
