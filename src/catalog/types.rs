//! Catalog descriptors for tables, columns and indexes
//!
//! Descriptors are read-only snapshots of catalog metadata. Name lookups
//! are case-insensitive, matching SQL identifier rules.

use serde::{Deserialize, Serialize};

use super::errors::{CatalogError, CatalogResult};
use super::value::ColumnType;

/// A single column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Position in the table's column list (assigned on normalize)
    #[serde(default)]
    pub ordinal: usize,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            ordinal: 0,
        }
    }
}

/// An index over one or more columns
///
/// A countable index supports rank/offset lookups; countable implies ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name
    pub name: String,
    /// Indexed columns, leading column first
    pub columns: Vec<String>,
    /// Supports positional rank queries
    #[serde(default = "default_countable")]
    pub countable: bool,
}

fn default_countable() -> bool {
    true
}

impl IndexDescriptor {
    /// Create a countable (ordered, rank-capable) index
    pub fn countable(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            countable: true,
        }
    }

    /// Create an index without rank support (e.g. a hash index)
    pub fn uncountable(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            countable: false,
            ..Self::countable(name, columns)
        }
    }

    /// Returns the leading column, if any
    pub fn leading_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}

/// Table metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,
    /// Indexes in catalog order
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
    /// Primary-key column names in key order (empty if none)
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Replicated (full copy per partition) vs partitioned
    #[serde(default)]
    pub replicated: bool,
}

impl TableDescriptor {
    /// Create an empty partitioned table descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            primary_key: Vec::new(),
            replicated: false,
        }
    }

    /// Append a column
    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        let mut column = ColumnDescriptor::new(name, column_type);
        column.ordinal = self.columns.len();
        self.columns.push(column);
        self
    }

    /// Set the primary key
    pub fn with_primary_key(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append an index
    pub fn with_index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }

    /// Mark the table as replicated
    pub fn replicated(mut self, replicated: bool) -> Self {
        self.replicated = replicated;
        self
    }

    /// Case-insensitive column lookup
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Primary-key column descriptors in key order
    pub fn primary_key_columns(&self) -> Vec<&ColumnDescriptor> {
        self.primary_key.iter().filter_map(|k| self.column(k)).collect()
    }

    /// Returns true if the table declares a primary key
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Returns "replicated" or "partitioned"
    pub fn kind(&self) -> &'static str {
        if self.replicated {
            "replicated"
        } else {
            "partitioned"
        }
    }

    /// Reassign ordinals from declaration order
    pub fn normalize(&mut self) {
        for (ordinal, column) in self.columns.iter_mut().enumerate() {
            column.ordinal = ordinal;
        }
    }

    /// Validate the descriptor's internal references.
    ///
    /// Column names must be unique; primary-key and index columns must exist.
    pub fn validate_structure(&self) -> CatalogResult<()> {
        if self.columns.is_empty() {
            return Err(CatalogError::invalid_table(&self.name, "table has no columns"));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(CatalogError::invalid_table(
                    &self.name,
                    format!("duplicate column '{}'", column.name),
                ));
            }
        }
        for key in &self.primary_key {
            if self.column(key).is_none() {
                return Err(CatalogError::invalid_table(
                    &self.name,
                    format!("primary key column '{}' does not exist", key),
                ));
            }
        }
        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(CatalogError::invalid_table(
                    &self.name,
                    format!("index '{}' has no columns", index.name),
                ));
            }
            if let Some(missing) = index.columns.iter().find(|c| self.column(c).is_none()) {
                return Err(CatalogError::invalid_table(
                    &self.name,
                    format!("index '{}' references unknown column '{}'", index.name, missing),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events_table() -> TableDescriptor {
        TableDescriptor::new("events")
            .with_column("id", ColumnType::Integer)
            .with_column("ts", ColumnType::Timestamp)
            .with_primary_key(["id"])
            .with_index(IndexDescriptor::countable("events_ts", ["ts"]))
    }

    #[test]
    fn test_builder_assigns_ordinals() {
        let table = events_table();
        assert_eq!(table.column("id").unwrap().ordinal, 0);
        assert_eq!(table.column("ts").unwrap().ordinal, 1);
    }

    #[test]
    fn test_column_lookup_case_insensitive() {
        let table = events_table();
        assert!(table.column("TS").is_some());
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_primary_key_columns() {
        let table = events_table();
        let keys = table.primary_key_columns();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "id");
        assert!(table.has_primary_key());
    }

    #[test]
    fn test_validate_rejects_unknown_index_column() {
        let table = events_table().with_index(IndexDescriptor::countable("bad", ["nope"]));
        let err = table.validate_structure().unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_validate_rejects_duplicate_column() {
        let table = events_table().with_column("ID", ColumnType::BigInt);
        assert!(table.validate_structure().is_err());
    }

    #[test]
    fn test_index_defaults_to_countable_in_json() {
        let index: IndexDescriptor =
            serde_json::from_str(r#"{"name": "i", "columns": ["ts"]}"#).unwrap();
        assert!(index.countable);
        assert_eq!(index.leading_column(), Some("ts"));
    }
}
