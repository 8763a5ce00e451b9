//! In-memory catalog registry
//!
//! Tables are keyed by upper-cased name so lookups are case-insensitive.
//! Every mutation bumps the schema version; consumers that cache anything
//! derived from the catalog compare versions to detect staleness.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::errors::{CatalogError, CatalogResult};
use super::types::{IndexDescriptor, TableDescriptor};

/// Read-only catalog access
pub trait CatalogRead {
    /// Case-insensitive table lookup
    fn table(&self, name: &str) -> Option<&TableDescriptor>;

    /// Opaque token that changes whenever the schema changes
    fn schema_version(&self) -> u64;
}

/// Catalog file layout
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    version: u64,
    tables: Vec<TableDescriptor>,
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableDescriptor>,
    version: u64,
}

impl Catalog {
    /// Creates an empty catalog at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from JSON.
    ///
    /// Expected layout: `{"version": 3, "tables": [ ... ]}`. Every table is
    /// structurally validated; the first invalid table fails the load.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        Self::parse(json, "<inline>")
    }

    /// Loads a catalog JSON file from disk
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(json: &str, source_name: &str) -> CatalogResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| CatalogError::malformed(source_name, format!("Invalid JSON: {}", e)))?;

        let mut catalog = Catalog::new();
        for table in file.tables {
            catalog.add_table(table)?;
        }
        catalog.version = file.version;
        Ok(catalog)
    }

    /// Registers a new table
    pub fn add_table(&mut self, mut table: TableDescriptor) -> CatalogResult<()> {
        table.normalize();
        table.validate_structure()?;
        let key = table.name.to_ascii_uppercase();
        if self.tables.contains_key(&key) {
            return Err(CatalogError::DuplicateTable(table.name));
        }
        self.tables.insert(key, table);
        self.version += 1;
        Ok(())
    }

    /// Adds an index to an existing table
    pub fn add_index(&mut self, table: &str, index: IndexDescriptor) -> CatalogResult<()> {
        let descriptor = self
            .tables
            .get_mut(&table.to_ascii_uppercase())
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;
        let mut updated = descriptor.clone();
        updated.indexes.push(index);
        updated.validate_structure()?;
        *descriptor = updated;
        self.version += 1;
        Ok(())
    }

    /// Returns all tables in name order
    pub fn tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.values()
    }

    /// Number of registered tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are registered
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl CatalogRead for Catalog {
    fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.get(&name.to_ascii_uppercase())
    }

    fn schema_version(&self) -> u64 {
        self.version
    }
}
