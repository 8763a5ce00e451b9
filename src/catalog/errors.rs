//! Catalog error types

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog loading and mutation errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Malformed catalog {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("Invalid table {table}: {reason}")]
    InvalidTable { table: String, reason: String },

    #[error("Table already exists: {0}")]
    DuplicateTable(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::Malformed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::InvalidTable {
            table: table.into(),
            reason: reason.into(),
        }
    }
}
