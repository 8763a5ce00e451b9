//! Catalog subsystem for nibbledb
//!
//! Read-only metadata the nibble procedures consult before touching data:
//! tables, their columns, indexes, primary keys and replication mode.
//!
//! # Design Principles
//!
//! - Lookups by name are case-insensitive
//! - Every schema change bumps a version token
//! - Descriptors are plain data, loadable from JSON

mod errors;
mod registry;
mod types;
mod value;

pub use errors::{CatalogError, CatalogResult};
pub use registry::{Catalog, CatalogRead};
pub use types::{ColumnDescriptor, IndexDescriptor, TableDescriptor};
pub use value::{ColumnType, Value};
