//! In-memory transactional SQL executor
//!
//! A small reference implementation of the collaborators the nibble
//! procedures consume: a catalog (`CatalogRead`) and a statement executor
//! (`SqlExecutor`) bound to one transaction at a time.
//!
//! # Invariants
//!
//! - A transaction's writes are visible to later statements in the same
//!   transaction and to nobody else until commit
//! - An aborted transaction leaves every table untouched
//! - Countable indexes are maintained on every insert and delete; statements
//!   naming an index that does not exist fall back to a full scan

mod database;
mod index;
mod table;

pub use database::{MemoryDatabase, Transaction, MODIFIED_TUPLES};
pub use index::{OrderedIndex, RowKey};
pub use table::{Row, TableData};
