//! Index selection for the nibble column
//!
//! Only indexes whose leading column is the nibble column qualify. With no
//! candidate the invocation degrades to full scans; with candidates but none
//! rank-capable it aborts, since the cutoff lookup needs positional access.

use crate::catalog::TableDescriptor;

use super::errors::{NibbleError, NibbleResult};

/// Outcome of index selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSelection {
    /// A countable index leads with the column
    Ranked(String),
    /// No index leads with the column
    Unindexed,
}

impl IndexSelection {
    pub fn index_name(&self) -> Option<&str> {
        match self {
            IndexSelection::Ranked(name) => Some(name),
            IndexSelection::Unindexed => None,
        }
    }

    pub fn is_unindexed(&self) -> bool {
        matches!(self, IndexSelection::Unindexed)
    }
}

/// Picks the first countable index, in catalog order, that leads with `column`
pub fn select_index(table: &TableDescriptor, column: &str) -> NibbleResult<IndexSelection> {
    let mut candidates = table
        .indexes
        .iter()
        .filter(|index| {
            index
                .leading_column()
                .map_or(false, |leading| leading.eq_ignore_ascii_case(column))
        })
        .peekable();

    if candidates.peek().is_none() {
        return Ok(IndexSelection::Unindexed);
    }

    candidates
        .find(|index| index.countable)
        .map(|index| IndexSelection::Ranked(index.name.clone()))
        .ok_or_else(|| {
            NibbleError::schema_mismatch(format!(
                "no index on '{}.{}' supports rank lookups",
                table.name, column
            ))
        })
}
