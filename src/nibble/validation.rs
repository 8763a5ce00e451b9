//! Request validation
//!
//! Checks run in a fixed order, and all of them run before any statement
//! executes:
//!
//! 1. chunk size
//! 2. operator
//! 3. table, primary key, sink, replicated flag, column
//! 4. bound parameter shape
//! 5. bound parameter type

use crate::catalog::{CatalogRead, ColumnDescriptor, TableDescriptor, Value};
use crate::sql::{ComparisonOperator, ResultTable};

use super::errors::{NibbleError, NibbleResult};

/// Catalog objects a nibble invocation operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTarget {
    pub table: TableDescriptor,
    pub column: ColumnDescriptor,
    pub sink: Option<TableDescriptor>,
}

pub fn check_chunk_size(chunk_size: i64) -> NibbleResult<()> {
    if chunk_size <= 0 {
        return Err(NibbleError::invalid_argument(format!(
            "chunk size must be greater than zero, got {}",
            chunk_size
        )));
    }
    Ok(())
}

pub fn parse_operator(operator: &str) -> NibbleResult<ComparisonOperator> {
    ComparisonOperator::parse(operator).ok_or_else(|| {
        NibbleError::invalid_argument(format!(
            "unknown comparison operator '{}', expected one of LT, LE, GT, GE, EQ",
            operator
        ))
    })
}

/// Resolves and checks the table, sink and column of a request
pub fn validate_target(
    catalog: &impl CatalogRead,
    table: &str,
    column: &str,
    replicated: bool,
    sink: Option<&str>,
) -> NibbleResult<ValidatedTarget> {
    let table_desc = catalog
        .table(table)
        .ok_or_else(|| NibbleError::table_not_found(table))?;

    if !table_desc.has_primary_key() {
        return Err(NibbleError::schema_mismatch(format!(
            "table '{}' has no primary key",
            table_desc.name
        )));
    }

    let sink_desc = match sink {
        Some(name) => Some(
            catalog
                .table(name)
                .ok_or_else(|| NibbleError::sink_not_found(name))?
                .clone(),
        ),
        None => None,
    };

    if table_desc.replicated != replicated {
        return Err(NibbleError::schema_mismatch(format!(
            "table '{}' is {} but the request is for a {} table",
            table_desc.name,
            table_desc.kind(),
            if replicated { "replicated" } else { "partitioned" }
        )));
    }

    let column_desc = table_desc
        .column(column)
        .ok_or_else(|| NibbleError::column_not_found(&table_desc.name, column))?;

    Ok(ValidatedTarget {
        table: table_desc.clone(),
        column: column_desc.clone(),
        sink: sink_desc,
    })
}

/// Extracts the bound value from a caller-supplied parameter table.
///
/// The table must have exactly one column and at least one row; the first
/// row's value is the bound.
pub fn bound_from_table(parameter: &ResultTable) -> NibbleResult<Value> {
    if parameter.column_count() != 1 {
        return Err(NibbleError::invalid_argument(format!(
            "bound parameter table must have exactly one column, got {}",
            parameter.column_count()
        )));
    }
    parameter
        .fetch_row(0)
        .and_then(|row| row.first())
        .cloned()
        .ok_or_else(|| NibbleError::invalid_argument("bound parameter table has no rows"))
}

/// The bound's runtime type must equal the column's declared type
pub fn check_bound_type(target: &ValidatedTarget, bound: &Value) -> NibbleResult<()> {
    if bound.value_type() != target.column.column_type {
        return Err(NibbleError::schema_mismatch(format!(
            "bound parameter type {} does not match column '{}.{}' of type {}",
            bound.value_type(),
            target.table.name,
            target.column.name,
            target.column.column_type
        )));
    }
    Ok(())
}
