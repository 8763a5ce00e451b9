//! In-memory transactional database
//!
//! `run_in_transaction` hands the closure a `Transaction` working on a copy
//! of every table. If the closure returns `Ok` the copy replaces the live
//! tables; on `Err` the copy is dropped, so an aborted invocation leaves no
//! partial effect. Transactions run one at a time (`&mut self`).

use std::collections::HashMap;

use crate::catalog::{Catalog, CatalogRead, CatalogResult, IndexDescriptor, TableDescriptor, Value};
use crate::sql::{
    ExecutionError, ExecutionResult, ResultColumn, ResultTable, SqlExecutor, Statement,
    StatementKind, StatementPlan,
};

use super::table::{Row, TableData};

/// Column name of DML results
pub const MODIFIED_TUPLES: &str = "MODIFIED_TUPLES";

/// An in-memory database: catalog plus table storage
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    catalog: Catalog,
    tables: HashMap<String, TableData>,
    last_statements: Vec<StatementKind>,
}

impl MemoryDatabase {
    /// Creates an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage for every table of an existing catalog
    pub fn from_catalog(catalog: Catalog) -> Self {
        let tables = catalog
            .tables()
            .map(|t| (t.name.to_ascii_uppercase(), TableData::new(t.clone())))
            .collect();
        Self {
            catalog,
            tables,
            last_statements: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Registers a table in the catalog and creates its storage
    pub fn create_table(&mut self, descriptor: TableDescriptor) -> CatalogResult<()> {
        let key = descriptor.name.to_ascii_uppercase();
        self.catalog.add_table(descriptor)?;
        if let Some(normalized) = self.catalog.table(&key) {
            self.tables.insert(key, TableData::new(normalized.clone()));
        }
        Ok(())
    }

    /// Adds an index to a table and builds it from the existing rows
    pub fn create_index(&mut self, table: &str, index: IndexDescriptor) -> CatalogResult<()> {
        self.catalog.add_index(table, index)?;
        let key = table.to_ascii_uppercase();
        if let (Some(descriptor), Some(data)) = (self.catalog.table(&key), self.tables.get_mut(&key)) {
            data.rebuild(descriptor.clone());
        }
        Ok(())
    }

    /// Inserts a row outside of any nibble transaction
    pub fn insert(&mut self, table: &str, row: Row) -> ExecutionResult<()> {
        self.tables
            .get_mut(&table.to_ascii_uppercase())
            .ok_or_else(|| ExecutionError::TableNotFound(table.to_string()))?
            .insert(row)
    }

    /// Rows of a table in primary-key order
    pub fn rows(&self, table: &str) -> Option<Vec<Row>> {
        self.tables
            .get(&table.to_ascii_uppercase())
            .map(|t| t.rows().cloned().collect())
    }

    /// Row count of a table (0 if absent)
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .get(&table.to_ascii_uppercase())
            .map_or(0, TableData::len)
    }

    /// Statements executed by the most recent transaction, committed or not
    pub fn last_statements(&self) -> &[StatementKind] {
        &self.last_statements
    }

    /// Runs `f` as one atomic transaction.
    ///
    /// Commits all writes if `f` returns `Ok`, discards them otherwise.
    pub fn run_in_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    {
        let mut tx = Transaction {
            catalog: &self.catalog,
            tables: self.tables.clone(),
            executed: Vec::new(),
        };
        let result = f(&mut tx);

        let Transaction { tables, executed, .. } = tx;
        self.last_statements = executed;
        if result.is_ok() {
            self.tables = tables;
        }
        result
    }
}

/// A transaction over a working copy of the database
#[derive(Debug)]
pub struct Transaction<'a> {
    catalog: &'a Catalog,
    tables: HashMap<String, TableData>,
    executed: Vec<StatementKind>,
}

impl<'a> Transaction<'a> {
    /// Catalog snapshot the transaction runs against
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Statements executed so far in this transaction
    pub fn executed_statements(&self) -> &[StatementKind] {
        &self.executed
    }

    /// Row count of a table as seen by this transaction
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .get(&table.to_ascii_uppercase())
            .map_or(0, TableData::len)
    }

    fn table_data(&self, name: &str) -> ExecutionResult<&TableData> {
        self.tables
            .get(&name.to_ascii_uppercase())
            .ok_or_else(|| ExecutionError::TableNotFound(name.to_string()))
    }

    fn table_data_mut(&mut self, name: &str) -> ExecutionResult<&mut TableData> {
        self.tables
            .get_mut(&name.to_ascii_uppercase())
            .ok_or_else(|| ExecutionError::TableNotFound(name.to_string()))
    }

    fn column_ordinal(data: &TableData, column: &str) -> ExecutionResult<usize> {
        data.descriptor()
            .column(column)
            .map(|c| c.ordinal)
            .ok_or_else(|| ExecutionError::ColumnNotFound {
                table: data.descriptor().name.clone(),
                column: column.to_string(),
            })
    }

    fn check_bound(data: &TableData, ordinal: usize, bound: &Value) -> ExecutionResult<()> {
        let column = &data.descriptor().columns[ordinal];
        if bound.value_type() != column.column_type {
            return Err(ExecutionError::TypeMismatch {
                target: format!("{}.{}", data.descriptor().name, column.name),
                expected: column.column_type,
                actual: bound.value_type(),
            });
        }
        Ok(())
    }

    fn result_columns(data: &TableData) -> Vec<ResultColumn> {
        data.descriptor()
            .columns
            .iter()
            .map(|c| ResultColumn::new(c.name.clone(), c.column_type))
            .collect()
    }
}

impl CatalogRead for Transaction<'_> {
    fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.catalog.table(name)
    }

    fn schema_version(&self) -> u64 {
        self.catalog.schema_version()
    }
}

impl SqlExecutor for Transaction<'_> {
    fn execute(&mut self, statement: &Statement, params: &[Value]) -> ExecutionResult<ResultTable> {
        if params.len() != statement.parameter_count() {
            return Err(ExecutionError::ParameterCount {
                statement: statement.name().to_string(),
                expected: statement.parameter_count(),
                actual: params.len(),
            });
        }
        self.executed.push(statement.kind());

        match statement.plan() {
            StatementPlan::Count {
                table,
                column,
                operator,
                index,
            } => {
                let data = self.table_data(table)?;
                let ordinal = Self::column_ordinal(data, column)?;
                Self::check_bound(data, ordinal, &params[0])?;
                let count = data.count_matching(ordinal, *operator, &params[0], index.as_deref());
                Ok(ResultTable::scalar_long("C1", count as i64))
            }
            StatementPlan::Select {
                table,
                column,
                operator,
                order,
                index,
            } => {
                let data = self.table_data(table)?;
                let ordinal = Self::column_ordinal(data, column)?;
                Self::check_bound(data, ordinal, &params[0])?;
                let rows = data
                    .matching_keys(ordinal, *operator, &params[0], *order, index.as_deref())
                    .iter()
                    .filter_map(|key| data.get(key).cloned())
                    .collect();
                Ok(ResultTable::new(Self::result_columns(data), rows))
            }
            StatementPlan::Insert { table, .. } => {
                self.table_data_mut(table)?.insert(params.to_vec())?;
                Ok(ResultTable::scalar_long(MODIFIED_TUPLES, 1))
            }
            StatementPlan::Delete { table, key_columns } => {
                let ordinals = {
                    let data = self.table_data(table)?;
                    key_columns
                        .iter()
                        .map(|c| Self::column_ordinal(data, c))
                        .collect::<ExecutionResult<Vec<_>>>()?
                };
                let data = self.table_data_mut(table)?;
                let deleted = if ordinals == data.key_ordinals() {
                    usize::from(data.delete_by_key(&params.to_vec()))
                } else {
                    data.delete_where(&ordinals, params)
                };
                Ok(ResultTable::scalar_long(MODIFIED_TUPLES, deleted as i64))
            }
            StatementPlan::ValueAt {
                table,
                column,
                order,
                index,
            } => {
                let data = self.table_data(table)?;
                let ordinal = Self::column_ordinal(data, column)?;
                let offset = params[0]
                    .as_i64()
                    .and_then(|o| usize::try_from(o).ok())
                    .ok_or_else(|| {
                        ExecutionError::InvalidParameter(format!(
                            "offset must be a non-negative integer, got {}",
                            params[0]
                        ))
                    })?;
                let descriptor_column = &data.descriptor().columns[ordinal];
                let columns = vec![ResultColumn::new(
                    descriptor_column.name.clone(),
                    descriptor_column.column_type,
                )];
                match data.value_at(ordinal, offset, *order, index.as_deref()) {
                    Some(value) => Ok(ResultTable::new(columns, vec![vec![value]])),
                    None => Ok(ResultTable::empty(columns)),
                }
            }
        }
    }
}
