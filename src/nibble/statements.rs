//! Statement resolution and caching
//!
//! `resolve_statements` is a pure function of catalog metadata. The
//! `StatementCache` memoizes its output per (table, column, operator, sink)
//! and drops everything when the catalog schema version moves.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::catalog::{ColumnDescriptor, TableDescriptor};
use crate::sql::{ComparisonOperator, Statement, StatementPlan};

use super::errors::{NibbleError, NibbleResult};
use super::index_selector::IndexSelection;

/// Cache key of a statement set; names are upper-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey {
    pub table: String,
    pub column: String,
    pub operator: ComparisonOperator,
    pub sink: Option<String>,
}

impl StatementKey {
    pub fn new(table: &str, column: &str, operator: ComparisonOperator, sink: Option<&str>) -> Self {
        Self {
            table: table.to_ascii_uppercase(),
            column: column.to_ascii_uppercase(),
            operator,
            sink: sink.map(str::to_ascii_uppercase),
        }
    }
}

/// The statements one chunked invocation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSet {
    pub count: Statement,
    pub select: Statement,
    /// SELECT with the inclusive operator, run against a tightened strict bound
    pub select_through: Statement,
    /// Present only when a sink is configured
    pub insert: Option<Statement>,
    pub delete: Statement,
    pub value_at: Statement,
}

#[derive(Default)]
struct StatementSetBuilder {
    count: Option<Statement>,
    select: Option<Statement>,
    select_through: Option<Statement>,
    insert: Option<Statement>,
    delete: Option<Statement>,
    value_at: Option<Statement>,
}

impl StatementSetBuilder {
    fn build(self, table: &str, insert_required: bool) -> NibbleResult<StatementSet> {
        let missing = |what: &str| {
            NibbleError::statement_binding_failure(format!(
                "could not bind the {} statement for table '{}'",
                what, table
            ))
        };
        if insert_required && self.insert.is_none() {
            return Err(missing("insert"));
        }
        Ok(StatementSet {
            count: self.count.ok_or_else(|| missing("count"))?,
            select: self.select.ok_or_else(|| missing("select"))?,
            select_through: self
                .select_through
                .ok_or_else(|| missing("inclusive select"))?,
            insert: self.insert,
            delete: self.delete.ok_or_else(|| missing("delete"))?,
            value_at: self.value_at.ok_or_else(|| missing("value-at"))?,
        })
    }
}

/// Builds the statement set for one key.
///
/// The insert statement binds only if the sink has the source's column
/// count and column types, position by position. The delete statement binds
/// every primary-key column.
pub fn resolve_statements(
    table: &TableDescriptor,
    column: &ColumnDescriptor,
    operator: ComparisonOperator,
    index: &IndexSelection,
    sink: Option<&TableDescriptor>,
) -> NibbleResult<StatementSet> {
    let prefix = format!("nibble_{}_{}_{}", table.name, column.name, operator.as_str()).to_ascii_lowercase();
    let index_name = index.index_name().map(str::to_string);
    let mut builder = StatementSetBuilder::default();

    builder.count = Some(Statement::new(
        format!("{}_count", prefix),
        StatementPlan::Count {
            table: table.name.clone(),
            column: column.name.clone(),
            operator,
            index: index_name.clone(),
        },
    ));
    builder.select = Some(Statement::new(
        format!("{}_select", prefix),
        StatementPlan::Select {
            table: table.name.clone(),
            column: column.name.clone(),
            operator,
            order: operator.scan_order(),
            index: index_name.clone(),
        },
    ));
    builder.select_through = Some(Statement::new(
        format!("{}_select_through", prefix),
        StatementPlan::Select {
            table: table.name.clone(),
            column: column.name.clone(),
            operator: operator.inclusive(),
            order: operator.scan_order(),
            index: index_name.clone(),
        },
    ));
    builder.value_at = Some(Statement::new(
        format!("{}_value_at", prefix),
        StatementPlan::ValueAt {
            table: table.name.clone(),
            column: column.name.clone(),
            order: operator.scan_order(),
            index: index_name,
        },
    ));

    let key_columns: Vec<String> = table
        .primary_key_columns()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    if !key_columns.is_empty() && key_columns.len() == table.primary_key.len() {
        builder.delete = Some(Statement::new(
            format!("{}_delete", prefix),
            StatementPlan::Delete {
                table: table.name.clone(),
                key_columns,
            },
        ));
    }

    if let Some(sink) = sink {
        if sink_compatible(table, sink) {
            builder.insert = Some(Statement::new(
                format!("{}_insert_{}", prefix, sink.name.to_ascii_lowercase()),
                StatementPlan::Insert {
                    table: sink.name.clone(),
                    arity: sink.columns.len(),
                },
            ));
        }
    }

    builder.build(&table.name, sink.is_some())
}

fn sink_compatible(source: &TableDescriptor, sink: &TableDescriptor) -> bool {
    source.columns.len() == sink.columns.len()
        && source
            .columns
            .iter()
            .zip(&sink.columns)
            .all(|(s, d)| s.column_type == d.column_type)
}

/// Single-column delete used by delete-only invocations
pub fn resolve_delete_by_column(table: &TableDescriptor, column: &ColumnDescriptor) -> Statement {
    Statement::new(
        format!("nibble_{}_{}_delete", table.name, column.name).to_ascii_lowercase(),
        StatementPlan::Delete {
            table: table.name.clone(),
            key_columns: vec![column.name.clone()],
        },
    )
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct CacheLookup<T> {
    pub value: Arc<T>,
    pub hit: bool,
    /// The lookup found a stale schema version and cleared the cache
    pub invalidated: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    schema_version: Option<u64>,
    sets: HashMap<StatementKey, Arc<StatementSet>>,
    deletes: HashMap<(String, String), Arc<Statement>>,
}

impl CacheState {
    /// Clears the cache if it was filled under another version
    fn sync_version(&mut self, schema_version: u64) -> bool {
        if self.schema_version == Some(schema_version) {
            return false;
        }
        let had_entries = !self.sets.is_empty() || !self.deletes.is_empty();
        self.sets.clear();
        self.deletes.clear();
        self.schema_version = Some(schema_version);
        had_entries
    }
}

/// Thread-safe statement cache keyed by schema version
#[derive(Debug, Default)]
pub struct StatementCache {
    state: RwLock<CacheState>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached set for `key`, resolving it on a miss.
    ///
    /// A failed resolution is not cached.
    pub fn get_or_resolve<F>(
        &self,
        schema_version: u64,
        key: StatementKey,
        resolve: F,
    ) -> NibbleResult<CacheLookup<StatementSet>>
    where
        F: FnOnce() -> NibbleResult<StatementSet>,
    {
        {
            let state = self.state.read().map_err(|_| Self::poisoned())?;
            if state.schema_version == Some(schema_version) {
                if let Some(set) = state.sets.get(&key) {
                    return Ok(CacheLookup {
                        value: Arc::clone(set),
                        hit: true,
                        invalidated: false,
                    });
                }
            }
        }

        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        let invalidated = state.sync_version(schema_version);
        if let Some(set) = state.sets.get(&key) {
            return Ok(CacheLookup {
                value: Arc::clone(set),
                hit: true,
                invalidated,
            });
        }
        let set = Arc::new(resolve()?);
        state.sets.insert(key, Arc::clone(&set));
        Ok(CacheLookup {
            value: set,
            hit: false,
            invalidated,
        })
    }

    /// Delete-only counterpart of `get_or_resolve`, keyed by (table, column)
    pub fn get_or_resolve_delete<F>(
        &self,
        schema_version: u64,
        table: &str,
        column: &str,
        resolve: F,
    ) -> NibbleResult<CacheLookup<Statement>>
    where
        F: FnOnce() -> Statement,
    {
        let key = (table.to_ascii_uppercase(), column.to_ascii_uppercase());
        {
            let state = self.state.read().map_err(|_| Self::poisoned())?;
            if state.schema_version == Some(schema_version) {
                if let Some(statement) = state.deletes.get(&key) {
                    return Ok(CacheLookup {
                        value: Arc::clone(statement),
                        hit: true,
                        invalidated: false,
                    });
                }
            }
        }

        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        let invalidated = state.sync_version(schema_version);
        if let Some(statement) = state.deletes.get(&key) {
            return Ok(CacheLookup {
                value: Arc::clone(statement),
                hit: true,
                invalidated,
            });
        }
        let statement = Arc::new(resolve());
        state.deletes.insert(key, Arc::clone(&statement));
        Ok(CacheLookup {
            value: statement,
            hit: false,
            invalidated,
        })
    }

    /// Drops every cached statement
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.state.write() {
            *state = CacheState::default();
        }
    }

    /// Number of cached entries (sets and delete statements)
    pub fn len(&self) -> usize {
        self.state
            .read()
            .map(|s| s.sets.len() + s.deletes.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> NibbleError {
        NibbleError::statement_binding_failure("statement cache lock poisoned")
    }
}
