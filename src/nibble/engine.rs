//! Nibble engine: the invocation surface
//!
//! One engine is shared by every invocation on a node. It owns the statement
//! cache, the unindexed-column warning limiter and the metrics; everything
//! else is per invocation. Invocations run inside the caller's transaction
//! through the `SqlExecutor` they are handed, so an `Err` return leaves it to
//! the caller to roll back.

use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::{CatalogRead, Value};
use crate::config::NibbleConfig;
use crate::observability::{
    log_event, Event, NibbleMetrics, ObservationScope, RateLimitedLogger,
};
use crate::sql::{ComparisonOperator, ResultTable, SqlExecutor, Statement};

use super::cutoff::resolve_cutoff;
use super::errors::{NibbleError, NibbleResult};
use super::index_selector::{select_index, IndexSelection};
use super::mover::move_rows;
use super::progress::NibbleProgress;
use super::request::NibbleRequest;
use super::statements::{
    resolve_delete_by_column, resolve_statements, StatementCache, StatementKey, StatementSet,
};
use super::validation::{
    bound_from_table, check_bound_type, check_chunk_size, parse_operator, validate_target,
    ValidatedTarget,
};

enum OperatorArg<'a> {
    Parsed(ComparisonOperator),
    Text(&'a str),
}

enum BoundArg<'a> {
    Value(&'a Value),
    Table(&'a ResultTable),
}

/// Arguments of one chunked invocation, before validation
struct Invocation<'a> {
    table: &'a str,
    column: &'a str,
    operator: OperatorArg<'a>,
    bound: BoundArg<'a>,
    chunk_size: i64,
    replicated: bool,
    sink: Option<&'a str>,
}

impl Invocation<'_> {
    fn log_fields(&self, invocation_id: &str) -> Vec<(&'static str, String)> {
        let operator = match &self.operator {
            OperatorArg::Parsed(op) => op.as_str().to_string(),
            OperatorArg::Text(text) => text.to_string(),
        };
        let mut fields = vec![
            ("invocation_id", invocation_id.to_string()),
            ("table", self.table.to_string()),
            ("column", self.column.to_string()),
            ("operator", operator),
            ("chunk_size", self.chunk_size.to_string()),
        ];
        if let Some(sink) = self.sink {
            fields.push(("sink", sink.to_string()));
        }
        fields
    }
}

/// Chunked delete and export-then-delete engine
#[derive(Debug)]
pub struct NibbleEngine {
    config: NibbleConfig,
    statements: StatementCache,
    unindexed_warnings: RateLimitedLogger,
    metrics: NibbleMetrics,
}

impl Default for NibbleEngine {
    fn default() -> Self {
        Self::new(NibbleConfig::default())
    }
}

impl NibbleEngine {
    pub fn new(config: NibbleConfig) -> Self {
        Self {
            unindexed_warnings: RateLimitedLogger::new(config.unindexed_warn_interval()),
            statements: StatementCache::new(),
            metrics: NibbleMetrics::new(),
            config,
        }
    }

    pub fn config(&self) -> &NibbleConfig {
        &self.config
    }

    pub fn metrics(&self) -> &NibbleMetrics {
        &self.metrics
    }

    /// Number of cached statement entries
    pub fn cached_statements(&self) -> usize {
        self.statements.len()
    }

    /// Drops every cached statement regardless of schema version
    pub fn invalidate_statements(&self) {
        self.statements.invalidate();
        log_event(Event::StatementCacheInvalidated, &[("reason", "requested")]);
    }

    /// Runs one chunked invocation described by `request`.
    ///
    /// Without a sink the matching rows are only deleted.
    pub fn nibble(
        &self,
        catalog: &impl CatalogRead,
        executor: &mut impl SqlExecutor,
        request: &NibbleRequest,
    ) -> NibbleResult<NibbleProgress> {
        let invocation = Invocation {
            table: &request.table,
            column: &request.column,
            operator: OperatorArg::Parsed(request.operator),
            bound: BoundArg::Value(&request.bound),
            chunk_size: request.chunk_size,
            replicated: request.replicated,
            sink: request.sink.as_deref(),
        };
        self.run_logged(catalog, executor, &invocation)
    }

    /// Export-then-delete in the stored-procedure calling convention.
    ///
    /// `operator` is one of "LT", "LE", "GT", "GE", "EQ"; `bound` is a
    /// one-column table whose first row holds the bound value. Returns a
    /// one-row `EXPORTED_ROWS`, `LEFT_ROWS` table.
    #[allow(clippy::too_many_arguments)]
    pub fn nibble_export(
        &self,
        catalog: &impl CatalogRead,
        executor: &mut impl SqlExecutor,
        table: &str,
        column: &str,
        operator: &str,
        bound: &ResultTable,
        chunk_size: i64,
        replicated: bool,
        sink: &str,
    ) -> NibbleResult<ResultTable> {
        let invocation = Invocation {
            table,
            column,
            operator: OperatorArg::Text(operator),
            bound: BoundArg::Table(bound),
            chunk_size,
            replicated,
            sink: Some(sink),
        };
        self.run_logged(catalog, executor, &invocation)
            .map(|progress| progress.to_result_table())
    }

    /// Deletes `table` rows where `column` equals each key in turn.
    ///
    /// No chunking and no index requirement. Returns the last key's delete
    /// result, or `None` when `keys` is empty. `partition_param` is the
    /// routing value the invocation was dispatched with; it is only logged.
    pub fn nibble_delete(
        &self,
        catalog: &impl CatalogRead,
        executor: &mut impl SqlExecutor,
        partition_param: &Value,
        table: &str,
        column: &str,
        keys: &[Value],
    ) -> NibbleResult<Option<ResultTable>> {
        let invocation_id = Uuid::new_v4().to_string();
        let scope = ObservationScope::new(
            Event::NibbleDeleteBegin,
            Event::NibbleDeleteComplete,
            self.config.log_progress,
            vec![
                ("invocation_id", invocation_id),
                ("partition", partition_param.to_string()),
                ("table", table.to_string()),
                ("column", column.to_string()),
                ("keys", keys.len().to_string()),
            ],
        );

        match self.run_delete(catalog, executor, table, column, keys) {
            Ok((last, deleted)) => {
                self.metrics.increment_delete_invocations();
                self.metrics.add_rows_deleted(deleted);
                scope.complete(&[("deleted_rows", deleted.to_string().as_str())]);
                Ok(last)
            }
            Err(err) => {
                self.metrics.increment_aborts();
                scope.fail(err.code().code(), err.message());
                Err(err)
            }
        }
    }

    fn run_logged(
        &self,
        catalog: &impl CatalogRead,
        executor: &mut impl SqlExecutor,
        invocation: &Invocation<'_>,
    ) -> NibbleResult<NibbleProgress> {
        let invocation_id = Uuid::new_v4().to_string();
        let scope = ObservationScope::new(
            Event::NibbleExportBegin,
            Event::NibbleExportComplete,
            self.config.log_progress,
            invocation.log_fields(&invocation_id),
        );

        match self.run_chunked(catalog, executor, invocation, &invocation_id) {
            Ok(progress) => {
                self.metrics.increment_export_invocations();
                let moved = u64::try_from(progress.exported_rows).unwrap_or(0);
                if invocation.sink.is_some() {
                    self.metrics.add_rows_exported(moved);
                }
                self.metrics.add_rows_deleted(moved);
                scope.complete(&[
                    ("exported_rows", progress.exported_rows.to_string().as_str()),
                    ("left_rows", progress.left_rows.to_string().as_str()),
                ]);
                Ok(progress)
            }
            Err(err) => {
                self.metrics.increment_aborts();
                scope.fail(err.code().code(), err.message());
                Err(err)
            }
        }
    }

    fn run_chunked(
        &self,
        catalog: &impl CatalogRead,
        executor: &mut impl SqlExecutor,
        invocation: &Invocation<'_>,
        invocation_id: &str,
    ) -> NibbleResult<NibbleProgress> {
        check_chunk_size(invocation.chunk_size)?;
        let operator = match invocation.operator {
            OperatorArg::Parsed(op) => op,
            OperatorArg::Text(text) => parse_operator(text)?,
        };
        let target = validate_target(
            catalog,
            invocation.table,
            invocation.column,
            invocation.replicated,
            invocation.sink,
        )?;
        let bound = match invocation.bound {
            BoundArg::Value(value) => value.clone(),
            BoundArg::Table(table) => bound_from_table(table)?,
        };
        check_bound_type(&target, &bound)?;

        let selection = select_index(&target.table, &target.column.name)?;
        if selection.is_unindexed() {
            self.warn_unindexed(&target);
        }
        let statements = self.statement_set(catalog, &target, operator, &selection)?;

        let cutoff = resolve_cutoff(executor, &statements, operator, bound, invocation.chunk_size)?;
        if cutoff.tightened {
            self.metrics.increment_cutoff_lookups();
            log_event(
                Event::CutoffResolved,
                &[
                    ("invocation_id", invocation_id),
                    ("matching_rows", cutoff.matching_rows.to_string().as_str()),
                    ("cutoff", cutoff.bound.to_string().as_str()),
                    ("inclusive", if cutoff.inclusive { "true" } else { "false" }),
                ],
            );
        }

        let exported = move_rows(executor, &statements, &target.table, &cutoff)?;
        Ok(NibbleProgress::new(exported, cutoff.matching_rows - exported))
    }

    fn run_delete(
        &self,
        catalog: &impl CatalogRead,
        executor: &mut impl SqlExecutor,
        table: &str,
        column: &str,
        keys: &[Value],
    ) -> NibbleResult<(Option<ResultTable>, u64)> {
        let table_desc = catalog
            .table(table)
            .ok_or_else(|| NibbleError::table_not_found(table))?;
        let column_desc = table_desc
            .column(column)
            .ok_or_else(|| NibbleError::column_not_found(&table_desc.name, column))?;
        if let Some(key) = keys
            .iter()
            .find(|k| k.value_type() != column_desc.column_type)
        {
            return Err(NibbleError::schema_mismatch(format!(
                "key type {} does not match column '{}.{}' of type {}",
                key.value_type(),
                table_desc.name,
                column_desc.name,
                column_desc.column_type
            )));
        }

        let statement: Arc<Statement> = if self.config.statement_cache_enabled {
            let lookup = self.statements.get_or_resolve_delete(
                catalog.schema_version(),
                table,
                column,
                || resolve_delete_by_column(table_desc, column_desc),
            )?;
            self.record_lookup(lookup.hit, lookup.invalidated, catalog.schema_version());
            lookup.value
        } else {
            self.metrics.increment_statement_cache_misses();
            Arc::new(resolve_delete_by_column(table_desc, column_desc))
        };

        let mut last = None;
        let mut deleted = 0u64;
        for key in keys {
            let result = executor
                .execute(&statement, std::slice::from_ref(key))
                .map_err(|e| NibbleError::execution_failed(statement.name(), e))?;
            deleted += result
                .as_scalar_long()
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0);
            last = Some(result);
        }
        Ok((last, deleted))
    }

    fn statement_set(
        &self,
        catalog: &impl CatalogRead,
        target: &ValidatedTarget,
        operator: ComparisonOperator,
        selection: &IndexSelection,
    ) -> NibbleResult<Arc<StatementSet>> {
        let resolve = || {
            resolve_statements(
                &target.table,
                &target.column,
                operator,
                selection,
                target.sink.as_ref(),
            )
        };

        if !self.config.statement_cache_enabled {
            self.metrics.increment_statement_cache_misses();
            return resolve().map(Arc::new);
        }

        let key = StatementKey::new(
            &target.table.name,
            &target.column.name,
            operator,
            target.sink.as_ref().map(|s| s.name.as_str()),
        );
        let version = catalog.schema_version();
        let lookup = self.statements.get_or_resolve(version, key, resolve)?;
        self.record_lookup(lookup.hit, lookup.invalidated, version);
        Ok(lookup.value)
    }

    fn record_lookup(&self, hit: bool, invalidated: bool, schema_version: u64) {
        if invalidated {
            log_event(
                Event::StatementCacheInvalidated,
                &[("schema_version", schema_version.to_string().as_str())],
            );
        }
        if hit {
            self.metrics.increment_statement_cache_hits();
        } else {
            self.metrics.increment_statement_cache_misses();
            log_event(
                Event::StatementsResolved,
                &[("schema_version", schema_version.to_string().as_str())],
            );
        }
    }

    fn warn_unindexed(&self, target: &ValidatedTarget) {
        self.metrics.increment_unindexed_runs();
        let key = format!("{}.{}", target.table.name, target.column.name).to_ascii_uppercase();
        self.unindexed_warnings.try_log(
            &key,
            Event::IndexUnavailable,
            &[
                ("table", target.table.name.as_str()),
                ("column", target.column.name.as_str()),
                ("reason", "no index leads with the column; using full scans"),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnType, IndexDescriptor, TableDescriptor};
    use crate::memdb::MemoryDatabase;
    use crate::nibble::NibbleErrorCode;

    fn database() -> MemoryDatabase {
        let mut db = MemoryDatabase::new();
        db.create_table(
            TableDescriptor::new("t")
                .with_column("id", ColumnType::Integer)
                .with_column("v", ColumnType::BigInt)
                .with_primary_key(["id"])
                .with_index(IndexDescriptor::countable("t_v", ["v"])),
        )
        .unwrap();
        db.create_table(
            TableDescriptor::new("t_sink")
                .with_column("id", ColumnType::Integer)
                .with_column("v", ColumnType::BigInt),
        )
        .unwrap();
        for i in 0..20 {
            db.insert("t", vec![Value::Integer(i), Value::BigInt(i64::from(i))])
                .unwrap();
        }
        db
    }

    fn lt(bound: i64, chunk: i64) -> NibbleRequest {
        NibbleRequest::new("t", "v", ComparisonOperator::Lt, Value::BigInt(bound), chunk)
    }

    #[test]
    fn test_nibble_moves_one_chunk() {
        let engine = NibbleEngine::default();
        let mut db = database();
        let progress = db
            .run_in_transaction(|tx| engine.nibble(tx.catalog(), tx, &lt(15, 5)))
            .unwrap();
        assert_eq!(progress, NibbleProgress::new(5, 10));
        assert_eq!(db.row_count("t"), 15);
    }

    #[test]
    fn test_metrics_track_invocations() {
        let engine = NibbleEngine::default();
        let mut db = database();
        let request = lt(15, 5).with_sink("t_sink");
        for _ in 0..3 {
            db.run_in_transaction(|tx| engine.nibble(tx.catalog(), tx, &request))
                .unwrap();
        }
        let _ = db.run_in_transaction(|tx| engine.nibble(tx.catalog(), tx, &lt(15, 0)));

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.export_invocations, 3);
        assert_eq!(snapshot.aborts, 1);
        assert_eq!(snapshot.rows_exported, 15);
        assert_eq!(snapshot.rows_deleted, 15);
        assert_eq!(snapshot.statement_cache_misses, 1);
        assert_eq!(snapshot.statement_cache_hits, 2);
        assert_eq!(snapshot.cutoff_lookups, 2);
    }

    #[test]
    fn test_cache_disabled_resolves_every_time() {
        let engine = NibbleEngine::new(NibbleConfig {
            statement_cache_enabled: false,
            ..NibbleConfig::default()
        });
        let mut db = database();
        for _ in 0..2 {
            db.run_in_transaction(|tx| engine.nibble(tx.catalog(), tx, &lt(3, 10)))
                .unwrap();
        }
        assert_eq!(engine.cached_statements(), 0);
        assert_eq!(engine.metrics().snapshot().statement_cache_misses, 2);
    }

    #[test]
    fn test_invalidate_statements() {
        let engine = NibbleEngine::default();
        let mut db = database();
        db.run_in_transaction(|tx| engine.nibble(tx.catalog(), tx, &lt(3, 10)))
            .unwrap();
        assert_eq!(engine.cached_statements(), 1);
        engine.invalidate_statements();
        assert_eq!(engine.cached_statements(), 0);
    }

    #[test]
    fn test_chunk_size_checked_before_operator() {
        let engine = NibbleEngine::default();
        let mut db = database();
        let bound = ResultTable::single_value("b", Value::BigInt(3));
        let err = db
            .run_in_transaction(|tx| {
                engine.nibble_export(tx.catalog(), tx, "t", "v", "??", &bound, 0, false, "t_sink")
            })
            .unwrap_err();
        assert_eq!(err.code(), NibbleErrorCode::NibbleInvalidArgument);
        assert!(err.message().contains("chunk size"));
        assert!(db.last_statements().is_empty());
    }

    #[test]
    fn test_delete_unknown_column() {
        let engine = NibbleEngine::default();
        let mut db = database();
        let err = db
            .run_in_transaction(|tx| {
                engine.nibble_delete(tx.catalog(), tx, &Value::Integer(0), "t", "nope", &[])
            })
            .unwrap_err();
        assert_eq!(err.code(), NibbleErrorCode::NibbleNotFound);
    }
}
