//! Batch mover: SELECT, then per row INSERT into the sink and DELETE by key

use crate::catalog::{TableDescriptor, Value};
use crate::sql::{ResultTable, SqlExecutor};

use super::cutoff::Cutoff;
use super::errors::{NibbleError, NibbleResult};
use super::statements::StatementSet;

/// Moves every row on the processed side of `cutoff` and returns how many
/// were moved.
///
/// Rows are visited in the SELECT's scan order; each is copied to the sink
/// (when the set has an insert statement) before it is deleted.
pub fn move_rows(
    executor: &mut impl SqlExecutor,
    statements: &StatementSet,
    table: &TableDescriptor,
    cutoff: &Cutoff,
) -> NibbleResult<i64> {
    let select = if cutoff.inclusive {
        &statements.select_through
    } else {
        &statements.select
    };
    let mut rows = executor
        .execute(select, std::slice::from_ref(&cutoff.bound))
        .map_err(|e| NibbleError::execution_failed(select.name(), e))?;

    let key_ordinals = key_ordinals(&rows, table)?;
    let mut moved = 0i64;

    while rows.advance_row() {
        let row = match rows.current_row() {
            Some(row) => row,
            None => break,
        };

        if let Some(insert) = &statements.insert {
            executor
                .execute(insert, row)
                .map_err(|e| NibbleError::execution_failed(insert.name(), e))?;
        }

        let key: Vec<Value> = key_ordinals.iter().map(|&o| row[o].clone()).collect();
        let delete = &statements.delete;
        executor
            .execute(delete, &key)
            .map_err(|e| NibbleError::execution_failed(delete.name(), e))?;

        moved += 1;
    }

    Ok(moved)
}

/// Positions of the primary-key columns within the SELECT result
fn key_ordinals(rows: &ResultTable, table: &TableDescriptor) -> NibbleResult<Vec<usize>> {
    table
        .primary_key
        .iter()
        .map(|key| {
            rows.column_index(key).ok_or_else(|| {
                NibbleError::statement_binding_failure(format!(
                    "select result for '{}' lacks primary key column '{}'",
                    table.name, key
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogRead, ColumnType, IndexDescriptor};
    use crate::memdb::MemoryDatabase;
    use crate::nibble::index_selector::IndexSelection;
    use crate::nibble::statements::resolve_statements;
    use crate::sql::{ComparisonOperator, StatementKind};

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
            TableDescriptor::new("sink")
                .with_column("id", ColumnType::Integer)
                .with_column("v", ColumnType::BigInt),
        )
        .unwrap();
        for i in 0..10 {
            db.insert("t", vec![Value::Integer(i), Value::BigInt(i64::from(i))])
                .unwrap();
        }
        db
    }

    fn statements(db: &MemoryDatabase, sink: bool) -> (TableDescriptor, StatementSet) {
        let table = db.catalog().table("t").unwrap().clone();
        let column = table.column("v").unwrap().clone();
        let sink = if sink { db.catalog().table("sink") } else { None };
        let set = resolve_statements(
            &table,
            &column,
            ComparisonOperator::Lt,
            &IndexSelection::Ranked("t_v".into()),
            sink,
        )
        .unwrap();
        (table, set)
    }

    #[test]
    fn test_delete_only_move() {
        let mut db = database();
        let (table, set) = statements(&db, false);
        let moved = db
            .run_in_transaction(|tx| move_rows(tx, &set, &table, &Cutoff::untightened(4, Value::BigInt(4))))
            .unwrap();
        assert_eq!(moved, 4);
        assert_eq!(db.row_count("t"), 6);
        assert_eq!(db.row_count("sink"), 0);
    }

    #[test]
    fn test_export_inserts_before_delete() {
        let mut db = database();
        let (table, set) = statements(&db, true);
        let moved = db
            .run_in_transaction(|tx| move_rows(tx, &set, &table, &Cutoff::untightened(2, Value::BigInt(2))))
            .unwrap();
        assert_eq!(moved, 2);
        assert_eq!(
            db.last_statements(),
            &[
                StatementKind::Select,
                StatementKind::Insert,
                StatementKind::Delete,
                StatementKind::Insert,
                StatementKind::Delete,
            ]
        );
        assert_eq!(
            db.rows("sink").unwrap(),
            vec![
                vec![Value::Integer(0), Value::BigInt(0)],
                vec![Value::Integer(1), Value::BigInt(1)],
            ]
        );
    }

    #[test]
    fn test_nothing_matching() {
        let mut db = database();
        let (table, set) = statements(&db, true);
        let moved = db
            .run_in_transaction(|tx| move_rows(tx, &set, &table, &Cutoff::untightened(0, Value::BigInt(-1))))
            .unwrap();
        assert_eq!(moved, 0);
        assert_eq!(db.last_statements(), &[StatementKind::Select]);
    }

    /// A tightened strict bound selects the bound value itself too
    #[test]
    fn test_inclusive_cutoff_moves_bound_row() {
        let mut db = database();
        let (table, set) = statements(&db, false);
        let cutoff = Cutoff {
            matching_rows: 5,
            bound: Value::BigInt(2),
            tightened: true,
            inclusive: true,
        };
        let moved = db
            .run_in_transaction(|tx| move_rows(tx, &set, &table, &cutoff))
            .unwrap();
        assert_eq!(moved, 3);
        assert_eq!(db.row_count("t"), 7);
    }
}
