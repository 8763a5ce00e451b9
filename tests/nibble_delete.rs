//! Delete-only nibble tests
//!
//! One `DELETE ... WHERE column = ?` per key, no chunking, no index
//! requirement. Only the final key's outcome is returned.

use nibbledb::catalog::{ColumnType, TableDescriptor, Value};
use nibbledb::memdb::{MemoryDatabase, MODIFIED_TUPLES};
use nibbledb::nibble::{NibbleEngine, NibbleErrorCode};
use nibbledb::sql::StatementKind;

fn orders_db() -> MemoryDatabase {
    let mut db = MemoryDatabase::new();
    db.create_table(
        TableDescriptor::new("orders")
            .with_column("id", ColumnType::BigInt)
            .with_column("customer", ColumnType::Varchar)
            .with_primary_key(["id"]),
    )
    .unwrap();
    for id in 0..10 {
        let customer = if id % 2 == 0 { "even" } else { "odd" };
        db.insert("orders", vec![Value::BigInt(id), Value::varchar(customer)])
            .unwrap();
    }
    db
}

fn remaining_ids(db: &MemoryDatabase) -> Vec<i64> {
    db.rows("orders")
        .unwrap()
        .iter()
        .map(|row| row[0].as_i64().unwrap())
        .collect()
}

// =============================================================================
// KEY DELETION
// =============================================================================

/// Keys [3, 7, 9] on ten rows leave seven; the result is the last key's.
#[test]
fn test_delete_three_keys() {
    let engine = NibbleEngine::default();
    let mut db = orders_db();
    let keys = [Value::BigInt(3), Value::BigInt(7), Value::BigInt(9)];

    let mut result = db
        .run_in_transaction(|tx| {
            engine.nibble_delete(tx.catalog(), tx, &Value::BigInt(0), "orders", "id", &keys)
        })
        .unwrap()
        .expect("non-empty key list returns a result");

    assert_eq!(db.row_count("orders"), 7);
    assert_eq!(remaining_ids(&db), vec![0, 1, 2, 4, 5, 6, 8]);
    assert_eq!(result.column_name(0), Some(MODIFIED_TUPLES));
    assert!(result.advance_row());
    assert_eq!(result.get_long(0), Some(1));
    assert_eq!(
        db.last_statements(),
        &[StatementKind::Delete, StatementKind::Delete, StatementKind::Delete]
    );
    assert_eq!(engine.metrics().snapshot().rows_deleted, 3);
    assert_eq!(engine.metrics().snapshot().delete_invocations, 1);
}

/// The returned outcome reflects only the final key, even if it matched nothing.
#[test]
fn test_result_reflects_final_key_only() {
    let engine = NibbleEngine::default();
    let mut db = orders_db();
    let keys = [Value::BigInt(1), Value::BigInt(42)];

    let result = db
        .run_in_transaction(|tx| {
            engine.nibble_delete(tx.catalog(), tx, &Value::BigInt(0), "orders", "id", &keys)
        })
        .unwrap()
        .unwrap();

    assert_eq!(result.as_scalar_long(), Some(0));
    assert_eq!(db.row_count("orders"), 9);
}

#[test]
fn test_empty_key_list() {
    let engine = NibbleEngine::default();
    let mut db = orders_db();

    let result = db
        .run_in_transaction(|tx| {
            engine.nibble_delete(tx.catalog(), tx, &Value::BigInt(0), "orders", "id", &[])
        })
        .unwrap();

    assert!(result.is_none());
    assert!(db.last_statements().is_empty());
    assert_eq!(db.row_count("orders"), 10);
}

/// Non-key columns delete every matching row; no index is needed.
#[test]
fn test_delete_by_non_key_column() {
    let engine = NibbleEngine::default();
    let mut db = orders_db();

    let result = db
        .run_in_transaction(|tx| {
            engine.nibble_delete(
                tx.catalog(),
                tx,
                &Value::varchar("p0"),
                "ORDERS",
                "Customer",
                &[Value::varchar("odd")],
            )
        })
        .unwrap()
        .unwrap();

    assert_eq!(result.as_scalar_long(), Some(5));
    assert_eq!(remaining_ids(&db), vec![0, 2, 4, 6, 8]);
}

// =============================================================================
// ABORTS
// =============================================================================

#[test]
fn test_unknown_table_or_column() {
    let engine = NibbleEngine::default();
    let mut db = orders_db();

    for (table, column) in [("nope", "id"), ("orders", "nope")] {
        let err = db
            .run_in_transaction(|tx| {
                engine.nibble_delete(
                    tx.catalog(),
                    tx,
                    &Value::BigInt(0),
                    table,
                    column,
                    &[Value::BigInt(1)],
                )
            })
            .unwrap_err();
        assert_eq!(err.code(), NibbleErrorCode::NibbleNotFound);
    }
    assert_eq!(db.row_count("orders"), 10);
}

/// A mistyped key anywhere in the list aborts before the first delete.
#[test]
fn test_mistyped_key_aborts_before_any_delete() {
    let engine = NibbleEngine::default();
    let mut db = orders_db();
    let keys = [Value::BigInt(1), Value::Integer(2)];

    let err = db
        .run_in_transaction(|tx| {
            engine.nibble_delete(tx.catalog(), tx, &Value::BigInt(0), "orders", "id", &keys)
        })
        .unwrap_err();

    assert_eq!(err.code(), NibbleErrorCode::NibbleSchemaMismatch);
    assert!(db.last_statements().is_empty());
    assert_eq!(db.row_count("orders"), 10);
    assert_eq!(engine.metrics().snapshot().aborts, 1);
}

// =============================================================================
// STATEMENT REUSE
// =============================================================================

#[test]
fn test_delete_statement_cached_per_table_and_column() {
    let engine = NibbleEngine::default();
    let mut db = orders_db();

    for id in [1, 2] {
        db.run_in_transaction(|tx| {
            engine.nibble_delete(tx.catalog(), tx, &Value::BigInt(0), "orders", "id", &[Value::BigInt(id)])
        })
        .unwrap();
    }

    let snapshot = engine.metrics().snapshot();
    assert_eq!(snapshot.statement_cache_misses, 1);
    assert_eq!(snapshot.statement_cache_hits, 1);
    assert_eq!(engine.cached_statements(), 1);
}
