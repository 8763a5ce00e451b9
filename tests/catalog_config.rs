//! Catalog and configuration loading tests
//!
//! Test Categories:
//! 1. Catalog files drive a working database
//! 2. Config files drive engine behaviour
//! 3. Log lines are well-formed JSON

use std::fs;

use tempfile::TempDir;

use nibbledb::catalog::{Catalog, CatalogError, CatalogRead, ColumnType, Value};
use nibbledb::config::{ConfigError, NibbleConfig};
use nibbledb::memdb::MemoryDatabase;
use nibbledb::nibble::{NibbleEngine, NibbleProgress, NibbleRequest};
use nibbledb::observability::{Event, Logger, Severity};
use nibbledb::sql::ComparisonOperator;

const CATALOG_JSON: &str = r#"{
    "version": 12,
    "tables": [
        {
            "name": "sessions",
            "columns": [
                {"name": "id", "type": "BIGINT"},
                {"name": "expires", "type": "BIGINT"}
            ],
            "indexes": [
                {"name": "sessions_expires", "columns": ["expires"]}
            ],
            "primary_key": ["id"]
        },
        {
            "name": "sessions_expired",
            "columns": [
                {"name": "id", "type": "BIGINT"},
                {"name": "expires", "type": "BIGINT"}
            ]
        }
    ]
}"#;

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// CATALOG FILES
// =============================================================================

#[test]
fn test_catalog_file_drives_database() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "catalog.json", CATALOG_JSON);

    let catalog = Catalog::load(&path).unwrap();
    assert_eq!(catalog.schema_version(), 12);
    assert_eq!(catalog.len(), 2);
    let sessions = catalog.table("SESSIONS").unwrap();
    assert_eq!(sessions.column("expires").unwrap().column_type, ColumnType::BigInt);
    assert_eq!(sessions.column("expires").unwrap().ordinal, 1);
    assert!(sessions.indexes[0].countable);

    let mut db = MemoryDatabase::from_catalog(catalog);
    for id in 0..50 {
        db.insert("sessions", vec![Value::BigInt(id), Value::BigInt(id * 10)])
            .unwrap();
    }

    let engine = NibbleEngine::default();
    let request = NibbleRequest::new(
        "sessions",
        "expires",
        ComparisonOperator::Le,
        Value::BigInt(200),
        10,
    )
    .with_sink("sessions_expired");
    let progress = db
        .run_in_transaction(|tx| engine.nibble(tx.catalog(), tx, &request))
        .unwrap();

    // 21 rows match; rank 10 is expires = 100, LE includes it
    assert_eq!(progress, NibbleProgress::new(11, 10));
    assert_eq!(db.row_count("sessions_expired"), 11);
}

#[test]
fn test_catalog_file_errors() {
    let dir = TempDir::new().unwrap();

    let missing = Catalog::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, CatalogError::Io { .. }));

    let garbage = write_file(&dir, "garbage.json", "{ not json");
    assert!(matches!(
        Catalog::load(&garbage).unwrap_err(),
        CatalogError::Malformed { .. }
    ));

    let bad_key = write_file(
        &dir,
        "bad_key.json",
        r#"{"tables": [{"name": "t", "columns": [{"name": "a", "type": "INTEGER"}], "primary_key": ["b"]}]}"#,
    );
    assert!(matches!(
        Catalog::load(&bad_key).unwrap_err(),
        CatalogError::InvalidTable { .. }
    ));
}

// =============================================================================
// CONFIG FILES
// =============================================================================

#[test]
fn test_config_file_disables_statement_cache() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "nibble.json",
        r#"{"statement_cache_enabled": false, "log_progress": false}"#,
    );
    let config = NibbleConfig::load(&path).unwrap();
    assert!(!config.log_progress);

    let engine = NibbleEngine::new(config);
    let mut db = MemoryDatabase::from_catalog(Catalog::from_json_str(CATALOG_JSON).unwrap());
    for id in 0..5 {
        db.insert("sessions", vec![Value::BigInt(id), Value::BigInt(id)])
            .unwrap();
    }
    let request = NibbleRequest::new("sessions", "expires", ComparisonOperator::Lt, Value::BigInt(2), 1);
    for _ in 0..2 {
        db.run_in_transaction(|tx| engine.nibble(tx.catalog(), tx, &request))
            .unwrap();
    }

    assert_eq!(engine.cached_statements(), 0);
    assert_eq!(engine.metrics().snapshot().statement_cache_misses, 2);
    assert_eq!(db.row_count("sessions"), 3);
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "nibble.json", r#"{"unindexed_warn_interval_secs": 0}"#);
    assert!(matches!(
        NibbleConfig::load(&path).unwrap_err(),
        ConfigError::Invalid { .. }
    ));

    let path = write_file(&dir, "typo.json", r#"{"log_levle": "WARN"}"#);
    assert!(matches!(
        NibbleConfig::load(&path).unwrap_err(),
        ConfigError::Malformed(_)
    ));
}

// =============================================================================
// LOG FORMAT
// =============================================================================

#[test]
fn test_lifecycle_log_lines_are_json() {
    let line = Logger::render(
        Event::NibbleExportComplete.severity(),
        Event::NibbleExportComplete.as_str(),
        &[("left_rows", "400"), ("exported_rows", "100"), ("invocation_id", "abc")],
    );
    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["event"], "NIBBLE_EXPORT_COMPLETE");
    assert_eq!(parsed["severity"], "INFO");
    assert_eq!(parsed["exported_rows"], "100");
    assert_eq!(parsed["left_rows"], "400");

    let warning = Logger::render(
        Event::IndexUnavailable.severity(),
        Event::IndexUnavailable.as_str(),
        &[("table", "events"), ("column", "ts")],
    );
    let parsed: serde_json::Value = serde_json::from_str(&warning).unwrap();
    assert_eq!(parsed["severity"], Severity::Warn.as_str());
}
