//! Registration Failure Tests
//!
//! A bridge that failed to bind must report the same error from every call
//! and never reach native code.

use std::sync::Arc;

use sqlite_bridge::config::LibraryConfig;
use sqlite_bridge::ffi::{FfiError, SymbolAddress, SymbolTable};
use sqlite_bridge::sqlite::{Bridge, DbHandle, OpenFlags, ResultCode, Sqlite3Api, StmtHandle, Value};
use sqlite_bridge::BridgeConfig;

extern "C" fn never_called() {}

fn config_for(library: &str) -> BridgeConfig {
    BridgeConfig {
        library: LibraryConfig {
            name: library.to_string(),
            search_paths: Vec::new(),
        },
        ..BridgeConfig::default()
    }
}

fn assert_all_calls_fail(bridge: &Bridge, expected: &FfiError) {
    let db = DbHandle::NULL;
    let stmt = StmtHandle::NULL;

    assert_eq!(bridge.libversion().unwrap_err(), *expected);
    assert_eq!(bridge.libversion_number().unwrap_err(), *expected);
    assert_eq!(bridge.sourceid().unwrap_err(), *expected);
    assert_eq!(bridge.threadsafe().unwrap_err(), *expected);
    assert_eq!(bridge.errstr(ResultCode::OK).unwrap_err(), *expected);
    assert_eq!(bridge.errmsg(db).unwrap_err(), *expected);
    assert_eq!(bridge.errcode(db).unwrap_err(), *expected);
    assert_eq!(bridge.extended_errcode(db).unwrap_err(), *expected);

    assert_eq!(
        bridge.open_v2(":memory:", OpenFlags::READWRITE, None).unwrap_err(),
        *expected
    );
    assert_eq!(bridge.close_v2(db).unwrap_err(), *expected);
    assert_eq!(bridge.busy_timeout(db, 10).unwrap_err(), *expected);
    assert_eq!(bridge.get_autocommit(db).unwrap_err(), *expected);
    assert_eq!(bridge.interrupt(db).unwrap_err(), *expected);
    assert_eq!(bridge.last_insert_rowid(db).unwrap_err(), *expected);
    assert_eq!(bridge.changes(db).unwrap_err(), *expected);
    assert_eq!(bridge.total_changes(db).unwrap_err(), *expected);

    assert_eq!(bridge.prepare_v2(db, "SELECT 1").unwrap_err(), *expected);
    assert_eq!(bridge.step(stmt).unwrap_err(), *expected);
    assert_eq!(bridge.reset(stmt).unwrap_err(), *expected);
    assert_eq!(bridge.clear_bindings(stmt).unwrap_err(), *expected);
    assert_eq!(bridge.finalize(stmt).unwrap_err(), *expected);
    assert_eq!(bridge.db_handle(stmt).unwrap_err(), *expected);

    assert_eq!(bridge.bind_parameter_count(stmt).unwrap_err(), *expected);
    assert_eq!(bridge.bind_parameter_index(stmt, ":a").unwrap_err(), *expected);
    assert_eq!(bridge.bind_parameter_name(stmt, 1).unwrap_err(), *expected);
    assert_eq!(bridge.bind_null(stmt, 1).unwrap_err(), *expected);
    assert_eq!(bridge.bind_int(stmt, 1, 1).unwrap_err(), *expected);
    assert_eq!(bridge.bind_int64(stmt, 1, 1).unwrap_err(), *expected);
    assert_eq!(bridge.bind_double(stmt, 1, 1.0).unwrap_err(), *expected);
    assert_eq!(bridge.bind_text(stmt, 1, "x").unwrap_err(), *expected);
    assert_eq!(bridge.bind_blob(stmt, 1, b"x").unwrap_err(), *expected);
    assert_eq!(
        bridge.bind_value(stmt, 1, &Value::Integer(1)).unwrap_err(),
        *expected
    );

    assert_eq!(bridge.column_count(stmt).unwrap_err(), *expected);
    assert_eq!(bridge.column_name(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_decltype(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_type(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_int64(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_double(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_bytes(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_text(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_blob(stmt, 0).unwrap_err(), *expected);
    assert_eq!(bridge.column_value(stmt, 0).unwrap_err(), *expected);
}

#[test]
fn test_partial_table_names_first_missing_export() {
    let dummy = SymbolAddress::new(never_called as usize).unwrap();
    let (last, rest) = Sqlite3Api::SYMBOLS.split_last().unwrap();

    let mut table = SymbolTable::new("partial");
    for symbol in rest {
        table.insert(*symbol, dummy);
    }

    let bridge = Bridge::from_source(Arc::new(table));
    assert!(!bridge.is_registered());

    let err = bridge.init_error().unwrap().clone();
    assert_eq!(err.symbol(), Some(*last));
    assert!(err.to_string().contains("partial"));
    assert_all_calls_fail(&bridge, &err);
}

#[test]
fn test_missing_library_is_a_load_error() {
    let bridge = Bridge::load(&config_for("libno-such-sqlite.so.0"));
    let err = bridge.init_error().unwrap().clone();
    assert!(matches!(err, FfiError::LoadError(_)));
    assert!(bridge.library_name().is_none());
    assert_all_calls_fail(&bridge, &err);
}

#[cfg(target_os = "linux")]
#[test]
fn test_library_without_sqlite_exports() {
    let bridge = Bridge::load(&config_for("libc.so.6"));
    let err = bridge.init_error().unwrap().clone();
    if let FfiError::LoadError(_) = err {
        return;
    }

    assert_eq!(err.symbol(), Some(Sqlite3Api::SYMBOLS[0]));
    match &err {
        FfiError::SymbolNotFound { library, .. } => assert_eq!(library, "libc.so.6"),
        other => panic!("unexpected error: {other}"),
    }
    assert_all_calls_fail(&bridge, &err);
}

#[test]
fn test_global_failure_is_permanent() {
    let first = Bridge::init(&config_for("libno-such-sqlite.so.0"));
    assert!(!first.is_registered());

    // Later initialisation attempts see the stored outcome
    let again = Bridge::init(&BridgeConfig::default());
    let global = Bridge::global();
    assert!(std::ptr::eq(first, again));
    assert!(std::ptr::eq(first, global));
    assert!(!global.is_registered());
    assert_eq!(global.init_error(), first.init_error());
}
