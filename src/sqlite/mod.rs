//! SQLite bindings resolved at run time
//!
//! [`Bridge`] binds the fixed export table of `libsqlite3` once and exposes
//! the statement-level API on top of it.
//!
//! # Example
//!
//! ```no_run
//! use sqlite_bridge::sqlite::{Bridge, OpenFlags};
//! use sqlite_bridge::BridgeConfig;
//!
//! let bridge = Bridge::init(&BridgeConfig::default());
//! let (db, code) = bridge
//!     .open_v2(":memory:", OpenFlags::READWRITE | OpenFlags::CREATE, None)
//!     .unwrap();
//! assert!(code.is_ok());
//!
//! let prepared = bridge.prepare_v2(db, "SELECT 40 + 2").unwrap();
//! assert!(bridge.step(prepared.stmt).unwrap().code.is_row());
//! assert_eq!(bridge.column_int64(prepared.stmt, 0).unwrap(), 42);
//!
//! bridge.finalize(prepared.stmt).unwrap();
//! bridge.close_v2(db).unwrap();
//! ```

mod api;
mod codes;
mod handle;
mod registry;

pub use codes::{ColumnType, OpenFlags, Prepared, ResultCode, StepOutcome, Value};
pub use handle::{DbHandle, StmtHandle};
pub use registry::{Bridge, Sqlite3Api};
