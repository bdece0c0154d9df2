//! sqlite-bridge - Run-time bindings to the native SQLite library
//!
//! Opens `libsqlite3.so.0` with the dynamic loader, resolves a fixed table of
//! exports and calls them through typed `extern "C"` stubs, so nothing links
//! against SQLite at build time.
//!
//! # Layers
//!
//! - **Loader** ([`ffi::SharedObject`], [`ffi::LibraryLoader`]): open a shared
//!   object and resolve exports by name
//! - **Trampolines** ([`ffi::NativeFn`], [`ffi::bind`]): turn an address into a
//!   typed function pointer whose signature drives the calling convention
//! - **Marshalling** ([`ffi::marshal`]): owned NUL-terminated strings in,
//!   bounded copies out
//! - **Registry** ([`sqlite::Sqlite3Api`], [`sqlite::Bridge`]): the export table,
//!   bound once per process
//! - **API** (methods on [`sqlite::Bridge`]): open, prepare, bind, step, read
//!   columns, finalize, close
//!
//! # Example
//!
//! ```no_run
//! use sqlite_bridge::sqlite::{Bridge, OpenFlags};
//!
//! let bridge = Bridge::global();
//! if let Some(err) = bridge.init_error() {
//!     eprintln!("sqlite unavailable: {}", err);
//!     return;
//! }
//!
//! let (db, _) = bridge
//!     .open_v2(":memory:", OpenFlags::READWRITE | OpenFlags::CREATE, None)
//!     .unwrap();
//! println!("sqlite {}", bridge.libversion().unwrap());
//! bridge.close_v2(db).unwrap();
//! ```

pub mod config;
pub mod ffi;
pub mod sqlite;

pub use config::{BridgeConfig, ConfigError};
pub use ffi::FfiError;
pub use sqlite::{Bridge, ColumnType, DbHandle, OpenFlags, ResultCode, StmtHandle, Value};
