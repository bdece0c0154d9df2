//! Symbol Registry
//!
//! The fixed table of exports the bridge depends on, bound once into
//! [`Sqlite3Api`], and the [`Bridge`] that records whether that worked.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::handle::{DbHandle, StmtHandle};
use crate::config::BridgeConfig;
use crate::ffi::{
    bind, Destructor, FfiError, FunctionDescriptor, LibraryLoader, NativeBytes, NativeFn,
    NativeStr, SymbolSource,
};

/// Declares the export table: one typed stub field per native function.
///
/// Fields are bound in declaration order and registration stops at the first
/// missing export.
macro_rules! sqlite3_api {
    ($( $field:ident => $symbol:literal : fn($($arg:ty),*) -> $ret:ty; )*) => {
        /// Typed stubs for every bound export
        pub struct Sqlite3Api {
            $( pub(crate) $field: unsafe extern "C" fn($($arg),*) -> $ret, )*
            /// Keeps the resolved addresses mapped
            source: Arc<dyn SymbolSource>,
        }

        impl Sqlite3Api {
            /// Export names, in binding order
            pub const SYMBOLS: &'static [&'static str] = &[$($symbol),*];

            /// Bind every export from `source`, aborting on the first failure
            pub fn register_all(source: Arc<dyn SymbolSource>) -> Result<Self, FfiError> {
                Ok(Self {
                    $( $field: bind(&*source, $symbol)?, )*
                    source,
                })
            }

            /// Descriptor table derived from the stub types
            pub fn descriptors() -> Vec<FunctionDescriptor> {
                vec![
                    $( <unsafe extern "C" fn($($arg),*) -> $ret as NativeFn>::descriptor($symbol), )*
                ]
            }
        }
    };
}

sqlite3_api! {
    db_handle => "sqlite3_db_handle": fn(StmtHandle) -> DbHandle;
    last_insert_rowid => "sqlite3_last_insert_rowid": fn(DbHandle) -> i64;
    changes => "sqlite3_changes": fn(DbHandle) -> i32;
    total_changes => "sqlite3_total_changes": fn(DbHandle) -> i32;
    libversion => "sqlite3_libversion": fn() -> NativeStr;
    libversion_number => "sqlite3_libversion_number": fn() -> i32;
    sourceid => "sqlite3_sourceid": fn() -> NativeStr;
    errstr => "sqlite3_errstr": fn(i32) -> NativeStr;
    errcode => "sqlite3_errcode": fn(DbHandle) -> i32;
    extended_errcode => "sqlite3_extended_errcode": fn(DbHandle) -> i32;
    errmsg => "sqlite3_errmsg": fn(DbHandle) -> NativeStr;
    threadsafe => "sqlite3_threadsafe": fn() -> i32;
    open_v2 => "sqlite3_open_v2": fn(NativeStr, *mut DbHandle, i32, NativeStr) -> i32;
    busy_timeout => "sqlite3_busy_timeout": fn(DbHandle, i32) -> i32;
    close_v2 => "sqlite3_close_v2": fn(DbHandle) -> i32;
    prepare_v2 => "sqlite3_prepare_v2": fn(DbHandle, NativeStr, i32, *mut StmtHandle, *mut NativeStr) -> i32;
    get_autocommit => "sqlite3_get_autocommit": fn(DbHandle) -> i32;
    finalize => "sqlite3_finalize": fn(StmtHandle) -> i32;
    bind_parameter_count => "sqlite3_bind_parameter_count": fn(StmtHandle) -> i32;
    bind_parameter_index => "sqlite3_bind_parameter_index": fn(StmtHandle, NativeStr) -> i32;
    bind_parameter_name => "sqlite3_bind_parameter_name": fn(StmtHandle, i32) -> NativeStr;
    reset => "sqlite3_reset": fn(StmtHandle) -> i32;
    bind_null => "sqlite3_bind_null": fn(StmtHandle, i32) -> i32;
    bind_int64 => "sqlite3_bind_int64": fn(StmtHandle, i32, i64) -> i32;
    bind_int => "sqlite3_bind_int": fn(StmtHandle, i32, i32) -> i32;
    bind_text => "sqlite3_bind_text": fn(StmtHandle, i32, NativeStr, i32, Destructor) -> i32;
    bind_double => "sqlite3_bind_double": fn(StmtHandle, i32, f64) -> i32;
    bind_blob => "sqlite3_bind_blob": fn(StmtHandle, i32, NativeBytes, i32, Destructor) -> i32;
    column_count => "sqlite3_column_count": fn(StmtHandle) -> i32;
    column_name => "sqlite3_column_name": fn(StmtHandle, i32) -> NativeStr;
    interrupt => "sqlite3_interrupt": fn(DbHandle) -> ();
    clear_bindings => "sqlite3_clear_bindings": fn(StmtHandle) -> i32;
    step => "sqlite3_step": fn(StmtHandle) -> i32;
    column_decltype => "sqlite3_column_decltype": fn(StmtHandle, i32) -> NativeStr;
    column_type => "sqlite3_column_type": fn(StmtHandle, i32) -> i32;
    column_int64 => "sqlite3_column_int64": fn(StmtHandle, i32) -> i64;
    column_double => "sqlite3_column_double": fn(StmtHandle, i32) -> f64;
    column_bytes => "sqlite3_column_bytes": fn(StmtHandle, i32) -> i32;
    column_blob => "sqlite3_column_blob": fn(StmtHandle, i32) -> NativeBytes;
    column_text => "sqlite3_column_text": fn(StmtHandle, i32) -> NativeBytes;
}

impl Sqlite3Api {
    /// Name of the source the stubs were bound from
    pub fn library_name(&self) -> &str {
        self.source.name()
    }
}

static GLOBAL: OnceCell<Bridge> = OnceCell::new();

/// Outcome of registering the export table.
///
/// Construction never fails: a load or symbol failure is stored and handed
/// back, unchanged, by every later API call, which then never reaches native
/// code. There is no retry.
pub struct Bridge {
    state: Result<Sqlite3Api, FfiError>,
}

impl Bridge {
    /// Open the configured library and bind every export
    pub fn load(config: &BridgeConfig) -> Self {
        let loader = LibraryLoader::with_search_paths(config.library.search_paths.clone());
        let state = loader
            .open(&config.library.name)
            .and_then(|library| Sqlite3Api::register_all(Arc::new(library)));
        Self::from_state(state)
    }

    /// Bind every export from an already opened source
    pub fn from_source(source: Arc<dyn SymbolSource>) -> Self {
        Self::from_state(Sqlite3Api::register_all(source))
    }

    fn from_state(state: Result<Sqlite3Api, FfiError>) -> Self {
        match &state {
            Ok(api) => debug!(
                library = api.library_name(),
                symbols = Sqlite3Api::SYMBOLS.len(),
                "registered sqlite3 exports"
            ),
            Err(err) => warn!(error = %err, "sqlite3 export registration failed"),
        }
        Self { state }
    }

    /// Install the process-wide bridge. The first call wins; later calls
    /// return the existing bridge and ignore `config`.
    pub fn init(config: &BridgeConfig) -> &'static Bridge {
        GLOBAL.get_or_init(|| Bridge::load(config))
    }

    /// The process-wide bridge, loading from the discovered configuration if
    /// nothing was installed yet
    pub fn global() -> &'static Bridge {
        GLOBAL.get_or_init(|| Bridge::load(&BridgeConfig::discover()))
    }

    pub fn is_registered(&self) -> bool {
        self.state.is_ok()
    }

    /// The stored registration failure, if any
    pub fn init_error(&self) -> Option<&FfiError> {
        self.state.as_ref().err()
    }

    /// Name of the library the stubs came from
    pub fn library_name(&self) -> Option<&str> {
        self.state.as_ref().ok().map(Sqlite3Api::library_name)
    }

    pub(crate) fn api(&self) -> Result<&Sqlite3Api, FfiError> {
        self.state.as_ref().map_err(Clone::clone)
    }
}
