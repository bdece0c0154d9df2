//! Typed API Surface
//!
//! Per-function wrappers over the bound stubs. Every method first checks the
//! registration outcome; `Err` therefore always means "the bridge is not
//! usable", while native result codes come back as ordinary values.
//!
//! Statement lifecycle:
//!
//! ```text
//! open_v2 ─▶ prepare_v2 ─▶ bind_* ─▶ step ⇄ column_* ─▶ finalize ─▶ close_v2
//!                              ▲       │
//!                              └ reset ┘
//! ```

use super::codes::{ColumnType, OpenFlags, Prepared, ResultCode, StepOutcome, Value};
use super::handle::{DbHandle, StmtHandle};
use super::registry::Bridge;
use crate::ffi::marshal::{
    from_native_buffer, from_native_str_opt, from_native_string, UNKNOWN, UNKNOWN_ERROR,
};
use crate::ffi::{ByteArg, Destructor, FfiError, NativeStr, NativeString};

impl Bridge {
    // =========================================================================
    // Library information
    // =========================================================================

    /// Version string of the loaded library, or "Unknown"
    pub fn libversion(&self) -> Result<String, FfiError> {
        let api = self.api()?;
        // Safety: points at a static string inside the library.
        Ok(unsafe { from_native_string((api.libversion)(), UNKNOWN) })
    }

    pub fn libversion_number(&self) -> Result<i32, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.libversion_number)() })
    }

    /// Source identifier of the loaded library, or "Unknown"
    pub fn sourceid(&self) -> Result<String, FfiError> {
        let api = self.api()?;
        Ok(unsafe { from_native_string((api.sourceid)(), UNKNOWN) })
    }

    /// Threading mode the library was compiled with (0 = single-thread)
    pub fn threadsafe(&self) -> Result<i32, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.threadsafe)() })
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// English description of a result code, or "Unknown Error"
    pub fn errstr(&self, code: ResultCode) -> Result<String, FfiError> {
        let api = self.api()?;
        Ok(unsafe { from_native_string((api.errstr)(code.raw()), UNKNOWN_ERROR) })
    }

    /// Message for the most recent failure on `db`, or "Unknown Error"
    pub fn errmsg(&self, db: DbHandle) -> Result<String, FfiError> {
        let api = self.api()?;
        // Safety: the message is owned by the connection and copied here
        // before any other call on it.
        Ok(unsafe { from_native_string((api.errmsg)(db), UNKNOWN_ERROR) })
    }

    pub fn errcode(&self, db: DbHandle) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.errcode)(db) }.into())
    }

    pub fn extended_errcode(&self, db: DbHandle) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.extended_errcode)(db) }.into())
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Open a database connection.
    ///
    /// The handle may be non-null even when the code is not OK; it then
    /// carries the error message and must still be closed.
    pub fn open_v2(
        &self,
        filename: &str,
        flags: OpenFlags,
        vfs: Option<&str>,
    ) -> Result<(DbHandle, ResultCode), FfiError> {
        let api = self.api()?;
        let filename = NativeString::new(filename);
        let vfs = vfs.map(NativeString::new);
        let vfs_ptr = vfs.as_ref().map_or(NativeStr::NULL, NativeString::as_native);

        let mut db = DbHandle::NULL;
        // Safety: `filename` and `vfs` outlive the call; `db` is a valid out slot.
        let code = unsafe { (api.open_v2)(filename.as_native(), &mut db, flags.bits(), vfs_ptr) };
        Ok((db, code.into()))
    }

    pub fn close_v2(&self, db: DbHandle) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.close_v2)(db) }.into())
    }

    /// Wait up to `ms` milliseconds for locks before returning BUSY
    pub fn busy_timeout(&self, db: DbHandle, ms: i32) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.busy_timeout)(db, ms) }.into())
    }

    /// Whether `db` is outside an explicit transaction
    pub fn get_autocommit(&self, db: DbHandle) -> Result<bool, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.get_autocommit)(db) } != 0)
    }

    /// Ask any in-flight operation on `db` to stop early. Other connections
    /// are unaffected.
    pub fn interrupt(&self, db: DbHandle) -> Result<(), FfiError> {
        let api = self.api()?;
        unsafe { (api.interrupt)(db) };
        Ok(())
    }

    pub fn last_insert_rowid(&self, db: DbHandle) -> Result<i64, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.last_insert_rowid)(db) })
    }

    pub fn changes(&self, db: DbHandle) -> Result<i64, FfiError> {
        let api = self.api()?;
        Ok(i64::from(unsafe { (api.changes)(db) }))
    }

    pub fn total_changes(&self, db: DbHandle) -> Result<i64, FfiError> {
        let api = self.api()?;
        Ok(i64::from(unsafe { (api.total_changes)(db) }))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Compile the first statement in `sql`; the rest comes back as `tail`.
    pub fn prepare_v2(&self, db: DbHandle, sql: &str) -> Result<Prepared, FfiError> {
        let api = self.api()?;
        let sql = NativeString::new(sql);
        let Ok(n_byte) = i32::try_from(sql.len_with_nul()) else {
            return Ok(Prepared {
                code: ResultCode::TOOBIG,
                stmt: StmtHandle::NULL,
                tail: String::new(),
            });
        };

        let mut stmt = StmtHandle::NULL;
        let mut tail = NativeStr::NULL;
        // Safety: `sql` outlives the call and `tail` is only interpreted as an
        // offset into it afterwards.
        let code = unsafe { (api.prepare_v2)(db, sql.as_native(), n_byte, &mut stmt, &mut tail) };

        Ok(Prepared {
            code: code.into(),
            stmt,
            tail: sql.tail_after(tail),
        })
    }

    pub fn finalize(&self, stmt: StmtHandle) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.finalize)(stmt) }.into())
    }

    pub fn reset(&self, stmt: StmtHandle) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.reset)(stmt) }.into())
    }

    pub fn clear_bindings(&self, stmt: StmtHandle) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.clear_bindings)(stmt) }.into())
    }

    /// Connection that owns `stmt`
    pub fn db_handle(&self, stmt: StmtHandle) -> Result<DbHandle, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.db_handle)(stmt) })
    }

    /// Advance `stmt` one row, collecting the owning connection's rowid and
    /// change count in the same call.
    ///
    /// A null statement (from SQL holding only comments) has no connection;
    /// its outcome carries the step code with zero rowid and changes.
    pub fn step(&self, stmt: StmtHandle) -> Result<StepOutcome, FfiError> {
        let api = self.api()?;
        unsafe {
            let code = (api.step)(stmt);
            let db = (api.db_handle)(stmt);
            // The connection accessors would dereference a null handle
            if db.is_null() {
                return Ok(StepOutcome {
                    code: code.into(),
                    last_insert_rowid: 0,
                    changes: 0,
                });
            }
            Ok(StepOutcome {
                code: code.into(),
                last_insert_rowid: (api.last_insert_rowid)(db),
                changes: i64::from((api.changes)(db)),
            })
        }
    }

    // =========================================================================
    // Parameters (ordinals are 1-based)
    // =========================================================================

    pub fn bind_parameter_count(&self, stmt: StmtHandle) -> Result<i32, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.bind_parameter_count)(stmt) })
    }

    /// Ordinal of a named parameter such as `:id`, or 0 when absent
    pub fn bind_parameter_index(&self, stmt: StmtHandle, name: &str) -> Result<i32, FfiError> {
        let api = self.api()?;
        let name = NativeString::new(name);
        Ok(unsafe { (api.bind_parameter_index)(stmt, name.as_native()) })
    }

    /// Name of the parameter at `ordinal`; `None` for nameless `?` or out of range
    pub fn bind_parameter_name(
        &self,
        stmt: StmtHandle,
        ordinal: i32,
    ) -> Result<Option<String>, FfiError> {
        let api = self.api()?;
        Ok(unsafe { from_native_str_opt((api.bind_parameter_name)(stmt, ordinal)) })
    }

    pub fn bind_null(&self, stmt: StmtHandle, ordinal: i32) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.bind_null)(stmt, ordinal) }.into())
    }

    pub fn bind_int(
        &self,
        stmt: StmtHandle,
        ordinal: i32,
        value: i32,
    ) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.bind_int)(stmt, ordinal, value) }.into())
    }

    pub fn bind_int64(
        &self,
        stmt: StmtHandle,
        ordinal: i32,
        value: i64,
    ) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.bind_int64)(stmt, ordinal, value) }.into())
    }

    pub fn bind_double(
        &self,
        stmt: StmtHandle,
        ordinal: i32,
        value: f64,
    ) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.bind_double)(stmt, ordinal, value) }.into())
    }

    /// Bind text; the library copies it before returning. Embedded NULs are
    /// kept because the length is passed explicitly.
    pub fn bind_text(
        &self,
        stmt: StmtHandle,
        ordinal: i32,
        value: &str,
    ) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        let Some(arg) = ByteArg::new(value.as_bytes()) else {
            return Ok(ResultCode::TOOBIG);
        };
        let code = unsafe {
            (api.bind_text)(
                stmt,
                ordinal,
                arg.as_native_str(),
                arg.len(),
                Destructor::TRANSIENT,
            )
        };
        Ok(code.into())
    }

    /// Bind a blob; the library copies it before returning
    pub fn bind_blob(
        &self,
        stmt: StmtHandle,
        ordinal: i32,
        value: &[u8],
    ) -> Result<ResultCode, FfiError> {
        let api = self.api()?;
        let Some(arg) = ByteArg::new(value) else {
            return Ok(ResultCode::TOOBIG);
        };
        let code = unsafe {
            (api.bind_blob)(
                stmt,
                ordinal,
                arg.as_native_bytes(),
                arg.len(),
                Destructor::TRANSIENT,
            )
        };
        Ok(code.into())
    }

    /// Bind any owned value with the matching typed call
    pub fn bind_value(
        &self,
        stmt: StmtHandle,
        ordinal: i32,
        value: &Value,
    ) -> Result<ResultCode, FfiError> {
        match value {
            Value::Null => self.bind_null(stmt, ordinal),
            Value::Integer(v) => self.bind_int64(stmt, ordinal, *v),
            Value::Real(v) => self.bind_double(stmt, ordinal, *v),
            Value::Text(v) => self.bind_text(stmt, ordinal, v),
            Value::Blob(v) => self.bind_blob(stmt, ordinal, v),
        }
    }

    // =========================================================================
    // Columns (indexes are 0-based)
    // =========================================================================

    pub fn column_count(&self, stmt: StmtHandle) -> Result<i32, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.column_count)(stmt) })
    }

    pub fn column_name(&self, stmt: StmtHandle, index: i32) -> Result<Option<String>, FfiError> {
        let api = self.api()?;
        Ok(unsafe { from_native_str_opt((api.column_name)(stmt, index)) })
    }

    /// Declared type of a table column; `None` for expressions
    pub fn column_decltype(
        &self,
        stmt: StmtHandle,
        index: i32,
    ) -> Result<Option<String>, FfiError> {
        let api = self.api()?;
        Ok(unsafe { from_native_str_opt((api.column_decltype)(stmt, index)) })
    }

    pub fn column_type(&self, stmt: StmtHandle, index: i32) -> Result<ColumnType, FfiError> {
        let api = self.api()?;
        Ok(ColumnType::from_raw(unsafe { (api.column_type)(stmt, index) }))
    }

    pub fn column_int64(&self, stmt: StmtHandle, index: i32) -> Result<i64, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.column_int64)(stmt, index) })
    }

    pub fn column_double(&self, stmt: StmtHandle, index: i32) -> Result<f64, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.column_double)(stmt, index) })
    }

    pub fn column_bytes(&self, stmt: StmtHandle, index: i32) -> Result<i32, FfiError> {
        let api = self.api()?;
        Ok(unsafe { (api.column_bytes)(stmt, index) })
    }

    /// Column contents as text bytes, copied with the reported length
    pub fn column_text(&self, stmt: StmtHandle, index: i32) -> Result<Vec<u8>, FfiError> {
        let api = self.api()?;
        // Safety: the address is requested first (it may trigger a type
        // conversion), then its length; both stay valid until the next
        // step/reset/finalize, and the copy happens right here.
        unsafe {
            let data = (api.column_text)(stmt, index);
            let len = (api.column_bytes)(stmt, index);
            Ok(from_native_buffer(data, len))
        }
    }

    /// Column contents as blob bytes; no terminator is assumed
    pub fn column_blob(&self, stmt: StmtHandle, index: i32) -> Result<Vec<u8>, FfiError> {
        let api = self.api()?;
        unsafe {
            let data = (api.column_blob)(stmt, index);
            let len = (api.column_bytes)(stmt, index);
            Ok(from_native_buffer(data, len))
        }
    }

    /// Column contents as an owned value of its storage class
    pub fn column_value(&self, stmt: StmtHandle, index: i32) -> Result<Value, FfiError> {
        let value = match self.column_type(stmt, index)? {
            ColumnType::Null => Value::Null,
            ColumnType::Integer => Value::Integer(self.column_int64(stmt, index)?),
            ColumnType::Float => Value::Real(self.column_double(stmt, index)?),
            ColumnType::Text => {
                let bytes = self.column_text(stmt, index)?;
                Value::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            ColumnType::Blob => Value::Blob(self.column_blob(stmt, index)?),
        };
        Ok(value)
    }
}
