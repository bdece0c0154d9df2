//! FFI Module
//!
//! Run-time binding to native shared libraries without a build-time link
//! step.
//!
//! # Architecture
//!
//! ```text
//! Typed API call (e.g. Bridge::step)
//!       │
//!       ▼
//! Typed stub: unsafe extern "C" fn(StmtHandle) -> i32
//!       │            ▲
//!       │            │ bind::<F>(source, "sqlite3_step")
//!       │            │
//!       │      SymbolSource (SharedObject via libloading, or SymbolTable)
//!       ▼
//! Native function call
//! ```
//!
//! Strings and blobs cross the boundary through [`marshal`]; nothing else in
//! the crate reads native memory.
//!
//! # Example
//!
//! ```ignore
//! let libc = SharedObject::open("libc.so.6")?;
//! let getpid: unsafe extern "C" fn() -> i32 = bind(&libc, "getpid")?;
//! let pid = unsafe { getpid() };
//! ```

mod error;
mod loader;
pub mod marshal;
mod types;

pub use error::FfiError;
pub use loader::{
    bind, library_filename, LibraryLoader, SharedObject, SymbolAddress, SymbolSource, SymbolTable,
};
pub use marshal::{ByteArg, Destructor, NativeBytes, NativeStr, NativeString};
pub use types::{FunctionDescriptor, NativeArg, NativeFn, NativeRet, ValueKind};

#[cfg(test)]
mod tests;
