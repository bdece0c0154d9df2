//! Dynamic Library Loader
//!
//! Safe wrapper around libloading for opening shared objects and resolving
//! their exports, plus the [`SymbolSource`] seam that lets other backends
//! (static tables, in-process functions) stand in for `dlopen`/`dlsym`.

use std::collections::HashMap;
use std::ffi::{c_void, CString};
use std::fmt;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tracing::{debug, trace};

use super::types::NativeFn;
use super::FfiError;

/// A non-null native address resolved from a symbol name.
///
/// Valid only while the source that produced it is alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolAddress(usize);

impl SymbolAddress {
    /// Wrap a raw address, rejecting null
    pub fn new(address: usize) -> Option<Self> {
        (address != 0).then_some(Self(address))
    }

    /// Wrap a raw pointer, rejecting null
    pub fn from_ptr(ptr: *const c_void) -> Option<Self> {
        Self::new(ptr as usize)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for SymbolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolAddress({:#x})", self.0)
    }
}

/// Anything that can map an export name to a native address
pub trait SymbolSource: Send + Sync {
    /// Human-readable name of the source (library path, table name)
    fn name(&self) -> &str;

    /// Resolve `symbol` to its address
    fn resolve(&self, symbol: &str) -> Result<SymbolAddress, FfiError>;
}

/// Resolve `name` in `source` and build the typed stub declared by `F`.
///
/// The descriptor is the stub type itself, so the only way to get it wrong
/// is to declare a Rust signature that differs from the native one; calls
/// through such a stub are undefined behaviour.
pub fn bind<F: NativeFn>(source: &dyn SymbolSource, name: &str) -> Result<F, FfiError> {
    let address = source.resolve(name)?;
    trace!(symbol = name, address = ?address, "bound native stub");

    // Safety: `address` was produced by `source` for `name`; matching the
    // declared signature is the caller's documented precondition.
    Ok(unsafe { F::from_address(address) })
}

/// A dynamically loaded shared object
pub struct SharedObject {
    /// Path (or bare file name) the library was opened with
    path: PathBuf,
    /// The loaded library handle
    library: Library,
}

impl SharedObject {
    /// Open a shared object.
    ///
    /// A bare file name is looked up through the platform dynamic-linker
    /// search path; anything containing a separator is opened as given.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FfiError> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading a library runs its initialisers. The library is
        // untrusted beyond the fact that the caller asked for it by name.
        let library = unsafe {
            Library::new(&path).map_err(|e| {
                FfiError::LoadError(format!(
                    "Failed to load library '{}': {}",
                    path.display(),
                    e
                ))
            })?
        };

        debug!(path = %path.display(), "opened shared object");
        Ok(Self { path, library })
    }

    /// Get the path this library was opened with
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolSource for SharedObject {
    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    fn resolve(&self, symbol: &str) -> Result<SymbolAddress, FfiError> {
        let c_name = CString::new(symbol)
            .map_err(|_| FfiError::InvalidSymbol(format!("Invalid symbol name: {:?}", symbol)))?;

        // Safety: the symbol is read as an untyped address only; giving it a
        // type happens in `bind`.
        let raw: Symbol<*const c_void> = unsafe {
            self.library.get(c_name.as_bytes_with_nul()).map_err(|e| {
                FfiError::SymbolNotFound {
                    symbol: symbol.to_string(),
                    library: self.path.display().to_string(),
                    reason: e.to_string(),
                }
            })?
        };

        SymbolAddress::from_ptr(*raw).ok_or_else(|| FfiError::SymbolNotFound {
            symbol: symbol.to_string(),
            library: self.path.display().to_string(),
            reason: "resolved to a null address".to_string(),
        })
    }
}

impl fmt::Debug for SharedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObject")
            .field("path", &self.path)
            .finish()
    }
}

/// Explicit name to address table.
///
/// Backend for statically linked libraries or functions that live in the
/// current process.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    name: String,
    symbols: HashMap<String, SymbolAddress>,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: HashMap::new(),
        }
    }

    /// Add or replace an entry
    pub fn insert(&mut self, symbol: impl Into<String>, address: SymbolAddress) {
        self.symbols.insert(symbol.into(), address);
    }

    /// Builder form of [`SymbolTable::insert`]
    pub fn with(mut self, symbol: impl Into<String>, address: SymbolAddress) -> Self {
        self.insert(symbol, address);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolSource for SymbolTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, symbol: &str) -> Result<SymbolAddress, FfiError> {
        self.symbols
            .get(symbol)
            .copied()
            .ok_or_else(|| FfiError::SymbolNotFound {
                symbol: symbol.to_string(),
                library: self.name.clone(),
                reason: "not present in symbol table".to_string(),
            })
    }
}

/// Library loader with search paths
#[derive(Debug, Clone, Default)]
pub struct LibraryLoader {
    /// Directories tried before the dynamic linker's own search
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Create a loader that relies on the dynamic linker search path only
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with extra search directories
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Add a search path
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find a library in the configured search paths.
    ///
    /// Returns `None` when the name should be handed to the dynamic linker
    /// unchanged.
    pub fn find_library(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.components().count() > 1 {
            return path.exists().then(|| path.to_path_buf());
        }

        let lib_name = library_filename(name);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&lib_name))
            .find(|candidate| candidate.exists())
    }

    /// Open a library by name or path
    pub fn open(&self, name: &str) -> Result<SharedObject, FfiError> {
        match self.find_library(name) {
            Some(path) => SharedObject::open(path),
            None => SharedObject::open(library_filename(name)),
        }
    }
}

/// Construct the platform-specific library filename.
///
/// Names that already look like a shared object file are left alone, so
/// `libsqlite3.so.0` stays versioned and `sqlite3` becomes `libsqlite3.so`.
pub fn library_filename(name: &str) -> String {
    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    {
        if name.contains(".so") || name.contains('/') {
            name.to_string()
        } else {
            format!("lib{}.so", name)
        }
    }

    #[cfg(target_os = "macos")]
    {
        if name.ends_with(".dylib") || name.contains('/') {
            name.to_string()
        } else {
            format!("lib{}.dylib", name)
        }
    }

    #[cfg(target_os = "windows")]
    {
        if name.ends_with(".dll") {
            name.to_string()
        } else {
            format!("{}.dll", name)
        }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "macos",
        target_os = "windows"
    )))]
    {
        name.to_string()
    }
}
