//! FFI Errors
//!
//! Failures of the loading and binding phase. Native result codes returned by
//! bound functions are ordinary values and never become an `FfiError`.

use thiserror::Error;

/// Error type for FFI operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FfiError {
    /// The shared object could not be opened (missing file, wrong format,
    /// platform mismatch)
    #[error("Load error: {0}")]
    LoadError(String),

    /// A required export is missing from an opened library
    #[error("Symbol not found: '{symbol}' in '{library}': {reason}")]
    SymbolNotFound {
        symbol: String,
        library: String,
        reason: String,
    },

    /// Symbol name cannot be passed to the dynamic loader
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

impl FfiError {
    /// Name of the missing symbol, if this is a resolution failure
    pub fn symbol(&self) -> Option<&str> {
        match self {
            FfiError::SymbolNotFound { symbol, .. } => Some(symbol),
            _ => None,
        }
    }
}
