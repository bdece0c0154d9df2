//! Opaque native handles
//!
//! Connections and statements are owned by the library. The bridge carries
//! their addresses as integers and only ever passes them back unchanged.

use std::fmt;

use crate::ffi::{NativeArg, NativeRet, ValueKind};

macro_rules! native_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl $name {
            pub const NULL: $name = $name(0);

            /// Wrap a raw address previously obtained from the library.
            ///
            /// # Safety
            ///
            /// `address` must be null or a live handle of this kind returned
            /// by the library; every `Bridge` method passes it straight to
            /// native code.
            pub unsafe fn from_raw(address: usize) -> Self {
                Self(address)
            }

            pub fn as_raw(&self) -> usize {
                self.0
            }

            pub fn is_null(&self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        unsafe impl NativeArg for $name {
            const KIND: ValueKind = ValueKind::Ptr;
        }

        unsafe impl NativeRet for $name {
            const KIND: ValueKind = ValueKind::Ptr;
        }
    };
}

native_handle! {
    /// `sqlite3*`
    DbHandle
}

native_handle! {
    /// `sqlite3_stmt*`
    StmtHandle
}
