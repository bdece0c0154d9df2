//! FFI Type System
//!
//! Describes the native shape of bound functions and turns resolved symbol
//! addresses into typed, directly callable stubs.
//!
//! A stub is an ordinary Rust function pointer such as
//! `unsafe extern "C" fn(StmtHandle, i32) -> i64`. Its declared type is the
//! function descriptor: [`NativeFn`] reads the parameter and return kinds off
//! the type, and the compiler emits the platform C calling convention for it
//! (integer and pointer arguments in integer registers, floats in vector
//! registers, left to right, no return register read for `()`).

use std::fmt;

use super::loader::SymbolAddress;

/// Kinds of values that cross the native boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Void (no value)
    Void,
    /// 32-bit signed integer (`int`)
    I32,
    /// 64-bit signed integer (`sqlite3_int64`)
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Opaque pointer or pointer-sized integer (handles, out-params)
    Ptr,
    /// Null-terminated byte sequence (`const char*`)
    CStr,
    /// Byte sequence whose length travels separately (`const void*`)
    Buffer,
}

impl ValueKind {
    /// Get the size in bytes of this kind
    pub fn size(&self) -> usize {
        match self {
            ValueKind::Void => 0,
            ValueKind::I32 | ValueKind::F32 => 4,
            ValueKind::I64 | ValueKind::F64 => 8,
            ValueKind::Ptr | ValueKind::CStr | ValueKind::Buffer => std::mem::size_of::<usize>(),
        }
    }

    /// Check if this kind is an integer kind
    pub fn is_integer(&self) -> bool {
        matches!(self, ValueKind::I32 | ValueKind::I64)
    }

    /// Check if this kind is a floating point kind
    pub fn is_float(&self) -> bool {
        matches!(self, ValueKind::F32 | ValueKind::F64)
    }

    /// Check if this kind is passed as an address
    pub fn is_pointer(&self) -> bool {
        matches!(self, ValueKind::Ptr | ValueKind::CStr | ValueKind::Buffer)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Void => write!(f, "void"),
            ValueKind::I32 => write!(f, "i32"),
            ValueKind::I64 => write!(f, "i64"),
            ValueKind::F32 => write!(f, "f32"),
            ValueKind::F64 => write!(f, "f64"),
            ValueKind::Ptr => write!(f, "ptr"),
            ValueKind::CStr => write!(f, "cstr"),
            ValueKind::Buffer => write!(f, "buffer"),
        }
    }
}

/// Static metadata for one bound export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDescriptor {
    /// Exported symbol name
    pub name: &'static str,
    /// Parameter kinds, left to right
    pub params: &'static [ValueKind],
    /// Return kind
    pub return_kind: ValueKind,
}

impl FunctionDescriptor {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether the function produces no result
    pub fn returns_void(&self) -> bool {
        self.return_kind == ValueKind::Void
    }
}

impl fmt::Display for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_kind, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

/// A value that can be passed to a native function.
///
/// # Safety
///
/// Implementors must have a C-compatible layout equal to the native type that
/// `KIND` names.
pub unsafe trait NativeArg: Copy + 'static {
    const KIND: ValueKind;
}

/// A value that can be returned from a native function.
///
/// # Safety
///
/// Same layout requirement as [`NativeArg`].
pub unsafe trait NativeRet: 'static {
    const KIND: ValueKind;
}

macro_rules! native_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            unsafe impl NativeArg for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }

            unsafe impl NativeRet for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }
        )*
    };
}

native_scalar! {
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    usize => Ptr,
    *const std::ffi::c_void => Ptr,
}

unsafe impl<T: 'static> NativeArg for *mut T {
    const KIND: ValueKind = ValueKind::Ptr;
}

unsafe impl<T: 'static> NativeRet for *mut T {
    const KIND: ValueKind = ValueKind::Ptr;
}

unsafe impl NativeRet for () {
    const KIND: ValueKind = ValueKind::Void;
}

/// A typed stub: a C-ABI function pointer whose signature is its descriptor.
///
/// # Safety
///
/// Only function pointer types may implement this; `from_address` reinterprets
/// an address as `Self`.
pub unsafe trait NativeFn: Copy + Send + Sync + 'static {
    /// Parameter kinds, left to right
    const PARAMS: &'static [ValueKind];
    /// Return kind
    const RETURN: ValueKind;

    /// Build a stub that calls `address`.
    ///
    /// # Safety
    ///
    /// `address` must be the entry point of a function whose real signature
    /// is exactly `Self`, and must stay mapped for as long as the stub is
    /// called. Neither condition can be checked at run time.
    unsafe fn from_address(address: SymbolAddress) -> Self;

    /// Descriptor for this stub type under the given export name
    fn descriptor(name: &'static str) -> FunctionDescriptor {
        FunctionDescriptor {
            name,
            params: Self::PARAMS,
            return_kind: Self::RETURN,
        }
    }
}

macro_rules! impl_native_fn {
    ($($arg:ident),*) => {
        unsafe impl<R: NativeRet, $($arg: NativeArg),*> NativeFn for unsafe extern "C" fn($($arg),*) -> R {
            const PARAMS: &'static [ValueKind] = &[$($arg::KIND),*];
            const RETURN: ValueKind = R::KIND;

            unsafe fn from_address(address: SymbolAddress) -> Self {
                debug_assert_eq!(std::mem::size_of::<Self>(), std::mem::size_of::<usize>());
                std::mem::transmute_copy::<usize, Self>(&address.as_usize())
            }
        }
    };
}

impl_native_fn!();
impl_native_fn!(A0);
impl_native_fn!(A0, A1);
impl_native_fn!(A0, A1, A2);
impl_native_fn!(A0, A1, A2, A3);
impl_native_fn!(A0, A1, A2, A3, A4);
impl_native_fn!(A0, A1, A2, A3, A4, A5);
