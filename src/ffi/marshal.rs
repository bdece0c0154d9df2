//! Byte/String Marshalling
//!
//! Every conversion between Rust-owned data and native memory goes through
//! this module. Native addresses are only ever read with a known bound, and
//! nothing here keeps a native address after returning.
//!
//! Ownership model for arguments: strings and blobs handed to the library are
//! borrowed for the duration of one call and paired with
//! [`Destructor::TRANSIENT`], which asks the library to copy them before the
//! call returns. No release callback is ever registered.

use std::ffi::{c_char, c_void, CStr};
use std::marker::PhantomData;

use super::types::{NativeArg, NativeRet, ValueKind};

/// Sentinel for "no information available" library strings
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for "no information available" error strings
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Valid, non-null address for zero-length arguments
static EMPTY: [u8; 1] = [0];

/// Native `const char*`, null-terminated
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeStr(*const c_char);

impl NativeStr {
    pub const NULL: NativeStr = NativeStr(std::ptr::null());

    pub fn from_ptr(ptr: *const c_char) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

unsafe impl NativeArg for NativeStr {
    const KIND: ValueKind = ValueKind::CStr;
}

unsafe impl NativeRet for NativeStr {
    const KIND: ValueKind = ValueKind::CStr;
}

/// Native `const void*` whose length is reported separately
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBytes(*const c_void);

impl NativeBytes {
    pub const NULL: NativeBytes = NativeBytes(std::ptr::null());

    pub fn from_ptr(ptr: *const c_void) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

unsafe impl NativeArg for NativeBytes {
    const KIND: ValueKind = ValueKind::Buffer;
}

unsafe impl NativeRet for NativeBytes {
    const KIND: ValueKind = ValueKind::Buffer;
}

/// Destructor argument of the bind functions.
///
/// Only the two marker values are representable; a real callback would need
/// a native-to-Rust trampoline, which this bridge does not provide.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destructor(isize);

impl Destructor {
    /// Data is constant and outlives the statement
    pub const STATIC: Destructor = Destructor(0);
    /// Copy the data before the call returns
    pub const TRANSIENT: Destructor = Destructor(-1);
}

unsafe impl NativeArg for Destructor {
    const KIND: ValueKind = ValueKind::Ptr;
}

/// Owned, null-terminated copy of a Rust string.
///
/// Keep the value alive across the native call that receives
/// [`NativeString::as_native`]; the pointer dangles once it is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeString {
    /// Contents followed by exactly one NUL
    bytes: Vec<u8>,
}

impl NativeString {
    /// Copy `s`, stopping at the first interior NUL (the native side would
    /// stop reading there anyway).
    pub fn new(s: &str) -> Self {
        let raw = s.as_bytes();
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());

        let mut bytes = Vec::with_capacity(end + 1);
        bytes.extend_from_slice(&raw[..end]);
        bytes.push(0);
        Self { bytes }
    }

    pub fn as_native(&self) -> NativeStr {
        NativeStr(self.bytes.as_ptr().cast())
    }

    /// Length without the terminator
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length including the terminator
    pub fn len_with_nul(&self) -> usize {
        self.bytes.len()
    }

    /// Contents without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Text following `tail`, a pointer the library set somewhere inside
    /// this buffer. Pointers outside the buffer yield an empty string.
    pub fn tail_after(&self, tail: NativeStr) -> String {
        if tail.is_null() {
            return String::new();
        }

        let base = self.bytes.as_ptr() as usize;
        let at = tail.as_ptr() as usize;
        if at < base || at > base + self.len() {
            return String::new();
        }

        String::from_utf8_lossy(&self.as_bytes()[at - base..]).into_owned()
    }
}

/// Borrowed `(pointer, length)` argument for text and blob binds
#[derive(Debug, Clone, Copy)]
pub struct ByteArg<'a> {
    ptr: *const u8,
    len: i32,
    _data: PhantomData<&'a [u8]>,
}

impl<'a> ByteArg<'a> {
    /// Borrow `data` for one call.
    ///
    /// Returns `None` when the length does not fit the native `int` length
    /// parameter. Empty input points at a static byte instead of null, so
    /// the library sees a zero-length value rather than SQL NULL.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let len = i32::try_from(data.len()).ok()?;
        let ptr = if data.is_empty() {
            EMPTY.as_ptr()
        } else {
            data.as_ptr()
        };

        Some(Self {
            ptr,
            len,
            _data: PhantomData,
        })
    }

    pub fn len(&self) -> i32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_native_str(&self) -> NativeStr {
        NativeStr(self.ptr.cast())
    }

    pub fn as_native_bytes(&self) -> NativeBytes {
        NativeBytes(self.ptr.cast())
    }
}

/// Copy `len` bytes starting at `data` into an owned buffer.
///
/// A null address or a non-positive length yields an empty buffer.
///
/// # Safety
///
/// When `data` is non-null it must point at `len` readable bytes.
pub unsafe fn from_native_buffer(data: NativeBytes, len: i32) -> Vec<u8> {
    let len = match usize::try_from(len) {
        Ok(len) if len > 0 && !data.is_null() => len,
        _ => return Vec::new(),
    };

    std::slice::from_raw_parts(data.as_ptr().cast::<u8>(), len).to_vec()
}

/// Read a null-terminated string, or `None` for a null address.
///
/// # Safety
///
/// When non-null, `s` must point at a NUL-terminated byte sequence.
pub unsafe fn from_native_str_opt(s: NativeStr) -> Option<String> {
    if s.is_null() {
        return None;
    }
    Some(CStr::from_ptr(s.as_ptr()).to_string_lossy().into_owned())
}

/// Read a null-terminated string, substituting `sentinel` for null or empty.
///
/// # Safety
///
/// Same as [`from_native_str_opt`].
pub unsafe fn from_native_string(s: NativeStr, sentinel: &str) -> String {
    match from_native_str_opt(s) {
        Some(text) if !text.is_empty() => text,
        _ => sentinel.to_string(),
    }
}
