//! FFI Module Tests

use super::marshal::{
    from_native_buffer, from_native_str_opt, from_native_string, UNKNOWN, UNKNOWN_ERROR,
};
use super::*;

static GREETING: &[u8] = b"hello\0";

extern "C" fn add(a: i32, b: i32) -> i32 {
    a + b
}

extern "C" fn mix(a: i64, b: f64, c: i32, d: f32) -> f64 {
    a as f64 + b + c as f64 + d as f64
}

unsafe extern "C" fn store(out: *mut i64, value: i64) {
    *out = value;
}

extern "C" fn greeting() -> NativeStr {
    NativeStr::from_ptr(GREETING.as_ptr().cast())
}

extern "C" fn sized(_text: NativeStr, len: i32, destructor: Destructor) -> i32 {
    if destructor == Destructor::TRANSIENT {
        len
    } else {
        -1
    }
}

fn address(f: usize) -> SymbolAddress {
    SymbolAddress::new(f).unwrap()
}

fn test_table() -> SymbolTable {
    SymbolTable::new("in-process")
        .with("add", address(add as usize))
        .with("mix", address(mix as usize))
        .with("store", address(store as usize))
        .with("greeting", address(greeting as usize))
        .with("sized", address(sized as usize))
}

#[test]
fn test_value_kind_properties() {
    assert!(ValueKind::I32.is_integer());
    assert!(!ValueKind::I32.is_float());
    assert!(!ValueKind::I32.is_pointer());

    assert!(ValueKind::F64.is_float());
    assert!(!ValueKind::F64.is_integer());

    assert!(ValueKind::Ptr.is_pointer());
    assert!(ValueKind::CStr.is_pointer());
    assert!(ValueKind::Buffer.is_pointer());

    assert_eq!(ValueKind::Void.size(), 0);
    assert_eq!(ValueKind::I64.size(), 8);
    assert_eq!(ValueKind::F32.size(), 4);
}

#[test]
fn test_descriptor_from_stub_type() {
    type Mix = unsafe extern "C" fn(i64, f64, i32, f32) -> f64;
    let desc = <Mix as NativeFn>::descriptor("mix");
    assert_eq!(desc.arity(), 4);
    assert_eq!(
        desc.params,
        &[ValueKind::I64, ValueKind::F64, ValueKind::I32, ValueKind::F32]
    );
    assert_eq!(desc.to_string(), "f64 mix(i64, f64, i32, f32)");

    type Store = unsafe extern "C" fn(*mut i64, i64);
    let desc = <Store as NativeFn>::descriptor("store");
    assert!(desc.returns_void());
    assert_eq!(desc.to_string(), "void store(ptr, i64)");

    type Version = unsafe extern "C" fn() -> NativeStr;
    assert_eq!(
        <Version as NativeFn>::descriptor("version").to_string(),
        "cstr version()"
    );
}

#[test]
fn test_integer_stub() {
    let table = test_table();
    let add: unsafe extern "C" fn(i32, i32) -> i32 = bind(&table, "add").unwrap();
    assert_eq!(unsafe { add(40, 2) }, 42);
    assert_eq!(unsafe { add(-5, 3) }, -2);
}

#[test]
fn test_mixed_integer_and_float_stub() {
    let table = test_table();
    let mix: unsafe extern "C" fn(i64, f64, i32, f32) -> f64 = bind(&table, "mix").unwrap();
    let result = unsafe { mix(1 << 40, 0.5, -3, 0.25) };
    assert_eq!(result, (1i64 << 40) as f64 + 0.5 - 3.0 + 0.25);
}

#[test]
fn test_void_stub_writes_through_pointer() {
    let table = test_table();
    let store: unsafe extern "C" fn(*mut i64, i64) = bind(&table, "store").unwrap();

    let mut slot = 0i64;
    unsafe { store(&mut slot, i64::MIN) };
    assert_eq!(slot, i64::MIN);
}

#[test]
fn test_string_return_and_marker_argument() {
    let table = test_table();

    let greeting: unsafe extern "C" fn() -> NativeStr = bind(&table, "greeting").unwrap();
    let text = unsafe { from_native_string(greeting(), UNKNOWN) };
    assert_eq!(text, "hello");

    let sized: unsafe extern "C" fn(NativeStr, i32, Destructor) -> i32 =
        bind(&table, "sized").unwrap();
    let arg = ByteArg::new(b"abc").unwrap();
    assert_eq!(
        unsafe { sized(arg.as_native_str(), arg.len(), Destructor::TRANSIENT) },
        3
    );
    assert_eq!(
        unsafe { sized(arg.as_native_str(), arg.len(), Destructor::STATIC) },
        -1
    );
}

#[test]
fn test_missing_symbol_in_table() {
    let table = test_table();
    let err = bind::<unsafe extern "C" fn() -> i32>(&table, "nope").unwrap_err();
    assert_eq!(err.symbol(), Some("nope"));
    match err {
        FfiError::SymbolNotFound { library, .. } => assert_eq!(library, "in-process"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_symbol_table_basics() {
    let mut table = SymbolTable::new("t");
    assert!(table.is_empty());
    table.insert("add", address(add as usize));
    assert_eq!(table.len(), 1);
    assert_eq!(table.name(), "t");
    assert_eq!(table.resolve("add").unwrap().as_usize(), add as usize);
    assert!(SymbolAddress::new(0).is_none());
}

#[test]
fn test_ffi_error_display() {
    let err = FfiError::LoadError("test".to_string());
    assert!(err.to_string().contains("Load error"));
    assert_eq!(err.symbol(), None);

    let err = FfiError::SymbolNotFound {
        symbol: "sqlite3_step".to_string(),
        library: "libfoo.so".to_string(),
        reason: "undefined symbol".to_string(),
    };
    let text = err.to_string();
    assert!(text.contains("sqlite3_step"));
    assert!(text.contains("libfoo.so"));
}

#[test]
fn test_marshal_null_and_empty() {
    unsafe {
        assert_eq!(from_native_string(NativeStr::NULL, UNKNOWN), "Unknown");
        assert_eq!(
            from_native_string(NativeStr::from_ptr(b"\0".as_ptr().cast()), UNKNOWN_ERROR),
            "Unknown Error"
        );
        assert_eq!(from_native_str_opt(NativeStr::NULL), None);
        assert_eq!(
            from_native_str_opt(NativeStr::from_ptr(b"\0".as_ptr().cast())),
            Some(String::new())
        );

        let data = [1u8, 2, 3];
        let ptr = NativeBytes::from_ptr(data.as_ptr().cast());
        assert!(from_native_buffer(NativeBytes::NULL, 3).is_empty());
        assert!(from_native_buffer(ptr, 0).is_empty());
        assert!(from_native_buffer(ptr, -1).is_empty());
        assert_eq!(from_native_buffer(ptr, 2), vec![1, 2]);
    }
}

#[test]
fn test_native_string_truncates_at_nul() {
    let s = NativeString::new("abc\0def");
    assert_eq!(s.as_bytes(), b"abc");
    assert_eq!(s.len(), 3);
    assert_eq!(s.len_with_nul(), 4);

    let empty = NativeString::new("");
    assert!(empty.is_empty());
    assert!(!empty.as_native().is_null());
    assert_eq!(unsafe { from_native_str_opt(empty.as_native()) }, Some(String::new()));
}

#[test]
fn test_tail_after() {
    let sql = NativeString::new("SELECT 1; SELECT 2");
    let base = sql.as_native().as_ptr();

    let tail = NativeStr::from_ptr(unsafe { base.add(9) });
    assert_eq!(sql.tail_after(tail), " SELECT 2");

    let end = NativeStr::from_ptr(unsafe { base.add(sql.len()) });
    assert_eq!(sql.tail_after(end), "");

    assert_eq!(sql.tail_after(NativeStr::NULL), "");
    assert_eq!(sql.tail_after(NativeStr::from_ptr(GREETING.as_ptr().cast())), "");
}

#[test]
fn test_byte_arg_empty_is_not_null() {
    let arg = ByteArg::new(&[]).unwrap();
    assert!(arg.is_empty());
    assert_eq!(arg.len(), 0);
    assert!(!arg.as_native_bytes().is_null());
    assert!(!arg.as_native_str().is_null());
}

#[test]
fn test_library_filename() {
    #[cfg(target_os = "linux")]
    {
        assert_eq!(library_filename("sqlite3"), "libsqlite3.so");
        assert_eq!(library_filename("libsqlite3.so.0"), "libsqlite3.so.0");
        assert_eq!(library_filename("/opt/lib/custom.so"), "/opt/lib/custom.so");
    }
}

#[test]
fn test_loader_search_paths() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join(library_filename("fake"));
    std::fs::write(&lib, b"not an elf").unwrap();

    let mut loader = LibraryLoader::new();
    assert_eq!(loader.find_library("fake"), None);
    loader.add_search_path(dir.path());
    assert_eq!(loader.search_paths().len(), 1);
    assert_eq!(loader.find_library("fake"), Some(lib));

    // Found, but not loadable
    assert!(matches!(loader.open("fake"), Err(FfiError::LoadError(_))));
}

#[test]
fn test_missing_library() {
    let err = SharedObject::open("libdefinitely-not-here.so.9").unwrap_err();
    match err {
        FfiError::LoadError(msg) => assert!(msg.contains("libdefinitely-not-here.so.9")),
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_libc_loading() {
    // libc.so.6 should be in the default search paths
    let Ok(libc) = SharedObject::open("libc.so.6") else {
        return;
    };
    assert_eq!(libc.name(), "libc.so.6");

    let getpid: unsafe extern "C" fn() -> i32 = bind(&libc, "getpid").unwrap();
    let pid = unsafe { getpid() };
    assert_eq!(pid as u32, std::process::id());

    let strlen: unsafe extern "C" fn(NativeStr) -> usize = bind(&libc, "strlen").unwrap();
    let s = NativeString::new("four");
    assert_eq!(unsafe { strlen(s.as_native()) }, 4);

    assert!(matches!(
        libc.resolve("get\0pid"),
        Err(FfiError::InvalidSymbol(_))
    ));
    assert_eq!(
        libc.resolve("sqlite3_step").unwrap_err().symbol(),
        Some("sqlite3_step")
    );
}
