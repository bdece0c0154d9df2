//! Result codes, open flags and column values

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::handle::StmtHandle;

/// Integer result code returned by nearly every native call.
///
/// Only the handful of codes that drive the statement state machine are
/// named here; turning a code into text is the library's job (`errstr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(i32);

impl ResultCode {
    pub const OK: ResultCode = ResultCode(0);
    pub const ERROR: ResultCode = ResultCode(1);
    pub const BUSY: ResultCode = ResultCode(5);
    pub const INTERRUPT: ResultCode = ResultCode(9);
    pub const CANTOPEN: ResultCode = ResultCode(14);
    pub const TOOBIG: ResultCode = ResultCode(18);
    pub const MISUSE: ResultCode = ResultCode(21);
    pub const RANGE: ResultCode = ResultCode(25);
    pub const ROW: ResultCode = ResultCode(100);
    pub const DONE: ResultCode = ResultCode(101);

    pub fn raw(&self) -> i32 {
        self.0
    }

    /// Primary code with any extended bits stripped
    pub fn primary(&self) -> ResultCode {
        ResultCode(self.0 & 0xff)
    }

    pub fn is_ok(&self) -> bool {
        *self == ResultCode::OK
    }

    pub fn is_row(&self) -> bool {
        *self == ResultCode::ROW
    }

    pub fn is_done(&self) -> bool {
        *self == ResultCode::DONE
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        ResultCode(code)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flags for `open_v2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OpenFlags(i32);

impl OpenFlags {
    pub const READONLY: OpenFlags = OpenFlags(0x0000_0001);
    pub const READWRITE: OpenFlags = OpenFlags(0x0000_0002);
    pub const CREATE: OpenFlags = OpenFlags(0x0000_0004);
    pub const URI: OpenFlags = OpenFlags(0x0000_0040);
    pub const MEMORY: OpenFlags = OpenFlags(0x0000_0080);
    pub const NOMUTEX: OpenFlags = OpenFlags(0x0000_8000);
    pub const FULLMUTEX: OpenFlags = OpenFlags(0x0001_0000);

    pub fn empty() -> Self {
        OpenFlags(0)
    }

    pub fn bits(&self) -> i32 {
        self.0
    }

    pub fn contains(&self, other: OpenFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlags) -> OpenFlags {
        OpenFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenFlags {
    fn bitor_assign(&mut self, rhs: OpenFlags) {
        self.0 |= rhs.0;
    }
}

/// Storage class of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl ColumnType {
    /// Map the native type code; unknown codes read as `Null`
    pub fn from_raw(code: i32) -> Self {
        match code {
            1 => ColumnType::Integer,
            2 => ColumnType::Float,
            3 => ColumnType::Text,
            4 => ColumnType::Blob,
            _ => ColumnType::Null,
        }
    }
}

/// An owned column or parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Null,
            Value::Integer(_) => ColumnType::Integer,
            Value::Real(_) => ColumnType::Float,
            Value::Text(_) => ColumnType::Text,
            Value::Blob(_) => ColumnType::Blob,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Blob(bytes) => {
                write!(f, "x'")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                write!(f, "'")
            }
        }
    }
}

/// Result of one `step`, bundled with the connection side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub code: ResultCode,
    pub last_insert_rowid: i64,
    pub changes: i64,
}

/// Result of `prepare_v2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub code: ResultCode,
    /// Null when the input held no statement (only whitespace or comments)
    pub stmt: StmtHandle,
    /// Unconsumed text after the first statement
    pub tail: String,
}
