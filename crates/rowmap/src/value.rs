//! Storage-level values for query parameters and rows.

use chrono::NaiveDateTime;

/// Format used when a timestamp has to be written as text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A runtime SQL value.
///
/// Used for query parameters and row data. Maps to MySQL column types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL
    Null,

    /// 8-bit signed integer (TINYINT)
    I8(i8),

    /// 16-bit signed integer (SMALLINT)
    I16(i16),

    /// 32-bit signed integer (INT)
    I32(i32),

    /// 64-bit signed integer (BIGINT)
    I64(i64),

    /// 32-bit float (FLOAT)
    F32(f32),

    /// 64-bit float (DOUBLE)
    F64(f64),

    /// Text (TEXT, VARCHAR)
    String(String),

    /// Date and time without zone (TIMESTAMP, DATETIME)
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Render the value as text, the way the file store keys rows.
    ///
    /// Returns `None` for NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::I8(v) => Some(v.to_string()),
            Value::I16(v) => Some(v.to_string()),
            Value::I32(v) => Some(v.to_string()),
            Value::I64(v) => Some(v.to_string()),
            Value::F32(v) => Some(v.to_string()),
            Value::F64(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Timestamp(v) => Some(v.format(TIMESTAMP_FORMAT).to_string()),
        }
    }
}

/// A row of data as column name → value pairs.
pub type Row = Vec<(String, Value)>;

/// Look up a column in a row.
pub fn row_get<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    row.iter().find(|(name, _)| name == column).map(|(_, v)| v)
}

// Convenient From impls
impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
