//! Conversion registry: semantic types to SQL column types and back.

use crate::value::TIMESTAMP_FORMAT;
use crate::{ConversionError, FieldValue, ObjectId, SemanticType, Value};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Separator for string-list storage.
const LIST_SEPARATOR: char = '\n';

/// How one semantic type is declared as a SQL column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    pub semantic: SemanticType,
    /// Type name used when no size limit applies.
    pub sql_type: String,
    /// Type name used with a `(limit)` suffix; `None` if the type takes no size.
    pub sized_sql_type: Option<String>,
    /// Limit applied when the field declares none; 0 for "no default".
    pub default_limit: u32,
}

impl Converter {
    /// A type with no size concept. Configured limits are ignored.
    pub fn fixed(semantic: SemanticType, sql_type: impl Into<String>) -> Self {
        Self {
            semantic,
            sql_type: sql_type.into(),
            sized_sql_type: None,
            default_limit: 0,
        }
    }

    /// A type that is always bounded, `default_limit` unless overridden.
    pub fn sized(semantic: SemanticType, sql_type: impl Into<String>, default_limit: u32) -> Self {
        let sql_type = sql_type.into();
        Self {
            semantic,
            sized_sql_type: Some(sql_type.clone()),
            sql_type,
            default_limit,
        }
    }

    /// `unsized_type` without a limit, `sized_type(limit)` with one.
    pub fn text(
        semantic: SemanticType,
        unsized_type: impl Into<String>,
        sized_type: impl Into<String>,
    ) -> Self {
        Self {
            semantic,
            sql_type: unsized_type.into(),
            sized_sql_type: Some(sized_type.into()),
            default_limit: 0,
        }
    }

    pub fn accepts_limit(&self) -> bool {
        self.sized_sql_type.is_some()
    }

    /// The limit that applies given a field's explicit override.
    pub fn effective_limit(&self, explicit: Option<u32>) -> Option<u32> {
        if !self.accepts_limit() {
            return None;
        }
        explicit
            .filter(|n| *n > 0)
            .or((self.default_limit > 0).then_some(self.default_limit))
    }

    /// Render the column type for an effective limit.
    ///
    /// ```
    /// use rowmap::{Converter, SemanticType};
    ///
    /// let text = Converter::text(SemanticType::Text, "TEXT", "VARCHAR");
    /// assert_eq!(text.sql_type_name(None), "TEXT");
    /// assert_eq!(text.sql_type_name(Some(50)), "VARCHAR(50)");
    ///
    /// let int = Converter::fixed(SemanticType::I32, "INT");
    /// assert_eq!(int.sql_type_name(Some(50)), "INT");
    /// ```
    pub fn sql_type_name(&self, limit: Option<u32>) -> String {
        match (&self.sized_sql_type, limit) {
            (Some(sized), Some(n)) if n > 0 => format!("{sized}({n})"),
            _ => self.sql_type.clone(),
        }
    }
}

/// Maps semantic types to converters.
///
/// Passed explicitly to everything that needs it; there is no global instance.
#[derive(Debug, Clone)]
pub struct Registry {
    converters: HashMap<SemanticType, Converter>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry with the built-in MySQL mappings.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for converter in [
            Converter::fixed(SemanticType::I8, "TINYINT"),
            Converter::fixed(SemanticType::I16, "SMALLINT"),
            Converter::fixed(SemanticType::I32, "INT"),
            Converter::fixed(SemanticType::I64, "BIGINT"),
            Converter::fixed(SemanticType::F32, "FLOAT"),
            Converter::fixed(SemanticType::F64, "DOUBLE"),
            Converter::text(SemanticType::Text, "TEXT", "VARCHAR"),
            Converter::fixed(SemanticType::Timestamp, "TIMESTAMP"),
            Converter::sized(SemanticType::Uuid, "VARCHAR", 36),
            Converter::sized(SemanticType::Enum, "VARCHAR", 32),
            Converter::fixed(SemanticType::StringList, "TEXT"),
            Converter::sized(SemanticType::ObjectId, "VARCHAR", 16),
        ] {
            registry.register(converter);
        }
        registry
    }

    /// A registry with no mappings at all.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Register a converter, replacing any previous one for the same tag.
    pub fn register(&mut self, converter: Converter) -> Option<Converter> {
        self.converters.insert(converter.semantic, converter)
    }

    /// Look up the converter for a semantic type.
    pub fn resolve(&self, semantic: SemanticType) -> Option<&Converter> {
        self.converters.get(&semantic)
    }

    /// Convert a field value into its storage form.
    ///
    /// Enum members are stored by name without consulting any converter.
    pub fn to_storage(&self, value: &FieldValue) -> Value {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::I8(v) => Value::I8(*v),
            FieldValue::I16(v) => Value::I16(*v),
            FieldValue::I32(v) => Value::I32(*v),
            FieldValue::I64(v) => Value::I64(*v),
            FieldValue::F32(v) => Value::F32(*v),
            FieldValue::F64(v) => Value::F64(*v),
            FieldValue::Text(v) => Value::String(v.clone()),
            FieldValue::Timestamp(v) => Value::Timestamp(*v),
            FieldValue::Uuid(v) => Value::String(v.hyphenated().to_string()),
            FieldValue::Enum(v) => Value::String(v.clone()),
            FieldValue::StringList(items) => Value::String(join_list(items)),
            FieldValue::ObjectId(v) => Value::String(v.to_string()),
        }
    }

    /// Convert a stored value back into a field value of the given type.
    ///
    /// NULL always converts to [`FieldValue::Null`]. Enum names match the
    /// declared `variants` case-insensitively and come back in their declared
    /// spelling; a name matching none of them is [`ConversionError::UnknownVariant`].
    pub fn from_storage(
        &self,
        semantic: SemanticType,
        variants: &[&str],
        value: Value,
    ) -> Result<FieldValue, ConversionError> {
        if value.is_null() {
            return Ok(FieldValue::Null);
        }

        match semantic {
            SemanticType::I8 => narrow(&value, "i8").map(FieldValue::I8),
            SemanticType::I16 => narrow(&value, "i16").map(FieldValue::I16),
            SemanticType::I32 => narrow(&value, "i32").map(FieldValue::I32),
            SemanticType::I64 => as_i64(&value).map(FieldValue::I64),
            SemanticType::F32 => as_f64(&value).map(|v| FieldValue::F32(v as f32)),
            SemanticType::F64 => as_f64(&value).map(FieldValue::F64),
            SemanticType::Text => into_string(value, "text").map(FieldValue::Text),
            SemanticType::Timestamp => match value {
                Value::Timestamp(v) => Ok(FieldValue::Timestamp(v)),
                Value::String(s) => parse_timestamp(&s).map(FieldValue::Timestamp),
                other => Err(mismatch("timestamp", &other)),
            },
            SemanticType::Uuid => {
                let s = into_string(value, "uuid")?;
                uuid::Uuid::parse_str(&s)
                    .map(FieldValue::Uuid)
                    .map_err(|_| ConversionError::InvalidUuid(s))
            }
            SemanticType::Enum => {
                let s = into_string(value, "enum")?;
                variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(&s))
                    .map(|v| FieldValue::Enum((*v).to_string()))
                    .ok_or(ConversionError::UnknownVariant { name: s })
            }
            SemanticType::StringList => {
                into_string(value, "string-list").map(|s| FieldValue::StringList(split_list(&s)))
            }
            SemanticType::ObjectId => {
                let s = into_string(value, "object-id")?;
                s.parse::<ObjectId>().map(FieldValue::ObjectId)
            }
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> ConversionError {
    ConversionError::Unexpected {
        expected,
        found: found.kind(),
    }
}

fn as_i64(value: &Value) -> Result<i64, ConversionError> {
    match value {
        Value::I8(v) => Ok(i64::from(*v)),
        Value::I16(v) => Ok(i64::from(*v)),
        Value::I32(v) => Ok(i64::from(*v)),
        Value::I64(v) => Ok(*v),
        Value::String(s) => s.trim().parse().map_err(|_| mismatch("integer", value)),
        other => Err(mismatch("integer", other)),
    }
}

fn narrow<T: TryFrom<i64>>(value: &Value, target: &'static str) -> Result<T, ConversionError> {
    let wide = as_i64(value)?;
    T::try_from(wide).map_err(|_| ConversionError::OutOfRange {
        value: wide.to_string(),
        target,
    })
}

fn as_f64(value: &Value) -> Result<f64, ConversionError> {
    match value {
        Value::F32(v) => Ok(f64::from(*v)),
        Value::F64(v) => Ok(*v),
        Value::String(s) => s.trim().parse().map_err(|_| mismatch("float", value)),
        other => as_i64(other).map(|v| v as f64),
    }
}

fn into_string(value: Value, expected: &'static str) -> Result<String, ConversionError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(mismatch(expected, &other)),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, ConversionError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| ConversionError::InvalidTimestamp(s.to_string()))
}

/// Join list items for storage, dropping empty ones.
pub(crate) fn join_list(items: &[String]) -> String {
    items
        .iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split stored list text, dropping carriage returns and empty segments.
pub(crate) fn split_list(stored: &str) -> Vec<String> {
    stored
        .split(LIST_SEPARATOR)
        .map(|s| s.replace('\r', ""))
        .filter(|s| !s.is_empty())
        .collect()
}
