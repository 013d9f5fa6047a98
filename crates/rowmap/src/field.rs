//! Semantic-level field values and the host types that map onto them.

use crate::{ConversionError, SemanticType};
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A field value as the record sees it, before storage conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    /// Enum member name
    Enum(String),
    StringList(Vec<String>),
    ObjectId(ObjectId),
}

impl FieldValue {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::I8(_) => "i8",
            FieldValue::I16(_) => "i16",
            FieldValue::I32(_) => "i32",
            FieldValue::I64(_) => "i64",
            FieldValue::F32(_) => "f32",
            FieldValue::F64(_) => "f64",
            FieldValue::Text(_) => "text",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::Enum(_) => "enum",
            FieldValue::StringList(_) => "string-list",
            FieldValue::ObjectId(_) => "object-id",
        }
    }
}

/// A host type that can be stored in a mapped field.
///
/// Implemented for the primitive integers and floats, `bool` (stored as a
/// TINYINT), `String`, `NaiveDateTime`, `Uuid`, `Vec<String>`, [`ObjectId`],
/// enums declared with [`sql_enum!`](crate::sql_enum), and `Option<T>` of any
/// of these.
pub trait FieldType: Sized {
    /// Tag used to look up the converter.
    const SEMANTIC: SemanticType;

    /// Whether the host type itself can hold "no value".
    const NULLABLE: bool = false;

    /// Declared enum members, empty for everything but enums.
    const VARIANTS: &'static [&'static str] = &[];

    fn to_field(&self) -> FieldValue;

    fn from_field(value: FieldValue) -> Result<Self, ConversionError>;
}

fn unexpected(expected: &'static str, found: &FieldValue) -> ConversionError {
    match found {
        FieldValue::Null => ConversionError::Null,
        other => ConversionError::Unexpected {
            expected,
            found: other.kind(),
        },
    }
}

macro_rules! impl_field_type {
    ($ty:ty, $variant:ident, $semantic:ident, $name:literal) => {
        impl FieldType for $ty {
            const SEMANTIC: SemanticType = SemanticType::$semantic;

            fn to_field(&self) -> FieldValue {
                FieldValue::$variant(self.clone())
            }

            fn from_field(value: FieldValue) -> Result<Self, ConversionError> {
                match value {
                    FieldValue::$variant(v) => Ok(v),
                    other => Err(unexpected($name, &other)),
                }
            }
        }
    };
}

impl_field_type!(i8, I8, I8, "i8");
impl_field_type!(i16, I16, I16, "i16");
impl_field_type!(i32, I32, I32, "i32");
impl_field_type!(i64, I64, I64, "i64");
impl_field_type!(f32, F32, F32, "f32");
impl_field_type!(f64, F64, F64, "f64");
impl_field_type!(String, Text, Text, "text");
impl_field_type!(NaiveDateTime, Timestamp, Timestamp, "timestamp");
impl_field_type!(Uuid, Uuid, Uuid, "uuid");
impl_field_type!(Vec<String>, StringList, StringList, "string-list");
impl_field_type!(ObjectId, ObjectId, ObjectId, "object-id");

impl FieldType for bool {
    const SEMANTIC: SemanticType = SemanticType::I8;

    fn to_field(&self) -> FieldValue {
        FieldValue::I8(i8::from(*self))
    }

    fn from_field(value: FieldValue) -> Result<Self, ConversionError> {
        match value {
            FieldValue::I8(v) => Ok(v != 0),
            other => Err(unexpected("i8", &other)),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const SEMANTIC: SemanticType = T::SEMANTIC;
    const NULLABLE: bool = true;
    const VARIANTS: &'static [&'static str] = T::VARIANTS;

    fn to_field(&self) -> FieldValue {
        match self {
            Some(v) => v.to_field(),
            None => FieldValue::Null,
        }
    }

    fn from_field(value: FieldValue) -> Result<Self, ConversionError> {
        match value {
            FieldValue::Null => Ok(None),
            v => T::from_field(v).map(Some),
        }
    }
}

// =============================================================================
// ObjectId
// =============================================================================

/// A 64-bit id derived from the creation time in milliseconds.
///
/// Rendered and parsed as lower-case base-16.
///
/// ```
/// use rowmap::ObjectId;
///
/// let id: ObjectId = "18c3f9a2b10".parse().unwrap();
/// assert_eq!(id.to_string(), "18c3f9a2b10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Create an id from the current time.
    pub fn new() -> Self {
        Self(chrono::Utc::now().timestamp_millis().max(0) as u64)
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16)
            .map(ObjectId)
            .map_err(|_| ConversionError::InvalidObjectId(s.to_string()))
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Declare an enum that can be stored in a mapped field.
///
/// Members are stored by name. The macro derives `Debug`, `Clone`, `Copy`,
/// `PartialEq`, `Eq` and `Hash`.
///
/// ```
/// rowmap::sql_enum! {
///     pub enum Color {
///         Red,
///         Green,
///     }
/// }
///
/// assert_eq!(Color::Green.name(), "Green");
/// assert_eq!(<Color as rowmap::FieldType>::VARIANTS, &["Red", "Green"]);
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// The member name, as stored.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant) ),+
                }
            }
        }

        impl $crate::FieldType for $name {
            const SEMANTIC: $crate::SemanticType = $crate::SemanticType::Enum;
            const VARIANTS: &'static [&'static str] = &[ $( stringify!($variant) ),+ ];

            fn to_field(&self) -> $crate::FieldValue {
                $crate::FieldValue::Enum(self.name().to_string())
            }

            fn from_field(
                value: $crate::FieldValue,
            ) -> ::std::result::Result<Self, $crate::ConversionError> {
                match value {
                    $crate::FieldValue::Enum(s) | $crate::FieldValue::Text(s) => {
                        match s.as_str() {
                            $( stringify!($variant) => ::std::result::Result::Ok($name::$variant), )+
                            _ => ::std::result::Result::Err($crate::ConversionError::UnknownVariant { name: s.clone() }),
                        }
                    }
                    $crate::FieldValue::Null => ::std::result::Result::Err($crate::ConversionError::Null),
                    other => ::std::result::Result::Err($crate::ConversionError::Unexpected {
                        expected: "enum",
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::sql_enum! {
        enum Rank {
            Bronze,
            Silver,
        }
    }

    #[test]
    fn test_object_id_hex() {
        let id = ObjectId::from_raw(0x18c3f9a2b10);
        assert_eq!(id.to_string(), "18c3f9a2b10");
        assert_eq!("18c3f9a2b10".parse::<ObjectId>().unwrap(), id);
        assert_eq!(
            "not-hex".parse::<ObjectId>(),
            Err(ConversionError::InvalidObjectId("not-hex".to_string()))
        );
    }

    #[test]
    fn test_object_id_is_time_based() {
        let before = chrono::Utc::now().timestamp_millis() as u64;
        let id = ObjectId::new();
        let after = chrono::Utc::now().timestamp_millis() as u64;
        assert!(id.raw() >= before && id.raw() <= after);
    }

    #[test]
    fn test_option_maps_null() {
        assert_eq!(None::<i32>.to_field(), FieldValue::Null);
        assert_eq!(Option::<i32>::from_field(FieldValue::Null), Ok(None));
        assert_eq!(Option::<i32>::from_field(FieldValue::I32(4)), Ok(Some(4)));
        assert!(<Option<i32> as FieldType>::NULLABLE);
        assert!(!<i32 as FieldType>::NULLABLE);
    }

    #[test]
    fn test_non_option_rejects_null() {
        assert_eq!(String::from_field(FieldValue::Null), Err(ConversionError::Null));
        assert_eq!(
            i64::from_field(FieldValue::Text("x".into())),
            Err(ConversionError::Unexpected {
                expected: "i64",
                found: "text"
            })
        );
    }

    #[test]
    fn test_bool_is_tinyint() {
        assert_eq!(<bool as FieldType>::SEMANTIC, SemanticType::I8);
        assert_eq!(true.to_field(), FieldValue::I8(1));
        assert_eq!(bool::from_field(FieldValue::I8(0)), Ok(false));
    }

    #[test]
    fn test_sql_enum() {
        assert_eq!(<Rank as FieldType>::VARIANTS, &["Bronze", "Silver"]);
        assert_eq!(Rank::Silver.to_field(), FieldValue::Enum("Silver".into()));
        assert_eq!(
            Rank::from_field(FieldValue::Enum("Bronze".into())),
            Ok(Rank::Bronze)
        );
        assert_eq!(
            Rank::from_field(FieldValue::Enum("Gold".into())),
            Err(ConversionError::UnknownVariant {
                name: "Gold".into()
            })
        );
    }
}
