//! Mapped record types and row materialization.

use crate::value::Row;
use crate::{ConversionError, Error, FieldDef, FieldValue, Registry, Result, Value};

/// A type whose fields map onto the columns of one table.
///
/// Usually implemented with [`record!`](crate::record). A type that returns
/// `None` from [`table_name`](Record::table_name) is rejected by every store
/// operation with [`Error::NotATable`].
pub trait Record: Sized + Send + Sync {
    /// The table this type maps to.
    fn table_name() -> Option<&'static str>;

    /// Mapped fields in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Current field values, in the same order as [`fields`](Record::fields).
    fn values(&self) -> Vec<FieldValue>;

    /// Build a record from field values in declaration order.
    fn from_fields(values: Vec<FieldValue>) -> std::result::Result<Self, FieldError>;

    /// Document path override for the YAML store.
    ///
    /// Relative paths are resolved against the store root; a `.yml` suffix is
    /// added when missing, and a leading `~` makes the rest of the path
    /// absolute.
    fn yaml_path() -> Option<&'static str> {
        None
    }
}

/// A field value that does not fit its host type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub column: &'static str,
    pub error: ConversionError,
}

/// The table name of a record type, or [`Error::NotATable`].
pub fn table_of<R: Record>() -> Result<&'static str> {
    R::table_name().ok_or(Error::NotATable {
        type_name: std::any::type_name::<R>(),
    })
}

/// Result of materializing one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<R> {
    Loaded(R),
    /// The row could not be turned into a record and was skipped.
    Dropped {
        column: String,
        error: ConversionError,
    },
}

impl<R> RowOutcome<R> {
    pub fn loaded(self) -> Option<R> {
        match self {
            RowOutcome::Loaded(r) => Some(r),
            RowOutcome::Dropped { .. } => None,
        }
    }
}

/// Convert a row into a record.
///
/// Missing columns read as NULL. An enum name that matches no declared member
/// reads as "no value"; if the field cannot hold that, the row is dropped.
pub fn row_to_record<R: Record>(registry: &Registry, mut row: Row) -> RowOutcome<R> {
    let fields = R::fields();
    let mut values = Vec::with_capacity(fields.len());

    for def in fields {
        let stored = take_column(&mut row, def.column);
        let value = match registry.from_storage(def.semantic, def.variants, stored) {
            Ok(value) => value,
            Err(ConversionError::UnknownVariant { .. }) if def.nullable => FieldValue::Null,
            Err(error) => {
                return RowOutcome::Dropped {
                    column: def.column.to_string(),
                    error,
                };
            }
        };
        values.push(value);
    }

    match R::from_fields(values) {
        Ok(record) => RowOutcome::Loaded(record),
        Err(FieldError { column, error }) => RowOutcome::Dropped {
            column: column.to_string(),
            error,
        },
    }
}

fn take_column(row: &mut Row, column: &str) -> Value {
    match row.iter().position(|(name, _)| name.eq_ignore_ascii_case(column)) {
        Some(idx) => row.swap_remove(idx).1,
        None => Value::Null,
    }
}

/// Storage values of a record, paired with their column names.
pub fn record_to_row<R: Record>(registry: &Registry, record: &R) -> Vec<(&'static str, Value)> {
    R::fields()
        .iter()
        .zip(record.values())
        .map(|(def, value)| (def.column, registry.to_storage(&value)))
        .collect()
}

/// Declare a record type mapped to a table.
///
/// Each field is followed by `=>` and its column specification, built with
/// [`column`](crate::column). The field's host type decides its semantic type
/// and whether it is nullable (`Option<T>` always is).
///
/// ```
/// use rowmap::{column, record, Record, ObjectId};
///
/// record! {
///     #[table = "widgets"]
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Widget {
///         pub id: ObjectId => column("id").primary(),
///         pub name: String => column("name").limit(50),
///         pub active: bool => column("active"),
///     }
/// }
///
/// assert_eq!(Widget::table_name(), Some("widgets"));
/// assert_eq!(Widget::fields().len(), 3);
/// ```
#[macro_export]
macro_rules! record {
    (
        #[table = $table:literal]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty => $spec:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        impl $crate::Record for $name {
            fn table_name() -> ::std::option::Option<&'static str> {
                ::std::option::Option::Some($table)
            }

            fn fields() -> &'static [$crate::FieldDef] {
                static FIELDS: ::std::sync::OnceLock<::std::vec::Vec<$crate::FieldDef>> =
                    ::std::sync::OnceLock::new();
                FIELDS.get_or_init(|| {
                    ::std::vec![
                        $(
                            $crate::FieldSpec::into_def(
                                $spec,
                                stringify!($field),
                                <$ty as $crate::FieldType>::SEMANTIC,
                                <$ty as $crate::FieldType>::NULLABLE,
                                <$ty as $crate::FieldType>::VARIANTS,
                            ),
                        )*
                    ]
                })
            }

            fn values(&self) -> ::std::vec::Vec<$crate::FieldValue> {
                ::std::vec![ $( $crate::FieldType::to_field(&self.$field), )* ]
            }

            fn from_fields(
                values: ::std::vec::Vec<$crate::FieldValue>,
            ) -> ::std::result::Result<Self, $crate::FieldError> {
                let mut values = values.into_iter();
                ::std::result::Result::Ok(Self {
                    $(
                        $field: {
                            let value = values.next().unwrap_or($crate::FieldValue::Null);
                            <$ty as $crate::FieldType>::from_field(value).map_err(|error| {
                                $crate::FieldError {
                                    column: $crate::FieldSpec::name_of($spec),
                                    error,
                                }
                            })?
                        },
                    )*
                })
            }
        }

        $crate::inventory::submit! {
            $crate::TableDef::new($table, <$name as $crate::Record>::fields)
        }
    };
}
