//! Row predicates.

use crate::record::table_of;
use crate::{ConversionError, Error, FieldType, FieldValue, Record, Result};
use rowmap_sql::{Expr, count_placeholders, render};

/// A filter over a table's rows.
///
/// The fragment is raw SQL placed after `WHERE`; `values` are bound to its `?`
/// placeholders in order. The file store ignores the fragment and uses the
/// values as a key path instead.
///
/// ```
/// use rowmap::Where;
///
/// let w = Where::eq("name", "bolt".to_string()).and(Where::eq("size", 3i32));
/// assert_eq!(w.fragment(), "`name` = ? AND `size` = ?");
/// assert_eq!(w.placeholder_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Where {
    fragment: String,
    values: Vec<FieldValue>,
    limit: Option<u64>,
}

/// Shorthand for [`Where::new`].
pub fn where_(fragment: impl Into<String>, values: impl IntoIterator<Item = FieldValue>) -> Where {
    Where::new(fragment, values)
}

impl Where {
    pub fn new(fragment: impl Into<String>, values: impl IntoIterator<Item = FieldValue>) -> Self {
        Self {
            fragment: fragment.into(),
            values: values.into_iter().collect(),
            limit: None,
        }
    }

    /// Matches every row.
    pub fn all() -> Self {
        Self::new("1 = 1", [])
    }

    /// `column = ?` bound to `value`.
    pub fn eq(column: &str, value: impl FieldType) -> Self {
        Self::eq_value(column, value.to_field())
    }

    fn eq_value(column: &str, value: FieldValue) -> Self {
        Self::from_expr(Expr::column(column).eq(Expr::param(column)), vec![value])
    }

    /// Render `expr` as the fragment; `values` bind its parameters in order.
    fn from_expr(expr: Expr, values: Vec<FieldValue>) -> Self {
        let rendered = render(&expr);
        debug_assert_eq!(rendered.params.len(), values.len());
        Self::new(rendered.sql, values)
    }

    /// Both predicates. Keeps this predicate's limit.
    pub fn and(mut self, other: Where) -> Self {
        self.fragment = format!("{} AND {}", self.fragment, other.fragment);
        self.values.extend(other.values);
        self
    }

    /// Cap the number of rows. A limit of 0 means no limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit.filter(|n| *n > 0);
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Number of `?` placeholders in the fragment.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.fragment)
    }

    /// Match the record's own row by its primary-key values.
    ///
    /// Fails with [`Error::InvalidSchema`] if the type has no primary-key
    /// columns, since the resulting predicate would match every row.
    pub fn for_key<R: Record>(record: &R) -> Result<Self> {
        let table = table_of::<R>()?;
        let mut columns = Vec::new();
        let mut values = Vec::new();

        for (def, value) in R::fields().iter().zip(record.values()) {
            if !def.primary {
                continue;
            }
            if value.is_null() {
                return Err(Error::Conversion {
                    table: table.to_string(),
                    column: def.column.to_string(),
                    source: ConversionError::Null,
                });
            }
            columns.push(def.column);
            values.push(value);
        }

        let expr = Expr::all_equal(columns).ok_or_else(|| Error::InvalidSchema {
            table: table.to_string(),
            reason: "no primary key columns to locate the row by".to_string(),
        })?;
        Ok(Self::from_expr(expr, values))
    }
}

impl PartialEq for Where {
    /// Same fragment, same placeholder count and equal bound values. The
    /// limit is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.fragment == other.fragment
            && self.placeholder_count() == other.placeholder_count()
            && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column;

    crate::record! {
        #[table = "post_like"]
        pub struct PostLike {
            pub user_id: i64 => column("user_id").primary(),
            pub post_id: i64 => column("post_id").primary(),
            pub note: Option<String> => column("note"),
        }
    }

    crate::record! {
        #[table = "keyless"]
        pub struct Keyless {
            pub name: String => column("name"),
        }
    }

    crate::record! {
        #[table = "maybe_keyed"]
        pub struct MaybeKeyed {
            pub id: Option<i32> => column("id").primary(),
        }
    }

    #[test]
    fn test_all_matches_everything() {
        let w = Where::all();
        assert_eq!(w.fragment(), "1 = 1");
        assert_eq!(w.placeholder_count(), 0);
        assert_eq!(w.limit(), None);
    }

    #[test]
    fn test_limit_zero_is_unlimited() {
        assert_eq!(Where::all().with_limit(0).limit(), None);
        assert_eq!(Where::all().with_limit(5).limit(), Some(5));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Where::eq("name", "a".to_string()).with_limit(10);
        let mut copy = original.clone();
        copy.set_limit(Some(1));
        assert_eq!(original.limit(), Some(10));
        assert_eq!(copy.limit(), Some(1));
        assert_eq!(original, copy);
    }

    #[test]
    fn test_equality_compares_values() {
        let a = Where::eq("name", "a".to_string());
        let b = Where::eq("name", "b".to_string());
        assert_ne!(a, b);
        assert_eq!(a, where_("`name` = ?", [FieldValue::Text("a".into())]));
    }

    #[test]
    fn test_placeholders_in_literals_are_not_counted() {
        let w = Where::new("`name` = '?' AND `id` = ?", [FieldValue::I32(1)]);
        assert_eq!(w.placeholder_count(), 1);
    }

    #[test]
    fn test_for_key_composite() {
        let like = PostLike {
            user_id: 7,
            post_id: 9,
            note: None,
        };
        let w = Where::for_key(&like).unwrap();
        assert_eq!(w.fragment(), "`user_id` = ? AND `post_id` = ?");
        assert_eq!(w.values(), [FieldValue::I64(7), FieldValue::I64(9)]);
    }

    #[test]
    fn test_eq_quotes_the_column() {
        let w = Where::eq("ord`er", 3i32);
        assert_eq!(w.fragment(), "`ord``er` = ?");
        assert_eq!(w.values(), [FieldValue::I32(3)]);
    }

    #[test]
    fn test_for_key_requires_primary_columns() {
        let err = Where::for_key(&Keyless {
            name: "x".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn test_for_key_rejects_missing_key_value() {
        let err = Where::for_key(&MaybeKeyed { id: None }).unwrap_err();
        assert!(matches!(
            err,
            Error::Conversion {
                source: ConversionError::Null,
                ..
            }
        ));
    }
}
