//! SQL AST and rendering.
//!
//! Build SQL as a typed AST, then render it to a single-line string with
//! backtick-quoted identifiers and positional `?` placeholders.

mod expr;
pub use expr::*;

mod render;
pub use render::*;

mod stmt;
pub use stmt::*;

/// Result of rendering SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSql {
    /// The SQL string with `?` placeholders.
    pub sql: String,

    /// Parameter names, one per `?` emitted for a [`Expr::Param`], in order.
    ///
    /// Placeholders inside [`Expr::Raw`] fragments are not listed.
    pub params: Vec<ParamName>,
}

/// The name of a table.
pub type TableName = String;

/// The name of a column.
pub type ColumnName = String;

/// The name of a query parameter.
pub type ParamName = String;

/// An identifier wrapper.
///
/// Display writes the value quoted with backticks, doubling embedded backticks.
///
/// # Example
/// ```
/// use rowmap_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "`user`");
/// assert_eq!(format!("{}", Ident("bla`h")), "`bla``h`");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`")?;
        for c in self.0.as_ref().chars() {
            if c == '`' {
                write!(f, "``")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "`")
    }
}

/// Generate the default unique key name for a column.
///
/// # Examples
///
/// ```
/// assert_eq!(rowmap_sql::unique_key_name("user", "email"), "uq_user_email");
/// ```
pub fn unique_key_name(table: &str, column: &str) -> String {
    format!("uq_{}_{}", table, column)
}

/// Count the `?` placeholders in a SQL fragment.
///
/// Question marks inside single-quoted literals or backtick-quoted identifiers
/// are not placeholders.
///
/// ```
/// assert_eq!(rowmap_sql::count_placeholders("`a` = ? AND `b` = ?"), 2);
/// assert_eq!(rowmap_sql::count_placeholders("`a` = '?'"), 0);
/// ```
pub fn count_placeholders(fragment: &str) -> usize {
    let mut count = 0;
    let mut in_literal = false;
    let mut in_ident = false;
    for c in fragment.chars() {
        match c {
            '\'' if !in_ident => in_literal = !in_literal,
            '`' if !in_literal => in_ident = !in_ident,
            '?' if !in_literal && !in_ident => count += 1,
            _ => {}
        }
    }
    count
}
