//! SQL expressions.

use crate::{ColumnName, ParamName};

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A positional parameter placeholder, rendered as `?`
    Param(ParamName),
    /// A column reference
    Column(ColumnName),
    /// Binary operation (e.g., a = b, a AND b)
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// Raw SQL (caller-supplied predicate fragments)
    Raw(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    And,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::And => "AND",
        }
    }
}

// Convenience constructors
impl Expr {
    pub fn param(name: impl Into<ParamName>) -> Self {
        Expr::Param(name.into())
    }

    pub fn column(name: impl Into<ColumnName>) -> Self {
        Expr::Column(name.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// Create an equality expression: self = other
    pub fn eq(self, other: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(self),
            op: BinOp::Eq,
            right: Box::new(other),
        }
    }

    /// Create an AND expression: self AND other
    pub fn and(self, other: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(self),
            op: BinOp::And,
            right: Box::new(other),
        }
    }

    /// `column = ?` for each column, joined with AND.
    ///
    /// Returns `None` when `columns` is empty.
    pub fn all_equal<I, S>(columns: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        columns
            .into_iter()
            .map(|c| {
                let c = c.into();
                Expr::column(c.clone()).eq(Expr::param(c))
            })
            .reduce(Expr::and)
    }
}
