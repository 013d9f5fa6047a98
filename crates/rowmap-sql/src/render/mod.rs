//! Render SQL AST to string.

use std::cell::RefCell;
use std::fmt;

use crate::expr::Expr;
use crate::stmt::*;
use crate::{Ident, ParamName, RenderedSql};

/// Rendering context that records parameters in placeholder order.
///
/// Uses interior mutability (`RefCell`) so that `Render::render` can take `&self`,
/// enabling the `Fmt` wrapper to implement `Display`.
pub struct RenderContext {
    params: RefCell<Vec<ParamName>>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            params: RefCell::new(Vec::new()),
        }
    }

    /// Record a parameter; every occurrence gets its own `?`.
    fn push_param(&self, name: &ParamName) {
        self.params.borrow_mut().push(name.clone());
    }

    /// Finish rendering and return the collected params.
    fn into_params(self) -> Vec<ParamName> {
        self.params.into_inner()
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper for rendering a `Render` type via `Display`.
///
/// Allows using `write!(f, "{}", Fmt(ctx, &expr))` in format strings.
pub struct Fmt<'a, T: Render>(&'a RenderContext, &'a T);

impl<T: Render> fmt::Display for Fmt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.1.render(self.0, f)
    }
}

// ============================================================================
// Render implementations
// ============================================================================

/// Trait for types that can be rendered to SQL.
pub trait Render {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Render for Expr {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Param(name) => {
                ctx.push_param(name);
                write!(f, "?")
            }
            Expr::Column(name) => write!(f, "{}", Ident(name)),
            Expr::BinOp { left, op, right } => {
                let left = Fmt(ctx, left.as_ref());
                let right = Fmt(ctx, right.as_ref());
                let op = op.as_str();
                write!(f, "{left} {op} {right}")
            }
            Expr::Raw(s) => write!(f, "{s}"),
        }
    }
}

impl Render for SelectStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(&self.from);
        write!(f, "SELECT * FROM {table}")?;

        if let Some(where_) = &self.where_ {
            let where_ = Fmt(ctx, where_);
            write!(f, " WHERE {where_}")?;
        }

        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }

        Ok(())
    }
}

impl Render for InsertStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(&self.table);
        write!(f, "INSERT INTO {table} (")?;

        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Ident(col))?;
        }
        write!(f, ") VALUES (")?;

        for (i, val) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Fmt(ctx, val))?;
        }
        write!(f, ")")
    }
}

impl Render for UpdateStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(&self.table);
        write!(f, "UPDATE {table} SET ")?;

        for (i, assign) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let col = Ident(&assign.column);
            let val = Fmt(ctx, &assign.value);
            write!(f, "{col} = {val}")?;
        }

        if let Some(where_) = &self.where_ {
            let where_ = Fmt(ctx, where_);
            write!(f, " WHERE {where_}")?;
        }

        Ok(())
    }
}

impl Render for ColumnDef {
    fn render(&self, _ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let null = if self.nullable { "NULL" } else { "NOT NULL" };
        write!(f, "{} {} {}", Ident(&self.name), self.sql_type, null)
    }
}

impl Render for CreateTableStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(&self.table);
        write!(f, "CREATE TABLE {table} (")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Fmt(ctx, col))?;
        }
        write!(f, ")")
    }
}

impl Render for AlterClause {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlterClause::AddColumn { column, after } => {
                write!(f, "ADD {}", Fmt(ctx, column))?;
                if let Some(after) = after {
                    write!(f, " AFTER {}", Ident(after))?;
                }
                Ok(())
            }
            AlterClause::ChangeColumn(column) => {
                // CHANGE takes the old name first, then the full new definition.
                write!(f, "CHANGE {} {}", Ident(&column.name), Fmt(ctx, column))
            }
            AlterClause::AddPrimaryKey(columns) => {
                write!(f, "ADD PRIMARY KEY (")?;
                for (i, col) in columns.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Ident(col))?;
                }
                write!(f, ")")
            }
            AlterClause::AddUniqueKey { name, column } => {
                write!(f, "ADD UNIQUE KEY {} ({})", Ident(name), Ident(column))
            }
        }
    }
}

impl Render for AlterTableStmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Ident(&self.table);
        write!(f, "ALTER TABLE {table} ")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", Fmt(ctx, clause))?;
        }
        Ok(())
    }
}

impl Render for Stmt {
    fn render(&self, ctx: &RenderContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Select(s) => s.render(ctx, f),
            Stmt::Insert(s) => s.render(ctx, f),
            Stmt::Update(s) => s.render(ctx, f),
            Stmt::CreateTable(s) => s.render(ctx, f),
            Stmt::AlterTable(s) => s.render(ctx, f),
        }
    }
}

// ============================================================================
// Convenience methods
// ============================================================================

/// Render a statement, or a standalone expression, to SQL.
pub fn render(stmt: &impl Render) -> RenderedSql {
    let ctx = RenderContext::new();
    let sql = format!("{}", Fmt(&ctx, stmt));
    RenderedSql {
        sql,
        params: ctx.into_params(),
    }
}

#[cfg(test)]
mod tests;
