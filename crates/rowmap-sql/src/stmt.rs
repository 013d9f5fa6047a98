//! SQL statements.

use crate::expr::Expr;
use crate::{ColumnName, TableName};

/// A SQL statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    CreateTable(CreateTableStmt),
    AlterTable(AlterTableStmt),
}

/// A `SELECT * FROM` statement.
#[derive(Debug, Clone)]
pub struct SelectStmt {
    pub from: TableName,
    pub where_: Option<Expr>,
    pub limit: Option<u64>,
}

// ============================================================================
// INSERT statement
// ============================================================================

/// An INSERT statement.
#[derive(Debug, Clone)]
pub struct InsertStmt {
    pub table: TableName,
    pub columns: Vec<ColumnName>,
    pub values: Vec<Expr>,
}

/// An assignment in UPDATE SET.
#[derive(Debug, Clone)]
pub struct UpdateAssignment {
    pub column: ColumnName,
    pub value: Expr,
}

impl UpdateAssignment {
    pub fn new(column: ColumnName, value: Expr) -> Self {
        Self { column, value }
    }
}

// ============================================================================
// UPDATE statement
// ============================================================================

/// An UPDATE statement.
#[derive(Debug, Clone)]
pub struct UpdateStmt {
    pub table: TableName,
    pub assignments: Vec<UpdateAssignment>,
    pub where_: Option<Expr>,
}

// ============================================================================
// DDL
// ============================================================================

/// A column definition: name, SQL type and nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: ColumnName,
    pub sql_type: String,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<ColumnName>, sql_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable,
        }
    }
}

/// A CREATE TABLE statement.
///
/// Carries no key constraints; those are added with [`AlterTableStmt`].
#[derive(Debug, Clone)]
pub struct CreateTableStmt {
    pub table: TableName,
    pub columns: Vec<ColumnDef>,
}

/// One clause of an ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterClause {
    /// `ADD col type [NULL|NOT NULL] [AFTER other]`
    AddColumn {
        column: ColumnDef,
        after: Option<ColumnName>,
    },
    /// `CHANGE col col type [NULL|NOT NULL]`
    ChangeColumn(ColumnDef),
    /// `ADD PRIMARY KEY (cols)`
    AddPrimaryKey(Vec<ColumnName>),
    /// `ADD UNIQUE KEY name (col)`
    AddUniqueKey { name: String, column: ColumnName },
}

/// An ALTER TABLE statement with one or more comma-separated clauses.
#[derive(Debug, Clone)]
pub struct AlterTableStmt {
    pub table: TableName,
    pub clauses: Vec<AlterClause>,
}

// ============================================================================
// Builder-style constructors
// ============================================================================

impl SelectStmt {
    pub fn new(from: impl Into<TableName>) -> Self {
        Self {
            from: from.into(),
            where_: None,
            limit: None,
        }
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }
}

impl InsertStmt {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<ColumnName>, value: Expr) -> Self {
        self.columns.push(name.into());
        self.values.push(value);
        self
    }
}

impl UpdateStmt {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            where_: None,
        }
    }

    pub fn set(mut self, column: impl Into<ColumnName>, value: Expr) -> Self {
        self.assignments
            .push(UpdateAssignment::new(column.into(), value));
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_ = Some(expr);
        self
    }
}

impl CreateTableStmt {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}

impl AlterTableStmt {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            clauses: Vec::new(),
        }
    }

    pub fn clause(mut self, clause: AlterClause) -> Self {
        self.clauses.push(clause);
        self
    }
}
