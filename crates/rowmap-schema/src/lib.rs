//! Schema types for rowmap.
//!
//! This crate contains the types shared between the reflector (declared
//! schema), the inspector (live schema) and the differ:
//!
//! - [`FieldDef`]: a static descriptor for one mapped field of a record type
//! - [`ColumnDecl`] / [`TableSchema`]: the declared schema, with SQL types resolved
//! - [`LiveColumn`]: a column as reported by the store's catalog
//! - [`TableDef`]: a table registered through `inventory`

use rowmap_sql::unique_key_name;
use std::fmt;

/// The closed set of value kinds the conversion registry understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticType {
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Free-form text
    Text,
    /// Date and time without zone
    Timestamp,
    /// UUID, stored in its hyphenated form
    Uuid,
    /// Enumeration, stored as the member name
    Enum,
    /// List of strings, stored newline-separated
    StringList,
    /// Time-derived 64-bit id, stored as base-16
    ObjectId,
}

impl SemanticType {
    /// All semantic types, in declaration order.
    pub const ALL: [SemanticType; 12] = [
        SemanticType::I8,
        SemanticType::I16,
        SemanticType::I32,
        SemanticType::I64,
        SemanticType::F32,
        SemanticType::F64,
        SemanticType::Text,
        SemanticType::Timestamp,
        SemanticType::Uuid,
        SemanticType::Enum,
        SemanticType::StringList,
        SemanticType::ObjectId,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticType::I8 => "i8",
            SemanticType::I16 => "i16",
            SemanticType::I32 => "i32",
            SemanticType::I64 => "i64",
            SemanticType::F32 => "f32",
            SemanticType::F64 => "f64",
            SemanticType::Text => "text",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Uuid => "uuid",
            SemanticType::Enum => "enum",
            SemanticType::StringList => "string-list",
            SemanticType::ObjectId => "object-id",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Declared fields
// =============================================================================

/// A unique constraint on a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UniqueKey {
    /// Constraint name; `uq_{table}_{column}` when not given.
    pub name: Option<&'static str>,
}

/// Static descriptor for one mapped field of a record type.
///
/// Built once per type (see `rowmap::record!`) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Rust field name
    pub field: &'static str,
    /// Column name
    pub column: &'static str,
    /// Semantic type of the field's value
    pub semantic: SemanticType,
    /// Explicit size-limit override
    pub limit: Option<u32>,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Whether the column is part of the primary key
    pub primary: bool,
    /// Unique constraint, if any
    pub unique: Option<UniqueKey>,
    /// Declared enum members (empty for non-enum fields)
    pub variants: &'static [&'static str],
}

/// Builder for the annotation part of a [`FieldDef`].
///
/// ```
/// use rowmap_schema::column;
///
/// let spec = column("email").unique().limit(120);
/// assert_eq!(spec.name, "email");
/// assert_eq!(spec.limit, Some(120));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub limit: Option<u32>,
    pub nullable: bool,
    pub primary: bool,
    pub unique: Option<UniqueKey>,
}

/// Start a field specification for the given column name.
pub const fn column(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        limit: None,
        nullable: false,
        primary: false,
        unique: None,
    }
}

impl FieldSpec {
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = Some(UniqueKey { name: None });
        self
    }

    pub const fn unique_named(mut self, name: &'static str) -> Self {
        self.unique = Some(UniqueKey { name: Some(name) });
        self
    }

    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The column name.
    pub const fn name_of(self) -> &'static str {
        self.name
    }

    /// Combine the annotations with what the host type knows about itself.
    ///
    /// `host_nullable` is true for `Option<T>` fields; such columns are always
    /// declared nullable.
    pub const fn into_def(
        self,
        field: &'static str,
        semantic: SemanticType,
        host_nullable: bool,
        variants: &'static [&'static str],
    ) -> FieldDef {
        FieldDef {
            field,
            column: self.name,
            semantic,
            limit: self.limit,
            nullable: self.nullable || host_nullable,
            primary: self.primary,
            unique: self.unique,
            variants,
        }
    }
}

// =============================================================================
// Declared schema
// =============================================================================

/// A column as declared by a record type, with its SQL type resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDecl {
    /// Column name
    pub name: String,
    /// Semantic type
    pub semantic: SemanticType,
    /// Effective size limit (explicit or the converter's default)
    pub size_limit: Option<u32>,
    /// Rendered SQL type, e.g. `VARCHAR(36)`
    pub sql_type: String,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Whether this is (part of) the primary key
    pub primary: bool,
    /// Unique constraint, if any
    pub unique: Option<UniqueKey>,
}

impl ColumnDecl {
    /// Returns the SQL type followed by `NULL` or `NOT NULL`.
    pub fn definition(&self) -> String {
        let null = if self.nullable { "NULL" } else { "NOT NULL" };
        format!("{} {}", self.sql_type, null)
    }
}

/// The declared schema of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDecl>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDecl> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the primary-key columns, in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Name of the unique constraint for a column.
    pub fn unique_key_name(&self, column: &ColumnDecl) -> String {
        match column.unique.and_then(|u| u.name) {
            Some(name) => name.to_string(),
            None => unique_key_name(&self.name, &column.name),
        }
    }
}

// =============================================================================
// Live schema
// =============================================================================

/// The key a column participates in, as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
}

impl KeyRole {
    /// Map a catalog key indicator (`COLUMN_KEY`) to a key role.
    pub fn from_catalog(indicator: &str) -> Self {
        match indicator {
            "PRI" => KeyRole::Primary,
            "UNI" => KeyRole::Unique,
            _ => KeyRole::None,
        }
    }
}

/// A column as it exists in the connected store.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveColumn {
    /// Column name
    pub name: String,
    /// Upper-cased SQL type, possibly with a size suffix
    pub sql_type: String,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Key role
    pub key_role: KeyRole,
}

impl LiveColumn {
    /// Create a live column, upper-casing the SQL type.
    pub fn new(
        name: impl Into<String>,
        sql_type: impl AsRef<str>,
        nullable: bool,
        key_role: KeyRole,
    ) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.as_ref().to_uppercase(),
            nullable,
            key_role,
        }
    }
}

// =============================================================================
// Table definition registration
// =============================================================================

/// A registered table definition.
///
/// This is submitted to inventory by types declared with `rowmap::record!`.
pub struct TableDef {
    /// Table name
    pub table: &'static str,
    /// Field descriptors, in declaration order
    pub fields: fn() -> &'static [FieldDef],
}

impl TableDef {
    pub const fn new(table: &'static str, fields: fn() -> &'static [FieldDef]) -> Self {
        Self { table, fields }
    }
}

inventory::collect!(TableDef);

/// Iterate over every registered table definition.
pub fn registered_tables() -> impl Iterator<Item = &'static TableDef> {
    inventory::iter::<TableDef>.into_iter()
}

#[cfg(test)]
mod tests;
