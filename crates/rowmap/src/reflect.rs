//! Declared schema: what a record type says its table should look like.

use crate::record::table_of;
use crate::{ColumnDecl, Error, FieldDef, Record, Registry, Result, TableSchema};
use std::collections::HashSet;

/// Derive the declared schema of a record type.
pub fn reflect<R: Record>(registry: &Registry) -> Result<TableSchema> {
    let table = table_of::<R>()?;
    reflect_fields(table, R::fields(), registry)
}

/// Derive a table schema from field descriptors.
///
/// Fails on the first field whose semantic type has no converter; no partial
/// schema is returned. Primary-key columns are always `NOT NULL`, even when
/// the field is optional, since the server forces that on key columns.
pub fn reflect_fields(table: &str, fields: &[FieldDef], registry: &Registry) -> Result<TableSchema> {
    let mut schema = TableSchema::new(table);
    let mut seen = HashSet::new();

    for field in fields {
        if field.column.is_empty() {
            return Err(Error::InvalidSchema {
                table: table.to_string(),
                reason: format!("field `{}` has an empty column name", field.field),
            });
        }
        if !seen.insert(field.column) {
            return Err(Error::InvalidSchema {
                table: table.to_string(),
                reason: format!("column `{}` is declared more than once", field.column),
            });
        }

        let converter = registry
            .resolve(field.semantic)
            .ok_or_else(|| Error::UnsupportedType {
                table: table.to_string(),
                column: field.column.to_string(),
                semantic: field.semantic,
            })?;
        let size_limit = converter.effective_limit(field.limit);

        schema.columns.push(ColumnDecl {
            name: field.column.to_string(),
            semantic: field.semantic,
            size_limit,
            sql_type: converter.sql_type_name(size_limit),
            nullable: field.nullable && !field.primary,
            primary: field.primary,
            unique: field.unique,
        });
    }

    Ok(schema)
}

/// Reflect every table registered through [`record!`](crate::record).
///
/// Sorted by table name.
pub fn collect_schema(registry: &Registry) -> Result<Vec<TableSchema>> {
    let mut tables = crate::registered_tables()
        .map(|def| reflect_fields(def.table, (def.fields)(), registry))
        .collect::<Result<Vec<_>>>()?;
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tables)
}
