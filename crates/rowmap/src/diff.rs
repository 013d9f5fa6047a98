//! Schema diffing: compare a declared table against its live columns.
//!
//! The differ only ever adds: missing columns, type changes, primary keys
//! and unique keys. Columns present in the database but not declared are
//! left alone, and keys are never dropped.
//!
//! Types are compared verbatim after upper-casing, with one exception:
//! `INT(11)` (MySQL's display width for `INT`) compares equal to `INT`.

use crate::{ColumnDecl, KeyRole, LiveColumn, TableSchema};
use rowmap_sql::{AlterClause, AlterTableStmt, ColumnDef, render};

/// The ordered steps that bring one live table in line with its declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDelta {
    /// Table name.
    pub table: String,
    /// Steps, in execution order.
    pub steps: Vec<MigrationStep>,
}

/// A single schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStep {
    /// Add a missing column, positioned after another one.
    AddColumn {
        column: ColumnDecl,
        after: Option<String>,
    },
    /// Redefine an existing column whose type or nullability differs.
    ChangeColumnType { column: ColumnDecl, from: LiveColumn },
    /// Add a (possibly composite) primary key.
    AddPrimaryKey(Vec<String>),
    /// Add a single-column unique key.
    AddUniqueKey { name: String, column: String },
}

impl MigrationStep {
    /// The `ALTER TABLE` clause for this step.
    pub fn to_clause(&self) -> AlterClause {
        match self {
            MigrationStep::AddColumn { column, after } => AlterClause::AddColumn {
                column: column_def(column),
                after: after.clone(),
            },
            MigrationStep::ChangeColumnType { column, .. } => {
                AlterClause::ChangeColumn(column_def(column))
            }
            MigrationStep::AddPrimaryKey(cols) => AlterClause::AddPrimaryKey(cols.clone()),
            MigrationStep::AddUniqueKey { name, column } => AlterClause::AddUniqueKey {
                name: name.clone(),
                column: column.clone(),
            },
        }
    }
}

pub(crate) fn column_def(column: &ColumnDecl) -> ColumnDef {
    ColumnDef::new(column.name.clone(), column.sql_type.clone(), column.nullable)
}

impl std::fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationStep::AddColumn { column, after } => {
                write!(f, "+ {}: {}", column.name, column.definition())?;
                if let Some(after) = after {
                    write!(f, " (after {})", after)?;
                }
                Ok(())
            }
            MigrationStep::ChangeColumnType { column, from } => {
                let from_null = if from.nullable { "NULL" } else { "NOT NULL" };
                write!(
                    f,
                    "~ {}: {} {} -> {}",
                    column.name,
                    from.sql_type,
                    from_null,
                    column.definition()
                )
            }
            MigrationStep::AddPrimaryKey(cols) => write!(f, "+ PRIMARY KEY ({})", cols.join(", ")),
            MigrationStep::AddUniqueKey { name, column } => {
                write!(f, "+ UNIQUE KEY {} ({})", name, column)
            }
        }
    }
}

impl SchemaDelta {
    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `ALTER TABLE` statements for this delta.
    ///
    /// One statement per step, or a single statement carrying every step as
    /// a comma-separated clause when `batch` is set.
    pub fn to_statements(&self, batch: bool) -> Vec<AlterTableStmt> {
        if self.is_empty() {
            return Vec::new();
        }
        if batch {
            let stmt = self
                .steps
                .iter()
                .fold(AlterTableStmt::new(self.table.clone()), |stmt, step| {
                    stmt.clause(step.to_clause())
                });
            return vec![stmt];
        }
        self.steps
            .iter()
            .map(|step| AlterTableStmt::new(self.table.clone()).clause(step.to_clause()))
            .collect()
    }

    /// Generate the SQL script for this delta, one statement per line.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for stmt in self.to_statements(false) {
            sql.push_str(&render(&stmt).sql);
            sql.push_str(";\n");
        }
        sql
    }
}

impl std::fmt::Display for SchemaDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            writeln!(f, "{}: up to date", self.table)?;
        } else {
            writeln!(f, "{}:", self.table)?;
            for step in &self.steps {
                writeln!(f, "  {}", step)?;
            }
        }
        Ok(())
    }
}

/// Upper-case a type and apply the `INT(11)` ≡ `INT` rule.
fn normalize_type(sql_type: &str) -> String {
    let upper = sql_type.trim().to_uppercase();
    if upper == "INT(11)" {
        "INT".to_string()
    } else {
        upper
    }
}

/// Whether a declared and a live type name denote the same type.
pub fn types_match(declared: &str, live: &str) -> bool {
    normalize_type(declared) == normalize_type(live)
}

/// Compute the steps that bring `live` in line with `declared`.
///
/// Steps come out in declaration order, with a single `AddPrimaryKey` at the
/// end collecting every declared primary column the live table does not key.
/// A column the live table already keys as primary counts as unique.
///
/// Only the missing key columns go into `AddPrimaryKey`. If the live table
/// already has a primary key covering part of the declared one, the server
/// rejects that step; widening an existing key is left to the operator.
pub fn diff_table(declared: &TableSchema, live: &[LiveColumn]) -> SchemaDelta {
    let mut steps = Vec::new();
    let mut primary = Vec::new();
    let mut last_column = live.last().map(|c| c.name.clone());

    for column in &declared.columns {
        let current = live
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&column.name));

        match current {
            None => {
                steps.push(MigrationStep::AddColumn {
                    column: column.clone(),
                    after: last_column.clone(),
                });
                last_column = Some(column.name.clone());
            }
            Some(current) => {
                if !types_match(&column.sql_type, &current.sql_type)
                    || column.nullable != current.nullable
                {
                    steps.push(MigrationStep::ChangeColumnType {
                        column: column.clone(),
                        from: current.clone(),
                    });
                }
            }
        }

        let key_role = current.map(|c| c.key_role).unwrap_or_default();

        if column.primary && key_role != KeyRole::Primary {
            primary.push(column.name.clone());
        }

        if column.unique.is_some() && key_role == KeyRole::None {
            steps.push(MigrationStep::AddUniqueKey {
                name: declared.unique_key_name(column),
                column: column.name.clone(),
            });
        }
    }

    if !primary.is_empty() {
        steps.push(MigrationStep::AddPrimaryKey(primary));
    }

    SchemaDelta {
        table: declared.name.clone(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SemanticType, UniqueKey};
    use proptest::prelude::*;

    fn make_column(name: &str, sql_type: &str, nullable: bool) -> ColumnDecl {
        ColumnDecl {
            name: name.to_string(),
            semantic: SemanticType::Text,
            size_limit: None,
            sql_type: sql_type.to_string(),
            nullable,
            primary: false,
            unique: None,
        }
    }

    fn make_pk_column(name: &str, sql_type: &str) -> ColumnDecl {
        ColumnDecl {
            primary: true,
            ..make_column(name, sql_type, false)
        }
    }

    fn make_unique_column(name: &str, sql_type: &str) -> ColumnDecl {
        ColumnDecl {
            unique: Some(UniqueKey::default()),
            ..make_column(name, sql_type, false)
        }
    }

    fn make_table(name: &str, columns: Vec<ColumnDecl>) -> TableSchema {
        TableSchema {
            name: name.to_string(),
            columns,
        }
    }

    fn live(name: &str, sql_type: &str, nullable: bool, key_role: KeyRole) -> LiveColumn {
        LiveColumn::new(name, sql_type, nullable, key_role)
    }

    #[test]
    fn test_diff_empty_live_table() {
        let declared = make_table(
            "widgets",
            vec![
                make_pk_column("id", "VARCHAR(16)"),
                make_column("name", "VARCHAR(50)", false),
                make_column("active", "TINYINT", false),
            ],
        );

        let delta = diff_table(&declared, &[]);
        assert_eq!(delta.len(), 4);
        assert!(matches!(
            &delta.steps[0],
            MigrationStep::AddColumn { column, after: None } if column.name == "id"
        ));
        assert!(matches!(
            &delta.steps[1],
            MigrationStep::AddColumn { column, after: Some(after) }
                if column.name == "name" && after == "id"
        ));
        assert!(matches!(
            &delta.steps[2],
            MigrationStep::AddColumn { column, after: Some(after) }
                if column.name == "active" && after == "name"
        ));
        assert_eq!(
            delta.steps[3],
            MigrationStep::AddPrimaryKey(vec!["id".to_string()])
        );
    }

    #[test]
    fn test_int_display_width_is_ignored() {
        let declared = make_table("t", vec![make_column("count", "INT", false)]);
        let delta = diff_table(&declared, &[live("count", "int(11)", false, KeyRole::None)]);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_other_display_widths_are_not_ignored() {
        let declared = make_table("t", vec![make_column("big", "BIGINT", false)]);
        let delta = diff_table(&declared, &[live("big", "bigint(20)", false, KeyRole::None)]);
        assert_eq!(delta.len(), 1);
    }

    #[test]
    fn test_varchar_size_change() {
        let declared = make_table("t", vec![make_column("name", "VARCHAR(64)", false)]);
        let delta = diff_table(
            &declared,
            &[live("name", "varchar(32)", false, KeyRole::None)],
        );
        assert_eq!(delta.len(), 1);
        assert!(matches!(
            &delta.steps[0],
            MigrationStep::ChangeColumnType { column, from }
                if column.sql_type == "VARCHAR(64)" && from.sql_type == "VARCHAR(32)"
        ));
    }

    #[test]
    fn test_nullability_change() {
        let declared = make_table("t", vec![make_column("note", "TEXT", true)]);
        let delta = diff_table(&declared, &[live("note", "TEXT", false, KeyRole::None)]);
        assert_eq!(delta.len(), 1);
        insta::assert_snapshot!(delta.to_sql(), @"ALTER TABLE `t` CHANGE `note` `note` TEXT NULL;");
    }

    #[test]
    fn test_new_column_goes_after_last_live_column() {
        let declared = make_table(
            "t",
            vec![
                make_column("a", "INT", false),
                make_column("c", "INT", false),
                make_column("d", "INT", false),
            ],
        );
        let current = [
            live("a", "INT", false, KeyRole::None),
            live("b", "INT", false, KeyRole::None),
        ];
        let delta = diff_table(&declared, &current);
        insta::assert_snapshot!(delta.to_sql(), @r"
        ALTER TABLE `t` ADD `c` INT NOT NULL AFTER `b`;
        ALTER TABLE `t` ADD `d` INT NOT NULL AFTER `c`;
        ");
    }

    #[test]
    fn test_undeclared_live_columns_are_kept() {
        let declared = make_table("t", vec![make_column("a", "INT", false)]);
        let current = [
            live("a", "INT", false, KeyRole::None),
            live("legacy", "TEXT", true, KeyRole::None),
        ];
        assert!(diff_table(&declared, &current).is_empty());
    }

    #[test]
    fn test_composite_primary_key() {
        let declared = make_table(
            "post_like",
            vec![
                make_pk_column("user_id", "BIGINT"),
                make_pk_column("post_id", "BIGINT"),
            ],
        );
        let current = [
            live("user_id", "BIGINT", false, KeyRole::None),
            live("post_id", "BIGINT", false, KeyRole::None),
        ];
        let delta = diff_table(&declared, &current);
        insta::assert_snapshot!(delta.to_sql(), @"ALTER TABLE `post_like` ADD PRIMARY KEY (`user_id`, `post_id`);");
    }

    #[test]
    fn test_unique_key_names() {
        let mut named = make_unique_column("handle", "VARCHAR(32)");
        named.unique = Some(UniqueKey {
            name: Some("handle_key"),
        });
        let declared = make_table(
            "user",
            vec![make_unique_column("email", "VARCHAR(120)"), named],
        );
        let current = [
            live("email", "VARCHAR(120)", false, KeyRole::None),
            live("handle", "VARCHAR(32)", false, KeyRole::None),
        ];
        let delta = diff_table(&declared, &current);
        insta::assert_snapshot!(delta.to_sql(), @r"
        ALTER TABLE `user` ADD UNIQUE KEY `uq_user_email` (`email`);
        ALTER TABLE `user` ADD UNIQUE KEY `handle_key` (`handle`);
        ");
    }

    #[test]
    fn test_existing_keys_are_not_re_added() {
        let mut both = make_pk_column("id", "BIGINT");
        both.unique = Some(UniqueKey::default());
        let declared = make_table("t", vec![both, make_unique_column("email", "TEXT")]);
        let current = [
            live("id", "BIGINT", false, KeyRole::Primary),
            live("email", "TEXT", false, KeyRole::Unique),
        ];
        assert!(diff_table(&declared, &current).is_empty());
    }

    #[test]
    fn test_batched_statement() {
        let declared = make_table(
            "widgets",
            vec![
                make_pk_column("id", "VARCHAR(16)"),
                make_column("name", "VARCHAR(50)", false),
            ],
        );
        let delta = diff_table(&declared, &[]);
        let stmts = delta.to_statements(true);
        assert_eq!(stmts.len(), 1);
        insta::assert_snapshot!(render(&stmts[0]).sql, @"ALTER TABLE `widgets` ADD `id` VARCHAR(16) NOT NULL, ADD `name` VARCHAR(50) NOT NULL AFTER `id`, ADD PRIMARY KEY (`id`)");
    }

    #[test]
    fn snapshot_display() {
        let declared = make_table(
            "widgets",
            vec![
                make_pk_column("id", "VARCHAR(16)"),
                make_column("name", "VARCHAR(64)", true),
            ],
        );
        let current = [live("name", "VARCHAR(32)", false, KeyRole::None)];
        let delta = diff_table(&declared, &current);
        insta::assert_snapshot!(delta.to_string(), @r"
        widgets:
          + id: VARCHAR(16) NOT NULL (after name)
          ~ name: VARCHAR(32) NOT NULL -> VARCHAR(64) NULL
          + PRIMARY KEY (id)
        ");
    }

    // ===== Idempotence =====

    /// What the catalog reports after running `delta` against `live`.
    fn apply(live: &[LiveColumn], delta: &SchemaDelta) -> Vec<LiveColumn> {
        let mut columns = live.to_vec();
        for step in &delta.steps {
            match step {
                MigrationStep::AddColumn { column, after } => {
                    // MySQL reports INT with its display width.
                    let sql_type = if column.sql_type == "INT" {
                        "INT(11)"
                    } else {
                        column.sql_type.as_str()
                    };
                    let added = LiveColumn::new(
                        column.name.clone(),
                        sql_type,
                        column.nullable,
                        KeyRole::None,
                    );
                    let idx = match after {
                        Some(after) => {
                            columns.iter().position(|c| &c.name == after).unwrap() + 1
                        }
                        None => 0,
                    };
                    columns.insert(idx, added);
                }
                MigrationStep::ChangeColumnType { column, .. } => {
                    let current = columns.iter_mut().find(|c| c.name == column.name).unwrap();
                    current.sql_type = column.sql_type.to_uppercase();
                    current.nullable = column.nullable;
                }
                MigrationStep::AddPrimaryKey(cols) => {
                    for col in cols {
                        let current = columns.iter_mut().find(|c| &c.name == col).unwrap();
                        current.key_role = KeyRole::Primary;
                    }
                }
                MigrationStep::AddUniqueKey { column, .. } => {
                    let current = columns.iter_mut().find(|c| &c.name == column).unwrap();
                    if current.key_role == KeyRole::None {
                        current.key_role = KeyRole::Unique;
                    }
                }
            }
        }
        columns
    }

    const TYPES: [&str; 5] = ["INT", "BIGINT", "TEXT", "VARCHAR(16)", "VARCHAR(50)"];

    prop_compose! {
        fn arb_decl(idx: usize)(
            ty in 0..TYPES.len(),
            nullable in any::<bool>(),
            primary in any::<bool>(),
            unique in any::<bool>(),
        ) -> ColumnDecl {
            ColumnDecl {
                name: format!("c{idx}"),
                semantic: SemanticType::Text,
                size_limit: None,
                sql_type: TYPES[ty].to_string(),
                nullable: nullable && !primary,
                primary,
                unique: unique.then(UniqueKey::default),
            }
        }
    }

    prop_compose! {
        fn arb_live(idx: usize)(
            ty in 0..TYPES.len(),
            nullable in any::<bool>(),
            role in 0..3u8,
        ) -> LiveColumn {
            let key_role = match role {
                0 => KeyRole::None,
                1 => KeyRole::Primary,
                _ => KeyRole::Unique,
            };
            LiveColumn::new(format!("c{idx}"), TYPES[ty], nullable, key_role)
        }
    }

    fn arb_case() -> impl Strategy<Value = (TableSchema, Vec<LiveColumn>)> {
        (1..8usize, 0..10usize).prop_flat_map(|(declared, live)| {
            let decls: Vec<_> = (0..declared).map(arb_decl).collect();
            let lives: Vec<_> = (0..live).map(arb_live).collect();
            (decls, lives, any::<bool>()).prop_map(|(columns, lives, keep)| {
                // Optionally drop some live columns so both sides have gaps.
                let lives = lives
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| keep || i % 2 == 0)
                    .map(|(_, c)| c)
                    .collect();
                (make_table("t", columns), lives)
            })
        })
    }

    proptest! {
        #[test]
        fn applying_delta_converges((declared, current) in arb_case()) {
            let delta = diff_table(&declared, &current);
            let migrated = apply(&current, &delta);
            let again = diff_table(&declared, &migrated);
            prop_assert!(again.is_empty(), "second pass produced {again}");
        }
    }
}
