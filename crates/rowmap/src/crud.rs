//! Parameterized CRUD statements over an [`Executor`].

use crate::record::{RowOutcome, record_to_row, row_to_record, table_of};
use crate::store::Executor;
use crate::{Error, Intent, Record, Registry, Result, Value, Where};
use rowmap_sql::{Expr, InsertStmt, RenderedSql, SelectStmt, UpdateStmt, render};

/// A rendered statement with its bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Pair rendered SQL with the values for its placeholders.
    ///
    /// `params` holds one value per rendered parameter, followed by the
    /// predicate's values for the placeholders in its raw fragment.
    fn bind(rendered: RenderedSql, params: Vec<Value>, predicate: Option<&Where>) -> Self {
        let raw = predicate.map_or(0, |p| p.values().len());
        debug_assert_eq!(rendered.params.len() + raw, params.len());
        Self {
            sql: rendered.sql,
            params,
        }
    }
}

fn predicate_values(registry: &Registry, predicate: &Where) -> Vec<Value> {
    predicate
        .values()
        .iter()
        .map(|v| registry.to_storage(v))
        .collect()
}

/// `INSERT INTO` with every mapped column, in declaration order.
pub fn insert_statement<R: Record>(registry: &Registry, record: &R) -> Result<Statement> {
    let table = table_of::<R>()?;
    let row = record_to_row(registry, record);

    let stmt = row
        .iter()
        .fold(InsertStmt::new(table), |stmt, (column, _)| {
            stmt.column(*column, Expr::param(*column))
        });

    let params = row.into_iter().map(|(_, v)| v).collect();
    Ok(Statement::bind(render(&stmt), params, None))
}

/// `UPDATE ... SET` every mapped column for the rows matching `predicate`.
///
/// The SET values are bound first, then the predicate's values.
pub fn update_statement<R: Record>(
    registry: &Registry,
    record: &R,
    predicate: &Where,
) -> Result<Statement> {
    let table = table_of::<R>()?;
    let row = record_to_row(registry, record);

    let stmt = row
        .iter()
        .fold(UpdateStmt::new(table), |stmt, (column, _)| {
            stmt.set(*column, Expr::param(*column))
        })
        .where_(Expr::raw(predicate.fragment()));

    let mut params: Vec<Value> = row.into_iter().map(|(_, v)| v).collect();
    params.extend(predicate_values(registry, predicate));

    Ok(Statement::bind(render(&stmt), params, Some(predicate)))
}

/// `SELECT *` for the rows matching `predicate`, honoring its limit.
pub fn select_statement<R: Record>(registry: &Registry, predicate: &Where) -> Result<Statement> {
    let table = table_of::<R>()?;
    let stmt = SelectStmt::new(table)
        .where_(Expr::raw(predicate.fragment()))
        .limit(predicate.limit());

    let params = predicate_values(registry, predicate);
    Ok(Statement::bind(render(&stmt), params, Some(predicate)))
}

pub async fn insert<E, R>(executor: &E, registry: &Registry, record: &R) -> Result<()>
where
    E: Executor + ?Sized,
    R: Record,
{
    let stmt = insert_statement(registry, record)?;
    executor
        .execute(&stmt.sql, &stmt.params)
        .await
        .map_err(Error::execution(Intent::Insert))?;
    Ok(())
}

pub async fn update<E, R>(
    executor: &E,
    registry: &Registry,
    record: &R,
    predicate: &Where,
) -> Result<u64>
where
    E: Executor + ?Sized,
    R: Record,
{
    let stmt = update_statement(registry, record, predicate)?;
    executor
        .execute(&stmt.sql, &stmt.params)
        .await
        .map_err(Error::execution(Intent::Update))
}

/// Rows matching `predicate`, converted to records.
///
/// Rows that cannot be converted are logged and skipped.
pub async fn select<E, R>(executor: &E, registry: &Registry, predicate: &Where) -> Result<Vec<R>>
where
    E: Executor + ?Sized,
    R: Record,
{
    let table = table_of::<R>()?;
    let stmt = select_statement::<R>(registry, predicate)?;
    let rows = executor
        .query(&stmt.sql, &stmt.params)
        .await
        .map_err(Error::execution(Intent::Select))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row_to_record::<R>(registry, row) {
            RowOutcome::Loaded(record) => records.push(record),
            RowOutcome::Dropped { column, error } => {
                tracing::warn!(table, column = %column, %error, "skipping row that does not fit the record type");
            }
        }
    }
    Ok(records)
}

/// Whether any row matches `predicate`. Rows are not converted.
pub async fn exists<E, R>(executor: &E, registry: &Registry, predicate: &Where) -> Result<bool>
where
    E: Executor + ?Sized,
    R: Record,
{
    let stmt = select_statement::<R>(registry, predicate)?;
    let rows = executor
        .query(&stmt.sql, &stmt.params)
        .await
        .map_err(Error::execution(Intent::Exists))?;
    Ok(!rows.is_empty())
}
