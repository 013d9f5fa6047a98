//! Live schema: what the connected database says a table looks like.

use crate::store::Executor;
use crate::value::{Row, row_get};
use crate::{BackendError, KeyRole, LiveColumn, Value};

const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) AS table_count \
     FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?";

const COLUMNS_SQL: &str = "SELECT \
     CAST(COLUMN_NAME AS CHAR) AS column_name, \
     CAST(COLUMN_TYPE AS CHAR) AS column_type, \
     CAST(IS_NULLABLE AS CHAR) AS is_nullable, \
     CAST(COLUMN_KEY AS CHAR) AS column_key \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

/// Whether a table exists in the current database.
pub async fn table_exists<E: Executor + ?Sized>(
    executor: &E,
    table: &str,
) -> Result<bool, BackendError> {
    let params = [Value::from(table)];
    let rows = executor.query(TABLE_EXISTS_SQL, &params).await?;
    let count = rows
        .first()
        .and_then(|row| row.first())
        .and_then(|(_, value)| value.to_text())
        .and_then(|text| text.parse::<i64>().ok())
        .unwrap_or(0);
    Ok(count > 0)
}

/// Columns of a table in ordinal order. Empty if the table does not exist.
pub async fn table_columns<E: Executor + ?Sized>(
    executor: &E,
    table: &str,
) -> Result<Vec<LiveColumn>, BackendError> {
    let params = [Value::from(table)];
    let rows = executor.query(COLUMNS_SQL, &params).await?;
    rows.iter().map(live_column).collect()
}

fn live_column(row: &Row) -> Result<LiveColumn, BackendError> {
    let text = |column: &str| -> Result<String, BackendError> {
        row_get(row, column)
            .and_then(Value::to_text)
            .ok_or_else(|| BackendError::Message(format!("catalog row is missing {column}")))
    };

    let name = text("column_name")?;
    let sql_type = text("column_type")?;
    let nullable = text("is_nullable")?.eq_ignore_ascii_case("YES");
    // COLUMN_KEY is an empty string for unkeyed columns, which some drivers
    // hand back as NULL.
    let key = row_get(row, "column_key")
        .and_then(Value::to_text)
        .unwrap_or_default();

    Ok(LiveColumn::new(
        name,
        sql_type,
        nullable,
        KeyRole::from_catalog(&key),
    ))
}
