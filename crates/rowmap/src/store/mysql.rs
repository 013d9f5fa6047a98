//! MySQL backend over a sqlx connection pool.
//!
//! Every statement runs inside a `tracing` span (`db.execute` or `db.query`)
//! that records the SQL text, the number of bound parameters and the number
//! of rows affected or returned.
//!
//! A cell the typed decoders cannot read is passed on as raw text, so only
//! the row holding it is dropped when it does not fit the record type.

use super::{BoxFuture, Executor, SqlStore};
use crate::config::{Config, ConfigError, MySqlConfig};
use crate::value::Row;
use crate::{BackendError, Registry, Result, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::Instrument;

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

/// A relational store backed by MySQL.
pub type MySqlStore = SqlStore<MySqlExecutor>;

/// An [`Executor`] running statements on a MySQL pool.
#[derive(Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Connect using a URL plus optional credentials.
    pub async fn connect(config: &MySqlConfig) -> std::result::Result<Self, BackendError> {
        let mut options = MySqlConnectOptions::from_str(&config.url)?;
        if let Some(username) = &config.username {
            options = options.username(username);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;
        tracing::info!(url = %config.url, "connected to mysql");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Get the inner pool (for cases where you need the raw pool).
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close every connection in the pool.
    pub async fn disconnect(&self) {
        self.pool.close().await;
    }
}

impl Executor for MySqlExecutor {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, std::result::Result<u64, BackendError>> {
        Box::pin(async move {
            let span = tracing::debug_span!(
                "db.execute",
                sql = %sql,
                params = params.len(),
                affected = tracing::field::Empty,
            );
            let query = params.iter().fold(sqlx::query(sql), bind);
            let affected = query
                .execute(&self.pool)
                .instrument(span.clone())
                .await?
                .rows_affected();
            span.record("affected", affected);
            Ok(affected)
        })
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, std::result::Result<Vec<Row>, BackendError>> {
        Box::pin(async move {
            let span = tracing::debug_span!(
                "db.query",
                sql = %sql,
                params = params.len(),
                rows = tracing::field::Empty,
            );
            let query = params.iter().fold(sqlx::query(sql), bind);
            let rows = query
                .fetch_all(&self.pool)
                .instrument(span.clone())
                .await?;
            span.record("rows", rows.len());
            let mut decoded = Vec::with_capacity(rows.len());
            for row in &rows {
                match decode_row(row) {
                    Ok(row) => decoded.push(row),
                    Err(error) => {
                        tracing::warn!(%sql, %error, "skipping row with an unreadable cell");
                    }
                }
            }
            Ok(decoded)
        })
    }
}

impl SqlStore<MySqlExecutor> {
    /// Connect with the `[mysql]` and `[migrate]` sections of a configuration.
    pub async fn connect(config: &Config) -> Result<Self> {
        let mysql = config
            .mysql
            .as_ref()
            .ok_or(ConfigError::MissingSection("mysql"))?;
        let executor = MySqlExecutor::connect(mysql)
            .await
            .map_err(crate::Error::execution(crate::Intent::Connect))?;
        Ok(SqlStore::new(executor, Registry::new()).with_batch_alter(config.migrate.batch_alter))
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.executor().disconnect().await;
    }
}

fn bind<'q>(query: MySqlQuery<'q>, value: &Value) -> MySqlQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::I8(v) => query.bind(*v),
        Value::I16(v) => query.bind(*v),
        Value::I32(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::F32(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::String(v) => query.bind(v.clone()),
        Value::Timestamp(v) => query.bind(*v),
    }
}

fn decode_row(row: &MySqlRow) -> std::result::Result<Row, sqlx::Error> {
    row.columns()
        .iter()
        .map(|column| {
            let index = column.ordinal();
            let type_name = column.type_info().name();
            let value = match decode_value(row, index, type_name) {
                Ok(value) => value,
                Err(error) => {
                    tracing::debug!(column = column.name(), type_name, %error, "reading cell as raw text");
                    raw_text(row, index)?
                }
            };
            Ok((column.name().to_string(), value))
        })
        .collect()
}

fn decode_value(
    row: &MySqlRow,
    index: usize,
    type_name: &str,
) -> std::result::Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOLEAN" | "TINYINT" => Value::I8(row.try_get(index)?),
        "TINYINT UNSIGNED" => Value::I16(row.try_get::<u8, _>(index)?.into()),
        "SMALLINT" => Value::I16(row.try_get(index)?),
        "SMALLINT UNSIGNED" => Value::I32(row.try_get::<u16, _>(index)?.into()),
        "INT" | "MEDIUMINT" => Value::I32(row.try_get(index)?),
        "INT UNSIGNED" | "MEDIUMINT UNSIGNED" => Value::I64(row.try_get::<u32, _>(index)?.into()),
        "BIGINT" => Value::I64(row.try_get(index)?),
        "BIGINT UNSIGNED" => {
            let wide: u64 = row.try_get(index)?;
            match i64::try_from(wide) {
                Ok(v) => Value::I64(v),
                Err(_) => Value::String(wide.to_string()),
            }
        }
        "FLOAT" => Value::F32(row.try_get(index)?),
        "DOUBLE" => Value::F64(row.try_get(index)?),
        "DATETIME" | "TIMESTAMP" => Value::Timestamp(row.try_get::<NaiveDateTime, _>(index)?),
        "DATE" => Value::Timestamp(row.try_get::<NaiveDate, _>(index)?.and_time(NaiveTime::MIN)),
        // Text, DECIMAL and anything else the driver hands back as characters.
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

/// The cell's bytes as text, for values the typed decoders reject (zero
/// dates, binary strings). Record conversion then decides whether the row
/// fits.
fn raw_text(row: &MySqlRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
    Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}
