//! Store abstraction: the CRUD contract and the backends implementing it.

use crate::query::Where;
use crate::value::Row;
use crate::{BackendError, LiveColumn, Record, Result, Value, introspect};
use std::future::Future;
use std::pin::Pin;

mod mysql;
mod sql;
mod yaml;

pub use mysql::{MySqlExecutor, MySqlStore};
pub use sql::SqlStore;
pub use yaml::YamlStore;

/// A boxed future, as returned by [`Executor`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can run SQL statements.
///
/// Parameters are bound positionally to the `?` placeholders. Implemented by
/// [`MySqlExecutor`]; tests implement it with scripted responses.
pub trait Executor: Send + Sync {
    /// Execute a statement, returning the number of rows affected.
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, std::result::Result<u64, BackendError>>;

    /// Execute a query, returning all rows.
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, std::result::Result<Vec<Row>, BackendError>>;

    /// Whether a table exists in the current database.
    fn table_exists<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, std::result::Result<bool, BackendError>> {
        Box::pin(introspect::table_exists(self, table))
    }

    /// Columns of a table as reported by the catalog, in ordinal order.
    fn catalog_columns<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, std::result::Result<Vec<LiveColumn>, BackendError>> {
        Box::pin(introspect::table_columns(self, table))
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, std::result::Result<u64, BackendError>> {
        (**self).execute(sql, params)
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, std::result::Result<Vec<Row>, BackendError>> {
        (**self).query(sql, params)
    }

    fn table_exists<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, std::result::Result<bool, BackendError>> {
        (**self).table_exists(table)
    }

    fn catalog_columns<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, std::result::Result<Vec<LiveColumn>, BackendError>> {
        (**self).catalog_columns(table)
    }
}

/// The backend-neutral CRUD contract.
///
/// Every operation first checks that the record type declares a table and
/// fails with [`Error::NotATable`](crate::Error::NotATable) otherwise.
///
/// Schema changes (`create_*`) assume exclusive access to the table for their
/// duration.
pub trait Store: Send + Sync {
    /// Whether the table backing `R` exists.
    fn check_if_table_exists<R: Record>(&self) -> impl Future<Output = Result<bool>> + Send;

    /// Create the table backing `R`, then add its key constraints.
    fn create_table<R: Record>(&self) -> impl Future<Output = Result<()>> + Send;

    /// Bring the table backing `R` in line with its declaration, creating it
    /// if it does not exist.
    fn create_or_migrate<R: Record>(&self) -> impl Future<Output = Result<()>> + Send;

    /// Insert a record.
    fn insert<R: Record>(&self, record: &R) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite every mapped column of the rows matching `predicate`.
    ///
    /// Returns the number of rows affected.
    fn update<R: Record>(
        &self,
        record: &R,
        predicate: &Where,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Rows matching `predicate`. Rows that do not fit `R` are skipped.
    fn select<R: Record>(&self, predicate: &Where) -> impl Future<Output = Result<Vec<R>>> + Send;

    /// Whether at least one row matches `predicate`.
    fn exists<R: Record>(&self, predicate: &Where) -> impl Future<Output = Result<bool>> + Send;

    /// Create the table only if it is missing. Returns true if it was created.
    fn create_table_if_not_exists<R: Record>(&self) -> impl Future<Output = Result<bool>> + Send {
        async move {
            if self.check_if_table_exists::<R>().await? {
                return Ok(false);
            }
            self.create_table::<R>().await?;
            Ok(true)
        }
    }

    /// Update the record's row, located by its primary-key values.
    fn update_by_key<R: Record>(&self, record: &R) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let predicate = Where::for_key(record)?;
            self.update(record, &predicate).await
        }
    }

    /// First row matching `predicate`.
    fn select_one<R: Record>(
        &self,
        predicate: &Where,
    ) -> impl Future<Output = Result<Option<R>>> + Send {
        async move {
            let predicate = predicate.clone().with_limit(1);
            Ok(self.select::<R>(&predicate).await?.into_iter().next())
        }
    }

    /// Update the rows matching `predicate` if there are any, insert otherwise.
    ///
    /// This is two round-trips and is not atomic: a concurrent writer can
    /// insert between the check and the write.
    fn upsert<R: Record>(
        &self,
        record: &R,
        predicate: &Where,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            if self.exists::<R>(predicate).await? {
                self.update(record, predicate).await?;
            } else {
                self.insert(record).await?;
            }
            Ok(())
        }
    }

    /// [`upsert`](Store::upsert) keyed by the record's primary-key values.
    fn upsert_by_key<R: Record>(&self, record: &R) -> impl Future<Output = Result<()>> + Send {
        async move {
            let predicate = Where::for_key(record)?;
            self.upsert(record, &predicate).await
        }
    }
}
