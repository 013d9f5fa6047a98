//! Applying schema deltas to a live database.

use crate::diff::{SchemaDelta, column_def, diff_table};
use crate::reflect::reflect;
use crate::store::Executor;
use crate::{Error, Intent, Record, Registry, Result, TableSchema};
use rowmap_sql::{CreateTableStmt, render};

/// Creates and migrates tables for record types.
///
/// Migration is not transactional: if a step fails, the steps before it stay
/// applied and the rest are abandoned. Callers must make sure nothing else
/// writes to the table's schema while a migration runs.
pub struct Migrator<'a, E: ?Sized> {
    executor: &'a E,
    registry: &'a Registry,
    batch_alter: bool,
}

impl<'a, E: Executor + ?Sized> Migrator<'a, E> {
    pub fn new(executor: &'a E, registry: &'a Registry) -> Self {
        Self {
            executor,
            registry,
            batch_alter: false,
        }
    }

    /// Run every step of a delta in one `ALTER TABLE` statement.
    pub fn batch_alter(mut self, batch_alter: bool) -> Self {
        self.batch_alter = batch_alter;
        self
    }

    /// Compute the delta for `R` without changing anything.
    pub async fn plan<R: Record>(&self) -> Result<SchemaDelta> {
        let declared = reflect::<R>(self.registry)?;
        self.plan_schema(&declared).await
    }

    async fn plan_schema(&self, declared: &TableSchema) -> Result<SchemaDelta> {
        let live = self
            .executor
            .catalog_columns(&declared.name)
            .await
            .map_err(Error::execution(Intent::Inspect))?;
        Ok(diff_table(declared, &live))
    }

    /// Execute a delta's steps in order, stopping at the first failure.
    pub async fn apply(&self, delta: &SchemaDelta) -> Result<()> {
        for step in &delta.steps {
            tracing::info!(table = %delta.table, %step, "applying schema change");
        }
        for stmt in delta.to_statements(self.batch_alter) {
            let sql = render(&stmt).sql;
            self.executor
                .execute(&sql, &[])
                .await
                .map_err(Error::execution(Intent::Migrate))?;
        }
        Ok(())
    }

    /// Diff `R` against its live table and apply the result.
    pub async fn migrate<R: Record>(&self) -> Result<SchemaDelta> {
        let declared = reflect::<R>(self.registry)?;
        self.migrate_schema(&declared).await
    }

    /// Diff a declared schema against its live table and apply the result.
    pub async fn migrate_schema(&self, declared: &TableSchema) -> Result<SchemaDelta> {
        let delta = self.plan_schema(declared).await?;
        if delta.is_empty() {
            tracing::debug!(table = %declared.name, "schema is up to date");
        } else {
            self.apply(&delta).await?;
        }
        Ok(delta)
    }

    /// Create the table for `R`, then add its keys.
    ///
    /// Returns the key delta applied after creation.
    pub async fn create_table<R: Record>(&self) -> Result<SchemaDelta> {
        let declared = reflect::<R>(self.registry)?;
        self.create_schema(&declared).await
    }

    async fn create_schema(&self, declared: &TableSchema) -> Result<SchemaDelta> {
        let stmt = declared
            .columns
            .iter()
            .fold(CreateTableStmt::new(declared.name.clone()), |stmt, column| {
                stmt.column(column_def(column))
            });
        let sql = render(&stmt).sql;

        tracing::info!(table = %declared.name, "creating table");
        self.executor
            .execute(&sql, &[])
            .await
            .map_err(Error::execution(Intent::CreateTable))?;

        self.migrate_schema(declared).await
    }

    /// Create the table for `R` if it is missing, migrate it otherwise.
    pub async fn create_or_migrate<R: Record>(&self) -> Result<SchemaDelta> {
        let declared = reflect::<R>(self.registry)?;
        self.create_or_migrate_schema(&declared).await
    }

    /// Create or migrate a declared schema.
    pub async fn create_or_migrate_schema(&self, declared: &TableSchema) -> Result<SchemaDelta> {
        let exists = self
            .executor
            .table_exists(&declared.name)
            .await
            .map_err(Error::execution(Intent::CheckTable))?;
        if exists {
            self.migrate_schema(declared).await
        } else {
            self.create_schema(declared).await
        }
    }

    /// Create or migrate every table registered with [`record!`](crate::record).
    pub async fn create_or_migrate_all(&self) -> Result<Vec<SchemaDelta>> {
        let mut deltas = Vec::new();
        for declared in crate::reflect::collect_schema(self.registry)? {
            deltas.push(self.create_or_migrate_schema(&declared).await?);
        }
        Ok(deltas)
    }
}
