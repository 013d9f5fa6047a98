use super::{Executor, Store};
use crate::diff::SchemaDelta;
use crate::migrate::Migrator;
use crate::record::table_of;
use crate::{Error, Intent, Record, Registry, Result, Where, crud};

/// A relational store: CRUD and migrations over an [`Executor`].
pub struct SqlStore<E> {
    executor: E,
    registry: Registry,
    batch_alter: bool,
}

impl<E: Executor> SqlStore<E> {
    pub fn new(executor: E, registry: Registry) -> Self {
        Self {
            executor,
            registry,
            batch_alter: false,
        }
    }

    /// Run each migration as a single `ALTER TABLE` statement.
    pub fn with_batch_alter(mut self, batch_alter: bool) -> Self {
        self.batch_alter = batch_alter;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    pub fn migrator(&self) -> Migrator<'_, E> {
        Migrator::new(&self.executor, &self.registry).batch_alter(self.batch_alter)
    }

    /// The delta `create_or_migrate` would apply to an existing table.
    pub async fn plan<R: Record>(&self) -> Result<SchemaDelta> {
        self.migrator().plan::<R>().await
    }

    /// Like [`Store::create_or_migrate`], returning the applied delta.
    pub async fn migrate<R: Record>(&self) -> Result<SchemaDelta> {
        self.migrator().create_or_migrate::<R>().await
    }
}

impl<E: Executor> Store for SqlStore<E> {
    async fn check_if_table_exists<R: Record>(&self) -> Result<bool> {
        let table = table_of::<R>()?;
        self.executor
            .table_exists(table)
            .await
            .map_err(Error::execution(Intent::CheckTable))
    }

    async fn create_table<R: Record>(&self) -> Result<()> {
        self.migrator().create_table::<R>().await?;
        Ok(())
    }

    async fn create_or_migrate<R: Record>(&self) -> Result<()> {
        self.migrate::<R>().await?;
        Ok(())
    }

    async fn insert<R: Record>(&self, record: &R) -> Result<()> {
        crud::insert(&self.executor, &self.registry, record).await
    }

    async fn update<R: Record>(&self, record: &R, predicate: &Where) -> Result<u64> {
        crud::update(&self.executor, &self.registry, record, predicate).await
    }

    async fn select<R: Record>(&self, predicate: &Where) -> Result<Vec<R>> {
        crud::select(&self.executor, &self.registry, predicate).await
    }

    async fn exists<R: Record>(&self, predicate: &Where) -> Result<bool> {
        crud::exists::<_, R>(&self.executor, &self.registry, predicate).await
    }
}
