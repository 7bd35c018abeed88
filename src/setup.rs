use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::model::{IndexedModel, TableModel};
use crate::table::{TableDescription, TableSchema};

/// Create the table of a [`TableModel`]
///
/// A table that already exists is left as it is and described instead, so
/// repeated setup is harmless.
pub async fn table<T>(engine: &Engine) -> Result<TableDescription>
where
    T: TableModel,
{
    create_or_describe(engine, T::schema()).await
}

/// Create the table of an [`IndexedModel`] together with its index
pub async fn table_with_index<T>(engine: &Engine) -> Result<TableDescription>
where
    T: IndexedModel,
{
    create_or_describe(engine, T::schema().with_index(T::index_definition())).await
}

async fn create_or_describe(engine: &Engine, schema: TableSchema) -> Result<TableDescription> {
    match engine.create_table(schema).await {
        Ok(description) => Ok(description),
        Err(Error::AlreadyExists(name)) => {
            tracing::debug!(table = %name, "Table already exists");
            engine.describe_table(&name).await
        }
        Err(e) => Err(e),
    }
}
