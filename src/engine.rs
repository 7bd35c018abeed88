use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::table::storage::Table;
use crate::table::{TableDescription, TableSchema};

type TableHandle = Arc<RwLock<Table>>;

/// An embedded table engine
///
/// Cloning is cheap and every clone shares the same tables. Pass the engine
/// to whatever needs it; there is no global instance.
///
/// Each table sits behind its own lock: writes take it exclusively for the
/// base item and all of its index entries together, reads share it. Work on
/// different tables never contends beyond the short catalog lookup.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    config: EngineConfig,
    tables: RwLock<BTreeMap<String, TableHandle>>,
}

impl Engine {
    /// Engine with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with custom limits
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                tables: RwLock::default(),
            }),
        }
    }

    /// The engine's limits
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub(crate) async fn table(&self, name: &str) -> Result<TableHandle> {
        self.inner
            .tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::table_not_found(name))
    }

    /// Create an empty table
    ///
    /// The key and index schema cannot change afterwards.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` when the schema is malformed, `AlreadyExists` when the
    /// name is taken.
    pub async fn create_table(&self, schema: TableSchema) -> Result<TableDescription> {
        schema.validate()?;

        let mut tables = self.inner.tables.write().await;
        match tables.entry(schema.name.clone()) {
            Entry::Occupied(entry) => Err(Error::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                let table = Table::new(schema);
                let description = table.describe();
                let _ = entry.insert(Arc::new(RwLock::new(table)));

                tracing::info!(
                    table = %description.schema.name,
                    indexes = description.schema.indexes.len(),
                    "Table created"
                );
                Ok(description)
            }
        }
    }

    /// Delete a table with all of its items and indexes
    ///
    /// Returns the table as it was just before deletion. Deleting a missing
    /// table, including one already deleted, fails with `NotFound`.
    pub async fn delete_table(&self, name: &str) -> Result<TableDescription> {
        let table = self
            .inner
            .tables
            .write()
            .await
            .remove(name)
            .ok_or_else(|| Error::table_not_found(name))?;

        let description = table.read().await.describe();
        tracing::info!(table = %name, items = description.item_count, "Table deleted");

        Ok(description)
    }

    /// Schema and item count of a table
    pub async fn describe_table(&self, name: &str) -> Result<TableDescription> {
        let table = self.table(name).await?;
        let description = table.read().await.describe();
        Ok(description)
    }

    /// Names of all tables, ascending
    pub async fn list_tables(&self) -> Vec<String> {
        self.inner.tables.read().await.keys().cloned().collect()
    }
}
