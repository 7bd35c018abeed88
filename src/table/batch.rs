use std::collections::BTreeMap;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::table::types::{Item, PrimaryKey};

/// A single request inside a batch write
#[derive(Clone, Debug, PartialEq)]
pub enum WriteRequest {
    /// Insert or replace an item
    Put(Item),
    /// Delete the item at a key
    Delete(PrimaryKey),
}

/// Batch write output
///
/// Holds the requests the engine did not apply. Callers must re-submit them
/// until nothing is left; see [`crate::write_all`].
#[must_use = "batch write results contain unprocessed requests that must be re-submitted"]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteOutput {
    /// Puts that were not applied
    pub unprocessed_puts: Vec<Item>,
    /// Deletes that were not applied
    pub unprocessed_deletes: Vec<PrimaryKey>,
}

impl BatchWriteOutput {
    /// Check if every request was applied
    pub fn is_success(&self) -> bool {
        self.unprocessed_puts.is_empty() && self.unprocessed_deletes.is_empty()
    }

    /// Get total number of requests left unprocessed
    pub fn unprocessed_count(&self) -> usize {
        self.unprocessed_puts.len() + self.unprocessed_deletes.len()
    }

    /// The unprocessed requests, puts first
    pub fn into_requests(self) -> Vec<WriteRequest> {
        self.unprocessed_puts
            .into_iter()
            .map(WriteRequest::Put)
            .chain(self.unprocessed_deletes.into_iter().map(WriteRequest::Delete))
            .collect()
    }
}

/// Batch get output
#[must_use = "batch get results should be used or you'll lose the fetched data"]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetOutput {
    /// Found items by requested key; missing keys are absent
    pub items: BTreeMap<PrimaryKey, Item>,
}

impl BatchGetOutput {
    /// Item found for `key`
    pub fn get(&self, key: &PrimaryKey) -> Option<&Item> {
        self.items.get(key)
    }

    /// Number of items found
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Engine {
    /// Get several items of one table by key
    ///
    /// Keys without an item are simply absent from the output; duplicate keys
    /// collapse into one entry.
    ///
    /// # Errors
    ///
    /// * `BatchTooLarge` - more keys than [`crate::EngineConfig::max_batch_get`];
    ///   nothing is read
    /// * `NotFound` - the table does not exist
    /// * `InvalidKey` - a key does not match the table's key schema
    pub async fn batch_get_item(
        &self,
        table_name: &str,
        keys: Vec<PrimaryKey>,
    ) -> Result<BatchGetOutput> {
        let max = self.config().max_batch_get;
        if keys.len() > max {
            return Err(Error::BatchTooLarge {
                requested: keys.len(),
                max,
            });
        }

        let table = self.table(table_name).await?;
        let table = table.read().await;

        for key in &keys {
            table.check_key(key)?;
        }

        let items: BTreeMap<PrimaryKey, Item> = keys
            .into_iter()
            .filter_map(|key| table.get(&key).cloned().map(|item| (key, item)))
            .collect();

        tracing::debug!(table = %table_name, found = items.len(), "Batch get");

        Ok(BatchGetOutput { items })
    }

    /// Put and delete several items of one table
    ///
    /// Each request is applied on its own; there is no cross-item atomicity
    /// guarantee. Requests are applied in order, puts before deletes.
    /// Unprocessed requests come back in the output and must be re-submitted
    /// by the caller until none remain. This engine applies every valid request,
    /// so the output is empty on success.
    ///
    /// # Errors
    ///
    /// * `BatchTooLarge` - more requests than
    ///   [`crate::EngineConfig::max_batch_write`]; nothing is written
    /// * `NotFound` - the table does not exist
    /// * `InvalidItem` / `InvalidKey` - a request is malformed; nothing is written
    pub async fn batch_write_item(
        &self,
        table_name: &str,
        puts: Vec<Item>,
        deletes: Vec<PrimaryKey>,
    ) -> Result<BatchWriteOutput> {
        let requested = puts.len() + deletes.len();
        let max = self.config().max_batch_write;
        if requested > max {
            return Err(Error::BatchTooLarge { requested, max });
        }

        let table = self.table(table_name).await?;
        let mut table = table.write().await;

        let prepared = puts
            .into_iter()
            .map(|item| table.prepare_put(item))
            .collect::<Result<Vec<_>>>()?;
        for key in &deletes {
            table.check_key(key)?;
        }

        for put in prepared {
            let _ = table.apply_put(put);
        }
        for key in &deletes {
            let _ = table.delete(key);
        }

        tracing::debug!(table = %table_name, requests = requested, "Batch write");

        Ok(BatchWriteOutput::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::table::{KeyAttribute, TableSchema};

    async fn engine(config: EngineConfig) -> Engine {
        let engine = Engine::with_config(config);
        let _ = engine
            .create_table(TableSchema::new("Users", KeyAttribute::string("Username")))
            .await
            .unwrap();
        engine
    }

    fn user(name: &str) -> Item {
        Item::new().with_string("Username", name)
    }

    #[tokio::test]
    async fn test_batch_write_invalid_request_writes_nothing() {
        let engine = engine(EngineConfig::default()).await;
        let puts = vec![user("a"), Item::new().with_string("Email", "b@example.com")];

        let err = engine.batch_write_item("Users", puts, vec![]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidItem(_)));
        assert_eq!(engine.describe_table("Users").await.unwrap().item_count, 0);
    }

    #[tokio::test]
    async fn test_batch_write_limit() {
        let engine = engine(EngineConfig::default().with_max_batch_write(2)).await;

        let output = engine
            .batch_write_item("Users", vec![user("a")], vec![PrimaryKey::new("b")])
            .await
            .unwrap();
        assert!(output.is_success());

        let err = engine
            .batch_write_item("Users", vec![user("a"), user("b")], vec![PrimaryKey::new("c")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BatchTooLarge { requested: 3, max: 2 }));
    }

    #[tokio::test]
    async fn test_batch_get_limit() {
        let engine = engine(EngineConfig::default().with_max_batch_get(1)).await;

        let err = engine
            .batch_get_item("Users", vec![PrimaryKey::new("a"), PrimaryKey::new("b")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BatchTooLarge { requested: 2, max: 1 }));
    }

    #[tokio::test]
    async fn test_batch_get_duplicates_collapse() {
        let engine = engine(EngineConfig::default()).await;
        let _ = engine.put_item("Users", user("a"), None).await.unwrap();

        let output = engine
            .batch_get_item("Users", vec![PrimaryKey::new("a"), PrimaryKey::new("a")])
            .await
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output.get(&PrimaryKey::new("a")), Some(&user("a")));
    }

    #[test]
    fn test_into_requests() {
        let output = BatchWriteOutput {
            unprocessed_puts: vec![user("a")],
            unprocessed_deletes: vec![PrimaryKey::new("b")],
        };
        assert_eq!(output.unprocessed_count(), 2);
        assert_eq!(
            output.into_requests(),
            vec![
                WriteRequest::Put(user("a")),
                WriteRequest::Delete(PrimaryKey::new("b")),
            ]
        );
    }
}
