use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::Result;
use crate::methods::TableModelMethods;
use crate::retry::{RetryConfig, WriteAllOutput, write_all};
use crate::table::{
    IndexDefinition, Item, KeyAttribute, KeyType, KeyValue, PrimaryKey, PutCondition, Query,
    TableSchema,
};

/// Typed batch get output
#[must_use = "batch get results should be used or you'll lose the fetched data"]
#[derive(Debug)]
pub struct BatchReadOutput<T> {
    /// Items found, in requested key order
    pub items: Vec<T>,
    /// Requested keys with no stored item
    pub missing_keys: Vec<PrimaryKey>,
}

/// A serde type stored in one table
///
/// The key constants describe the table; [`TableModel::schema`] builds the
/// matching [`TableSchema`] and the provided methods convert through
/// `serde_dynamo` so callers only see their own type.
///
/// # Example
///
/// ```rust
/// use dynamo_engine::{KeyValue, TableModel};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct User {
///     #[serde(rename = "Username")]
///     username: String,
///     #[serde(rename = "Name")]
///     name: String,
/// }
///
/// impl TableModel for User {
///     const TABLE: &'static str = "Users";
///     const PARTITION_KEY: &'static str = "Username";
///
///     fn partition_key(&self) -> KeyValue {
///         self.username.as_str().into()
///     }
/// }
///
/// assert_eq!(User::schema().name, "Users");
/// ```
pub trait TableModel: Serialize + DeserializeOwned + Send + Sync {
    /// Name of the table
    const TABLE: &'static str;

    /// Partition key attribute
    const PARTITION_KEY: &'static str;

    /// Partition key type
    const PARTITION_KEY_TYPE: KeyType = KeyType::String;

    /// Sort key attribute, if the table has one
    const SORT_KEY: Option<&'static str> = None;

    /// Sort key type
    const SORT_KEY_TYPE: KeyType = KeyType::String;

    /// Retries used by [`TableModel::batch_write`]
    const BATCH_RETRIES_CONFIG: RetryConfig = RetryConfig {
        max_retries: 5,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(2000),
        concurrency: 10,
    };

    /// Partition key value of this item
    fn partition_key(&self) -> KeyValue;

    /// Sort key value of this item
    fn sort_key(&self) -> Option<KeyValue> {
        None
    }

    /// Primary key of this item
    fn primary_key(&self) -> PrimaryKey {
        PrimaryKey {
            partition: self.partition_key(),
            sort: self.sort_key(),
        }
    }

    /// Schema of the table holding this model
    fn schema() -> TableSchema {
        let schema = TableSchema::new(
            Self::TABLE,
            KeyAttribute::new(Self::PARTITION_KEY, Self::PARTITION_KEY_TYPE),
        );
        match Self::SORT_KEY {
            Some(sort_key) => schema.with_sort_key(KeyAttribute::new(sort_key, Self::SORT_KEY_TYPE)),
            None => schema,
        }
    }

    /// Serialize into an item
    fn to_item(&self) -> Result<Item> {
        Ok(serde_dynamo::to_item(self)?)
    }

    /// Deserialize from an item
    fn from_item(item: Item) -> Result<Self> {
        Ok(serde_dynamo::from_item(item)?)
    }

    /// Insert or replace, returning the replaced value
    fn put(&self, engine: &Engine) -> impl Future<Output = Result<Option<Self>>> {
        put_item(engine, self, None)
    }

    /// Insert only if nothing is stored at this key yet
    ///
    /// Fails with `ConditionFailed` otherwise.
    fn put_new(&self, engine: &Engine) -> impl Future<Output = Result<()>> {
        async move {
            let _ = put_item(engine, self, Some(PutCondition::NotExists)).await?;
            Ok(())
        }
    }

    /// Get by key
    fn get(
        engine: &Engine,
        partition_key: impl Into<KeyValue>,
        sort_key: Option<KeyValue>,
    ) -> impl Future<Output = Result<Option<Self>>> {
        get_item::<Self>(
            engine,
            PrimaryKey {
                partition: partition_key.into(),
                sort: sort_key,
            },
        )
    }

    /// Delete by key, returning the removed value
    fn delete(
        engine: &Engine,
        partition_key: impl Into<KeyValue>,
        sort_key: Option<KeyValue>,
    ) -> impl Future<Output = Result<Option<Self>>> {
        delete_item::<Self>(
            engine,
            PrimaryKey {
                partition: partition_key.into(),
                sort: sort_key,
            },
        )
    }

    /// Query the base table
    fn query(engine: &Engine, query: Query) -> impl Future<Output = Result<Vec<Self>>> {
        query_items::<Self>(engine, query)
    }

    /// Get several values by key, reporting keys with nothing stored
    fn batch_get(
        engine: &Engine,
        keys: Vec<PrimaryKey>,
    ) -> impl Future<Output = Result<BatchReadOutput<Self>>> {
        batch_get::<Self>(engine, keys)
    }

    /// Write and delete several values, retrying unprocessed requests
    fn batch_write(
        engine: &Engine,
        puts: Vec<Self>,
        deletes: Vec<PrimaryKey>,
    ) -> impl Future<Output = Result<WriteAllOutput>> {
        batch_write::<Self>(engine, puts, deletes)
    }
}

/// A [`TableModel`] whose table carries one secondary index
pub trait IndexedModel: TableModel {
    /// Index partition key attribute
    const INDEX_PARTITION_KEY: &'static str;

    /// Index partition key type
    const INDEX_PARTITION_KEY_TYPE: KeyType = KeyType::String;

    /// Index sort key attribute
    const INDEX_SORT_KEY: Option<&'static str> = None;

    /// Index sort key type
    const INDEX_SORT_KEY_TYPE: KeyType = KeyType::String;

    /// Index name derived from the table and index key names
    fn index_name() -> String {
        match Self::INDEX_SORT_KEY {
            Some(sort_key) => format!(
                "global-{}-{}-{}",
                Self::TABLE,
                Self::INDEX_PARTITION_KEY,
                sort_key
            ),
            None => format!("global-{}-{}", Self::TABLE, Self::INDEX_PARTITION_KEY),
        }
    }

    /// Definition of the index, projecting every attribute
    fn index_definition() -> IndexDefinition {
        let index = IndexDefinition::new(
            Self::index_name(),
            KeyAttribute::new(Self::INDEX_PARTITION_KEY, Self::INDEX_PARTITION_KEY_TYPE),
        );
        match Self::INDEX_SORT_KEY {
            Some(sort_key) => {
                index.with_sort_key(KeyAttribute::new(sort_key, Self::INDEX_SORT_KEY_TYPE))
            }
            None => index,
        }
    }

    /// Query the index; any index set on `query` is replaced
    fn query_index(engine: &Engine, query: Query) -> impl Future<Output = Result<Vec<Self>>> {
        query_items::<Self>(engine, query.index(Self::index_name()))
    }
}

async fn put_item<T>(engine: &Engine, value: &T, condition: Option<PutCondition>) -> Result<Option<T>>
where
    T: TableModel,
{
    let item = value.to_item()?;
    engine
        .put_item(T::TABLE, item, condition)
        .await?
        .map(T::from_item)
        .transpose()
}

async fn get_item<T>(engine: &Engine, key: PrimaryKey) -> Result<Option<T>>
where
    T: TableModel,
{
    engine
        .get_item(T::TABLE, &key)
        .await?
        .map(T::from_item)
        .transpose()
}

async fn delete_item<T>(engine: &Engine, key: PrimaryKey) -> Result<Option<T>>
where
    T: TableModel,
{
    engine
        .delete_item(T::TABLE, &key)
        .await?
        .map(T::from_item)
        .transpose()
}

async fn query_items<T>(engine: &Engine, query: Query) -> Result<Vec<T>>
where
    T: TableModel,
{
    engine
        .query(T::TABLE, &query)
        .await?
        .items
        .into_iter()
        .map(T::from_item)
        .collect()
}

async fn batch_get<T>(engine: &Engine, keys: Vec<PrimaryKey>) -> Result<BatchReadOutput<T>>
where
    T: TableModel,
{
    let mut output = engine.batch_get_item(T::TABLE, keys.clone()).await?;

    let mut items = Vec::with_capacity(output.len());
    for key in &keys {
        if let Some(item) = output.items.remove(key) {
            items.push(T::from_item(item)?);
        }
    }

    let missing_keys = T::right_diff(&items, keys);
    Ok(BatchReadOutput {
        items,
        missing_keys,
    })
}

async fn batch_write<T>(
    engine: &Engine,
    puts: Vec<T>,
    deletes: Vec<PrimaryKey>,
) -> Result<WriteAllOutput>
where
    T: TableModel,
{
    let puts = puts
        .iter()
        .map(TableModel::to_item)
        .collect::<Result<Vec<_>>>()?;

    write_all(engine, T::TABLE, puts, deletes, &T::BATCH_RETRIES_CONFIG).await
}
