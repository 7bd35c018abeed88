use crate::engine::Engine;
use crate::error::Result;
use crate::table::helpers::expressions;
use crate::table::types::{Item, OutputItems, PrimaryKey, PutCondition, Query};

impl Engine {
    /// Insert or replace an item
    ///
    /// The item's key attributes locate it; with a `condition` the write only
    /// happens if the precondition holds. Every secondary index is updated in
    /// the same step, so once this returns all queries see the new item.
    ///
    /// Returns the item that was replaced, if any.
    ///
    /// # Errors
    ///
    /// * `NotFound` - the table does not exist
    /// * `InvalidItem` - a key attribute (base or index) is missing or mistyped
    /// * `ConditionFailed` - the precondition failed; the stored item is unchanged
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_engine::{Engine, Item, KeyAttribute, PutCondition, TableSchema};
    ///
    /// # async fn example() -> Result<(), dynamo_engine::Error> {
    /// let engine = Engine::new();
    /// engine
    ///     .create_table(TableSchema::new("Users", KeyAttribute::string("Username")))
    ///     .await?;
    ///
    /// let user = Item::new().with_string("Username", "alexdebrie");
    /// engine
    ///     .put_item("Users", user, Some(PutCondition::NotExists))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn put_item(
        &self,
        table_name: &str,
        item: Item,
        condition: Option<PutCondition>,
    ) -> Result<Option<Item>> {
        let table = self.table(table_name).await?;
        let mut table = table.write().await;

        let prepared = table.prepare_put(item)?;
        let key = prepared.key().clone();
        let replaced = table.put(prepared, condition)?;

        tracing::debug!(
            table = %table_name,
            %key,
            replaced = replaced.is_some(),
            "Item put"
        );

        Ok(replaced)
    }

    /// Get an item by its primary key
    ///
    /// A missing item is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// * `NotFound` - the table does not exist
    /// * `InvalidKey` - the key does not match the table's key schema
    pub async fn get_item(&self, table_name: &str, key: &PrimaryKey) -> Result<Option<Item>> {
        let table = self.table(table_name).await?;
        let table = table.read().await;

        table.check_key(key)?;
        Ok(table.get(key).cloned())
    }

    /// Delete an item by its primary key, returning it
    ///
    /// Deleting a missing item is not an error.
    pub async fn delete_item(&self, table_name: &str, key: &PrimaryKey) -> Result<Option<Item>> {
        let table = self.table(table_name).await?;
        let mut table = table.write().await;

        table.check_key(key)?;
        let removed = table.delete(key);

        tracing::debug!(table = %table_name, %key, found = removed.is_some(), "Item deleted");

        Ok(removed)
    }

    /// Query one partition of the table or of a secondary index
    ///
    /// Results are ascending by sort key unless [`Query::reverse`] was set.
    /// Index queries are ordered by the index sort key, ties broken by the
    /// base primary key, and return attributes per the index projection. No
    /// match is an empty result.
    ///
    /// # Errors
    ///
    /// * `NotFound` - the table or index does not exist
    /// * `InvalidCondition` - the partition value or sort condition does not
    ///   fit the queried key schema
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_engine::{Engine, Query, SortKeyCondition};
    ///
    /// # async fn example(engine: Engine) -> Result<(), dynamo_engine::Error> {
    /// let dramas = engine
    ///     .query(
    ///         "MovieRoles",
    ///         &Query::new("Drama")
    ///             .index("GenreYearIndex")
    ///             .sort_key(SortKeyCondition::Between(1990.into(), 2000.into())),
    ///     )
    ///     .await?;
    ///
    /// println!("Found {} roles", dramas.count);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query(&self, table_name: &str, query: &Query) -> Result<OutputItems> {
        let table = self.table(table_name).await?;
        let table = table.read().await;
        let condition = query.condition.as_ref();

        let mut items = match query.index_name() {
            Some(index_name) => {
                let index = table.index(index_name)?;
                let definition = index.definition();
                expressions::validate(
                    &query.partition_key,
                    condition,
                    &definition.partition_key,
                    definition.sort_key.as_ref(),
                )?;

                table.query_index(index, &query.partition_key, condition)
            }
            None => {
                let schema = table.schema();
                expressions::validate(
                    &query.partition_key,
                    condition,
                    &schema.partition_key,
                    schema.sort_key.as_ref(),
                )?;

                table
                    .query_partition(&query.partition_key, condition)
                    .into_iter()
                    .cloned()
                    .collect()
            }
        };

        if !query.scan_index_forward {
            items.reverse();
        }
        if let Some(limit) = query.limit {
            items.truncate(limit);
        }

        tracing::debug!(
            table = %table_name,
            index = query.index_name().unwrap_or("-"),
            partition = %query.partition_key,
            count = items.len(),
            "Query"
        );

        Ok(items.into())
    }

    /// Every item of the table in (partition, sort) order
    ///
    /// Stops after `limit` items when given.
    pub async fn scan(&self, table_name: &str, limit: Option<usize>) -> Result<OutputItems> {
        let table = self.table(table_name).await?;
        let table = table.read().await;

        let items: Vec<Item> = table
            .scan()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(items.into())
    }
}
