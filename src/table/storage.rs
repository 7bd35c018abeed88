use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::table::gsi::{IndexKey, SecondaryIndex};
use crate::table::helpers::{expressions, validation};
use crate::table::schema::{TableDescription, TableSchema};
use crate::table::types::{Item, KeyValue, PrimaryKey, PutCondition, SortKeyCondition};

/// Items of one partition ordered by sort key (a single `None` slot without one)
type Partition = BTreeMap<Option<KeyValue>, Item>;

/// A put that passed validation, with every key it touches precomputed
#[derive(Debug)]
pub(crate) struct PreparedPut {
    key: PrimaryKey,
    item: Item,
    index_keys: Vec<Option<IndexKey>>,
}

impl PreparedPut {
    pub(crate) fn key(&self) -> &PrimaryKey {
        &self.key
    }
}

/// In-memory state of one table
///
/// Not synchronized; the engine wraps each table in its own lock and every
/// mutation below runs to completion once validation has passed.
#[derive(Debug)]
pub(crate) struct Table {
    schema: TableSchema,
    partitions: BTreeMap<KeyValue, Partition>,
    indexes: Vec<SecondaryIndex>,
    item_count: usize,
}

impl Table {
    pub(crate) fn new(schema: TableSchema) -> Self {
        let indexes = schema
            .indexes
            .iter()
            .cloned()
            .map(SecondaryIndex::new)
            .collect();

        Self {
            schema,
            partitions: BTreeMap::new(),
            indexes,
            item_count: 0,
        }
    }

    pub(crate) fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub(crate) fn describe(&self) -> TableDescription {
        TableDescription {
            schema: self.schema.clone(),
            item_count: self.item_count,
        }
    }

    pub(crate) fn index(&self, name: &str) -> Result<&SecondaryIndex> {
        self.indexes
            .iter()
            .find(|index| index.definition().name == name)
            .ok_or_else(|| Error::index_not_found(name))
    }

    pub(crate) fn check_key(&self, key: &PrimaryKey) -> Result<()> {
        validation::check_key(
            key,
            &self.schema.partition_key,
            self.schema.sort_key.as_ref(),
        )
    }

    /// Validate `item` and compute its base and index keys
    pub(crate) fn prepare_put(&self, item: Item) -> Result<PreparedPut> {
        let key = validation::primary_key(
            &item,
            &self.schema.partition_key,
            self.schema.sort_key.as_ref(),
        )?;

        let index_keys = self
            .indexes
            .iter()
            .map(|index| index.entry_key(&item))
            .collect::<Result<Vec<_>>>()?;

        Ok(PreparedPut {
            key,
            item,
            index_keys,
        })
    }

    pub(crate) fn get(&self, key: &PrimaryKey) -> Option<&Item> {
        self.partitions.get(&key.partition)?.get(&key.sort)
    }

    /// Check `condition` then store the item, returning the replaced one
    pub(crate) fn put(
        &mut self,
        prepared: PreparedPut,
        condition: Option<PutCondition>,
    ) -> Result<Option<Item>> {
        let exists = self.get(&prepared.key).is_some();
        match condition {
            Some(PutCondition::NotExists) if exists => return Err(Error::ConditionFailed),
            Some(PutCondition::Exists) if !exists => return Err(Error::ConditionFailed),
            _ => {}
        }

        Ok(self.apply_put(prepared))
    }

    /// Store a validated item and move its index entries in the same step
    pub(crate) fn apply_put(&mut self, prepared: PreparedPut) -> Option<Item> {
        let PreparedPut {
            key,
            item,
            index_keys,
        } = prepared;

        let old = self.remove_index_entries(&key);

        for (index, entry) in self.indexes.iter_mut().zip(index_keys) {
            if let Some(entry) = entry {
                index.insert(entry, key.clone());
            }
        }

        let replaced = self
            .partitions
            .entry(key.partition)
            .or_default()
            .insert(key.sort, item);

        debug_assert_eq!(old.is_some(), replaced.is_some());
        if replaced.is_none() {
            self.item_count += 1;
        }

        replaced
    }

    /// Remove an item and its index entries, returning it
    pub(crate) fn delete(&mut self, key: &PrimaryKey) -> Option<Item> {
        self.remove_index_entries(key)?;

        let partition = self.partitions.get_mut(&key.partition)?;
        let removed = partition.remove(&key.sort);
        if partition.is_empty() {
            let _ = self.partitions.remove(&key.partition);
        }

        if removed.is_some() {
            self.item_count -= 1;
        }
        removed
    }

    /// Drop the index entries of the item currently stored at `key`, if any
    fn remove_index_entries(&mut self, key: &PrimaryKey) -> Option<()> {
        let current = self.partitions.get(&key.partition)?.get(&key.sort)?;

        for index in &mut self.indexes {
            // Stored items always passed validation
            if let Ok(Some(entry)) = index.entry_key(current) {
                index.remove(&entry, key);
            }
        }

        Some(())
    }

    /// Items of base partition `partition` matching `condition`, ascending
    pub(crate) fn query_partition(
        &self,
        partition: &KeyValue,
        condition: Option<&SortKeyCondition>,
    ) -> Vec<&Item> {
        let Some(items) = self.partitions.get(partition) else {
            return Vec::new();
        };

        items
            .range(expressions::sort_range(condition))
            .filter(|(sort, _)| expressions::matches(condition, sort.as_ref()))
            .map(|(_, item)| item)
            .collect()
    }

    /// Items of index partition `partition` matching `condition`, projected
    pub(crate) fn query_index(
        &self,
        index: &SecondaryIndex,
        partition: &KeyValue,
        condition: Option<&SortKeyCondition>,
    ) -> Vec<Item> {
        let definition = index.definition();
        let mut key_names = self.schema.primary_key_names();
        key_names.push(definition.partition_key.name.as_str());
        if let Some(sort_key) = &definition.sort_key {
            key_names.push(sort_key.name.as_str());
        }

        index
            .lookup(partition, condition)
            .into_iter()
            .filter_map(|key| self.get(key))
            .map(|item| definition.projection.apply(item, &key_names))
            .collect()
    }

    /// Every item in (partition, sort) order
    pub(crate) fn scan(&self) -> impl Iterator<Item = &Item> {
        self.partitions.values().flat_map(BTreeMap::values)
    }
}
