use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::table::helpers::{expressions, validation};
use crate::table::schema::IndexDefinition;
use crate::table::types::{Item, KeyValue, PrimaryKey, SortKeyCondition};

/// Where an item sits inside a secondary index
pub(crate) type IndexKey = (KeyValue, Option<KeyValue>);

/// A secondary index: a derived view keyed by the index key schema
///
/// Entries point at base items by primary key. Items missing an index key
/// attribute have no entry.
#[derive(Debug)]
pub(crate) struct SecondaryIndex {
    definition: IndexDefinition,
    partitions: BTreeMap<KeyValue, BTreeMap<Option<KeyValue>, BTreeSet<PrimaryKey>>>,
}

impl SecondaryIndex {
    pub(crate) fn new(definition: IndexDefinition) -> Self {
        Self {
            definition,
            partitions: BTreeMap::new(),
        }
    }

    pub(crate) fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// Index position of `item`, `None` if the item is not part of the index
    ///
    /// Present key attributes of the wrong type are an error.
    pub(crate) fn entry_key(&self, item: &Item) -> Result<Option<IndexKey>> {
        let partition = validation::optional_key(item, &self.definition.partition_key)?;
        let sort = match &self.definition.sort_key {
            Some(attribute) => match validation::optional_key(item, attribute)? {
                Some(value) => Some(value),
                None => return Ok(None),
            },
            None => None,
        };

        Ok(partition.map(|partition| (partition, sort)))
    }

    pub(crate) fn insert(&mut self, (partition, sort): IndexKey, key: PrimaryKey) {
        let _ = self
            .partitions
            .entry(partition)
            .or_default()
            .entry(sort)
            .or_default()
            .insert(key);
    }

    pub(crate) fn remove(&mut self, (partition, sort): &IndexKey, key: &PrimaryKey) {
        let Some(bucket) = self.partitions.get_mut(partition) else {
            return;
        };

        if let Some(keys) = bucket.get_mut(sort) {
            let _ = keys.remove(key);
            if keys.is_empty() {
                let _ = bucket.remove(sort);
            }
        }

        if bucket.is_empty() {
            let _ = self.partitions.remove(partition);
        }
    }

    /// Base keys in index partition `partition` matching `condition`, ascending
    /// by index sort key then by base primary key
    pub(crate) fn lookup(
        &self,
        partition: &KeyValue,
        condition: Option<&SortKeyCondition>,
    ) -> Vec<&PrimaryKey> {
        let Some(bucket) = self.partitions.get(partition) else {
            return Vec::new();
        };

        bucket
            .range(expressions::sort_range(condition))
            .filter(|(sort, _)| expressions::matches(condition, sort.as_ref()))
            .flat_map(|(_, keys)| keys.iter())
            .collect()
    }

    /// Number of index entries
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.partitions
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum()
    }
}
