/// Retry configuration for batch operations
pub(crate) mod retry_config {
    use std::time::Duration;

    /// Calculate retry delay with exponential backoff
    ///
    /// # Arguments
    /// * `attempt` - The retry attempt number (0-based)
    /// * `initial` - Initial delay duration
    /// * `max` - Maximum delay duration
    ///
    /// # Returns
    /// Duration to wait before retrying
    pub(crate) fn retry_delay(attempt: usize, initial: Duration, max: Duration) -> Duration {
        let factor = 2u64.saturating_pow(attempt.min(32) as u32);
        let delay_ms = (initial.as_millis() as u64).saturating_mul(factor);
        let capped_delay = delay_ms.min(max.as_millis() as u64);
        Duration::from_millis(capped_delay)
    }
}

/// Key extraction and validation against a table's key schema
///
/// Items are checked before anything is mutated so that a rejected write
/// leaves the table untouched.
pub(crate) mod validation {
    use crate::error::{Error, Result};
    use crate::table::schema::KeyAttribute;
    use crate::table::types::{Item, KeyValue, PrimaryKey};

    /// Read a required key attribute from an item
    pub(crate) fn required_key(item: &Item, attribute: &KeyAttribute) -> Result<KeyValue> {
        let value = item.get(&attribute.name).ok_or_else(|| {
            Error::InvalidItem(format!("missing key attribute {}", attribute.name))
        })?;

        KeyValue::from_attribute(value, attribute.key_type).ok_or_else(|| {
            Error::InvalidItem(format!(
                "key attribute {} must be of type {}",
                attribute.name, attribute.key_type
            ))
        })
    }

    /// Read an optional key attribute; absence is `Ok(None)` (sparse index)
    pub(crate) fn optional_key(item: &Item, attribute: &KeyAttribute) -> Result<Option<KeyValue>> {
        if item.contains(&attribute.name) {
            required_key(item, attribute).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Extract the primary key of `item` for the given key schema
    pub(crate) fn primary_key(
        item: &Item,
        partition_key: &KeyAttribute,
        sort_key: Option<&KeyAttribute>,
    ) -> Result<PrimaryKey> {
        let partition = required_key(item, partition_key)?;
        let sort = sort_key
            .map(|attribute| required_key(item, attribute))
            .transpose()?;

        Ok(PrimaryKey { partition, sort })
    }

    /// Check a caller-supplied key has the shape and types of the key schema
    pub(crate) fn check_key(
        key: &PrimaryKey,
        partition_key: &KeyAttribute,
        sort_key: Option<&KeyAttribute>,
    ) -> Result<()> {
        if key.partition.key_type() != partition_key.key_type {
            return Err(Error::InvalidKey(format!(
                "partition key {} must be of type {}",
                partition_key.name, partition_key.key_type
            )));
        }

        match (sort_key, &key.sort) {
            (Some(attribute), Some(value)) if value.key_type() != attribute.key_type => {
                Err(Error::InvalidKey(format!(
                    "sort key {} must be of type {}",
                    attribute.name, attribute.key_type
                )))
            }
            (Some(attribute), None) => Err(Error::InvalidKey(format!(
                "missing sort key {}",
                attribute.name
            ))),
            (None, Some(_)) => Err(Error::InvalidKey(
                "table has no sort key but one was given".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Key condition evaluation for queries
pub(crate) mod expressions {
    use std::ops::Bound;

    use crate::error::{Error, Result};
    use crate::table::schema::KeyAttribute;
    use crate::table::types::{KeyType, KeyValue, SortKeyCondition};

    /// Bounds over a sort-key-ordered map (`None` is the slot of tables without a sort key)
    pub(crate) type SortRange = (Bound<Option<KeyValue>>, Bound<Option<KeyValue>>);

    /// Check a query's partition value and sort condition against a key schema
    pub(crate) fn validate(
        partition_value: &KeyValue,
        condition: Option<&SortKeyCondition>,
        partition_key: &KeyAttribute,
        sort_key: Option<&KeyAttribute>,
    ) -> Result<()> {
        if partition_value.key_type() != partition_key.key_type {
            return Err(Error::InvalidCondition(format!(
                "partition key {} must be of type {}",
                partition_key.name, partition_key.key_type
            )));
        }

        let Some(condition) = condition else {
            return Ok(());
        };

        let Some(sort_key) = sort_key else {
            return Err(Error::InvalidCondition(
                "sort key condition given but the key schema has no sort key".into(),
            ));
        };

        for value in operands(condition) {
            if value.key_type() != sort_key.key_type {
                return Err(Error::InvalidCondition(format!(
                    "sort key {} must be compared with a value of type {}",
                    sort_key.name, sort_key.key_type
                )));
            }
        }

        match condition {
            SortKeyCondition::BeginsWith(_) if sort_key.key_type == KeyType::Number => {
                Err(Error::InvalidCondition(format!(
                    "begins_with is not supported on number sort key {}",
                    sort_key.name
                )))
            }
            SortKeyCondition::Between(low, high) if low > high => {
                Err(Error::InvalidCondition(format!(
                    "between bounds are reversed: {low} > {high}"
                )))
            }
            _ => Ok(()),
        }
    }

    fn operands(condition: &SortKeyCondition) -> Vec<&KeyValue> {
        match condition {
            SortKeyCondition::Eq(v)
            | SortKeyCondition::Lt(v)
            | SortKeyCondition::Le(v)
            | SortKeyCondition::Gt(v)
            | SortKeyCondition::Ge(v)
            | SortKeyCondition::BeginsWith(v) => vec![v],
            SortKeyCondition::Between(low, high) => vec![low, high],
        }
    }

    /// Smallest sort key range containing every match of `condition`
    ///
    /// The condition must have passed [`validate`]; `begins_with` still needs
    /// [`matches`] on each candidate.
    pub(crate) fn sort_range(condition: Option<&SortKeyCondition>) -> SortRange {
        let some = |v: &KeyValue| Some(v.clone());
        match condition {
            None => (Bound::Unbounded, Bound::Unbounded),
            Some(SortKeyCondition::Eq(v)) => (Bound::Included(some(v)), Bound::Included(some(v))),
            Some(SortKeyCondition::Lt(v)) => (Bound::Unbounded, Bound::Excluded(some(v))),
            Some(SortKeyCondition::Le(v)) => (Bound::Unbounded, Bound::Included(some(v))),
            Some(SortKeyCondition::Gt(v)) => (Bound::Excluded(some(v)), Bound::Unbounded),
            Some(SortKeyCondition::Ge(v)) => (Bound::Included(some(v)), Bound::Unbounded),
            Some(SortKeyCondition::Between(low, high)) => {
                (Bound::Included(some(low)), Bound::Included(some(high)))
            }
            Some(SortKeyCondition::BeginsWith(prefix)) => {
                (Bound::Included(some(prefix)), Bound::Unbounded)
            }
        }
    }

    /// Whether a stored sort key satisfies `condition`
    pub(crate) fn matches(condition: Option<&SortKeyCondition>, sort: Option<&KeyValue>) -> bool {
        let (Some(condition), Some(sort)) = (condition, sort) else {
            return condition.is_none();
        };

        match condition {
            SortKeyCondition::Eq(v) => sort == v,
            SortKeyCondition::Lt(v) => sort < v,
            SortKeyCondition::Le(v) => sort <= v,
            SortKeyCondition::Gt(v) => sort > v,
            SortKeyCondition::Ge(v) => sort >= v,
            SortKeyCondition::Between(low, high) => low <= sort && sort <= high,
            SortKeyCondition::BeginsWith(prefix) => sort.begins_with(prefix),
        }
    }
}
