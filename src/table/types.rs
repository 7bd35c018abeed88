use rust_decimal::Decimal;
use serde_dynamo::AttributeValue;
use std::collections::{BTreeMap, HashMap, btree_map};
use std::fmt;

/// Scalar type a key attribute must carry (DynamoDB `S`, `N` and `B`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyType {
    /// String (`S`)
    String,
    /// Number (`N`)
    Number,
    /// Binary (`B`)
    Binary,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::String => f.write_str("S"),
            KeyType::Number => f.write_str("N"),
            KeyType::Binary => f.write_str("B"),
        }
    }
}

/// An exact decimal number usable as a key
///
/// Ordered and compared by value, so `"2000"` and `"2000.0"` address the
/// same key while `"9007199254740992"` and `"9007199254740993"` stay apart.
/// Stored normalized: no trailing zeros, `-0` is `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Number(Decimal);

impl Number {
    /// Exact number from a decimal
    pub fn new(value: Decimal) -> Self {
        Number(value.normalize())
    }

    /// Closest number to `value`; `None` for NaN, infinities and values out
    /// of range
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::try_from(value).ok().map(Number::new)
    }

    /// Parse a DynamoDB number string, plain (`"-12.50"`) or scientific
    /// (`"1.5E3"`)
    ///
    /// Returns `None` when the string is not a number or cannot be held
    /// without rounding.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let parsed = if value.contains(['e', 'E']) {
            Decimal::from_scientific(value)
        } else {
            Decimal::from_str_exact(value)
        };
        parsed.ok().map(Number::new)
    }

    /// The exact value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::new(Decimal::from(value))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed key value
///
/// Strings order by their UTF-8 bytes, numbers numerically, binaries bytewise.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyValue {
    /// String key
    S(String),
    /// Number key
    N(Number),
    /// Binary key
    B(Vec<u8>),
}

impl KeyValue {
    /// Build a number key from a float, `None` if `value` is not finite
    pub fn number(value: f64) -> Option<Self> {
        Number::from_f64(value).map(KeyValue::N)
    }

    /// The key type this value carries
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyValue::S(_) => KeyType::String,
            KeyValue::N(_) => KeyType::Number,
            KeyValue::B(_) => KeyType::Binary,
        }
    }

    /// Read a key value of type `key_type` out of an attribute value
    ///
    /// Returns `None` when the attribute holds another type or an unparseable
    /// number.
    pub fn from_attribute(value: &AttributeValue, key_type: KeyType) -> Option<Self> {
        match (value, key_type) {
            (AttributeValue::S(s), KeyType::String) => Some(KeyValue::S(s.clone())),
            (AttributeValue::N(n), KeyType::Number) => Number::parse(n).map(KeyValue::N),
            (AttributeValue::B(b), KeyType::Binary) => Some(KeyValue::B(b.clone())),
            _ => None,
        }
    }

    /// Convert back to an attribute value
    pub fn to_attribute(&self) -> AttributeValue {
        match self {
            KeyValue::S(s) => AttributeValue::S(s.clone()),
            KeyValue::N(n) => AttributeValue::N(n.to_string()),
            KeyValue::B(b) => AttributeValue::B(b.clone()),
        }
    }

    /// `begins_with` semantics; numbers never match
    pub fn begins_with(&self, prefix: &KeyValue) -> bool {
        match (self, prefix) {
            (KeyValue::S(s), KeyValue::S(p)) => s.starts_with(p.as_str()),
            (KeyValue::B(b), KeyValue::B(p)) => b.starts_with(p),
            _ => false,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::S(s) => write!(f, "{s}"),
            KeyValue::N(n) => write!(f, "{n}"),
            KeyValue::B(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::S(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::S(value)
    }
}

impl From<&String> for KeyValue {
    fn from(value: &String) -> Self {
        KeyValue::S(value.clone())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::N(Number::from(value))
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(value: Vec<u8>) -> Self {
        KeyValue::B(value)
    }
}

/// Partition key value
pub type PartitionKey = KeyValue;

/// Sort key value, absent for tables without a sort key
pub type SortKey = Option<KeyValue>;

/// Composite key tuple, convertible into a [`PrimaryKey`]
pub type CompositeKey = (PartitionKey, SortKey);

/// The primary key of an item: partition value plus optional sort value
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrimaryKey {
    /// Partition key value
    pub partition: PartitionKey,
    /// Sort key value, required when the table defines a sort key
    pub sort: SortKey,
}

impl PrimaryKey {
    /// Key for a table without a sort key
    pub fn new(partition: impl Into<KeyValue>) -> Self {
        Self {
            partition: partition.into(),
            sort: None,
        }
    }

    /// Attach a sort key value
    pub fn with_sort(mut self, sort: impl Into<KeyValue>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

impl From<CompositeKey> for PrimaryKey {
    fn from((partition, sort): CompositeKey) -> Self {
        Self { partition, sort }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort {
            Some(sort) => write!(f, "({}, {})", self.partition, sort),
            None => write!(f, "({})", self.partition),
        }
    }
}

/// An item: attribute names mapped to values, ordered by name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Item(BTreeMap<String, AttributeValue>);

impl Item {
    /// Empty item
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        let _ = self.0.insert(name.into(), value);
        self
    }

    /// Set a string attribute
    pub fn with_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, AttributeValue::S(value.into()))
    }

    /// Set a number attribute
    pub fn with_number(self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.with(name, AttributeValue::N(value.to_string()))
    }

    /// Set an attribute from a key value, keeping its key type
    pub fn with_key(self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.with(name, value.into().to_attribute())
    }

    /// Insert an attribute, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        self.0.insert(name.into(), value)
    }

    /// Remove an attribute
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.0.remove(name)
    }

    /// Look up an attribute
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    /// Whether the attribute is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// String attribute, if present and a string
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(AttributeValue::S(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Number attribute parsed as `f64`, if present and a number
    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(AttributeValue::N(n)) => n.parse().ok(),
            _ => None,
        }
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the item has no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate attributes in name order
    pub fn iter(&self) -> btree_map::Iter<'_, String, AttributeValue> {
        self.0.iter()
    }

    /// Copy of this item restricted to `names`
    pub(crate) fn project<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Item {
        names
            .into_iter()
            .filter_map(|name| self.0.get(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }
}

impl FromIterator<(String, AttributeValue)> for Item {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Item(iter.into_iter().collect())
    }
}

impl IntoIterator for Item {
    type Item = (String, AttributeValue);
    type IntoIter = btree_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<BTreeMap<String, AttributeValue>> for Item {
    fn from(map: BTreeMap<String, AttributeValue>) -> Self {
        Item(map)
    }
}

impl From<serde_dynamo::Item> for Item {
    fn from(item: serde_dynamo::Item) -> Self {
        HashMap::<String, AttributeValue>::from(item)
            .into_iter()
            .collect()
    }
}

impl From<Item> for serde_dynamo::Item {
    fn from(item: Item) -> Self {
        let map: HashMap<String, AttributeValue> = item.0.into_iter().collect();
        serde_dynamo::Item::from(map)
    }
}

/// Precondition checked before a put is applied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutCondition {
    /// Fail if an item already exists at the key (`attribute_not_exists(pk)`)
    NotExists,
    /// Fail unless an item already exists at the key (`attribute_exists(pk)`)
    Exists,
}

/// Comparison applied to the sort key of a query
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortKeyCondition {
    /// `sk = value`
    Eq(KeyValue),
    /// `sk < value`
    Lt(KeyValue),
    /// `sk <= value`
    Le(KeyValue),
    /// `sk > value`
    Gt(KeyValue),
    /// `sk >= value`
    Ge(KeyValue),
    /// `sk BETWEEN low AND high`, both ends inclusive
    Between(KeyValue, KeyValue),
    /// `begins_with(sk, prefix)`, strings and binaries only
    BeginsWith(KeyValue),
}

/// A query against a table or one of its secondary indexes
///
/// ```
/// use dynamo_engine::{Query, SortKeyCondition};
///
/// let query = Query::new("Drama")
///     .index("GenreYearIndex")
///     .sort_key(SortKeyCondition::Ge(2000.into()))
///     .reverse()
///     .limit(10);
/// assert_eq!(query.index_name(), Some("GenreYearIndex"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub(crate) partition_key: KeyValue,
    pub(crate) condition: Option<SortKeyCondition>,
    pub(crate) index_name: Option<String>,
    pub(crate) scan_index_forward: bool,
    pub(crate) limit: Option<usize>,
}

impl Query {
    /// Query every item in one partition, ascending
    pub fn new(partition_key: impl Into<KeyValue>) -> Self {
        Self {
            partition_key: partition_key.into(),
            condition: None,
            index_name: None,
            scan_index_forward: true,
            limit: None,
        }
    }

    /// Restrict results with a sort key condition
    pub fn sort_key(mut self, condition: SortKeyCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Query a secondary index instead of the base table
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Return results in descending sort key order
    pub fn reverse(mut self) -> Self {
        self.scan_index_forward = false;
        self
    }

    /// Return at most `limit` items
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The index this query targets, if any
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }
}

/// Query or scan output
#[must_use = "query results should be used or you'll lose the fetched data"]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputItems {
    /// Matching items in result order
    pub items: Vec<Item>,
    /// Count of items returned
    pub count: usize,
}

impl From<Vec<Item>> for OutputItems {
    fn from(items: Vec<Item>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}
