use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::table::types::{Item, KeyType};

/// A key attribute: name plus the scalar type it must hold
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyAttribute {
    /// Attribute name
    pub name: String,
    /// Required value type
    pub key_type: KeyType,
}

impl KeyAttribute {
    /// Key attribute of any type
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }

    /// String (`S`) key attribute
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::String)
    }

    /// Number (`N`) key attribute
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::Number)
    }

    /// Binary (`B`) key attribute
    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::Binary)
    }
}

/// Which base item attributes a secondary index returns
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    /// Every attribute of the base item
    #[default]
    All,
    /// Only the base table and index key attributes
    KeysOnly,
    /// Key attributes plus the listed non-key attributes
    Include(Vec<String>),
}

impl Projection {
    /// Project `item` given the key attribute names that are always kept
    pub(crate) fn apply(&self, item: &Item, key_attributes: &[&str]) -> Item {
        match self {
            Projection::All => item.clone(),
            Projection::KeysOnly => item.project(key_attributes.iter().copied()),
            Projection::Include(names) => item.project(
                key_attributes
                    .iter()
                    .copied()
                    .chain(names.iter().map(String::as_str)),
            ),
        }
    }
}

/// Secondary index definition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDefinition {
    /// Index name, unique within the table
    pub name: String,
    /// Index partition key attribute
    pub partition_key: KeyAttribute,
    /// Optional index sort key attribute
    pub sort_key: Option<KeyAttribute>,
    /// Attributes returned by index queries
    pub projection: Projection,
}

impl IndexDefinition {
    /// Index on `partition_key` projecting all attributes
    pub fn new(name: impl Into<String>, partition_key: KeyAttribute) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key: None,
            projection: Projection::All,
        }
    }

    /// Set the index sort key
    pub fn with_sort_key(mut self, sort_key: KeyAttribute) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    /// Set the projection policy
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// Full key and index schema of a table, fixed at creation
///
/// ```
/// use dynamo_engine::{IndexDefinition, KeyAttribute, TableSchema};
///
/// let schema = TableSchema::new("MovieRoles", KeyAttribute::string("Actor"))
///     .with_sort_key(KeyAttribute::string("Movie"))
///     .with_index(
///         IndexDefinition::new("GenreYearIndex", KeyAttribute::string("Genre"))
///             .with_sort_key(KeyAttribute::number("Year")),
///     );
/// assert!(schema.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Partition key attribute
    pub partition_key: KeyAttribute,
    /// Optional sort key attribute
    pub sort_key: Option<KeyAttribute>,
    /// Secondary indexes
    pub indexes: Vec<IndexDefinition>,
}

impl TableSchema {
    /// Schema with a partition key only and no indexes
    pub fn new(name: impl Into<String>, partition_key: KeyAttribute) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key: None,
            indexes: Vec::new(),
        }
    }

    /// Set the sort key
    pub fn with_sort_key(mut self, sort_key: KeyAttribute) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    /// Add a secondary index
    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Look up an index definition by name
    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// Check the schema is well formed
    ///
    /// Rejects empty names, a base table whose partition and sort key are the
    /// same attribute, duplicate index names, and an attribute declared with two
    /// different types. An index may use one attribute as both its partition
    /// and sort key.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidSchema("table name must not be empty".into()));
        }

        check_attribute_name(&self.partition_key, &self.name)?;
        if let Some(sort_key) = &self.sort_key {
            check_attribute_name(sort_key, &self.name)?;
            if sort_key.name == self.partition_key.name {
                return Err(Error::InvalidSchema(format!(
                    "table {} uses {} as both partition and sort key",
                    self.name, sort_key.name
                )));
            }
        }

        let mut index_names = BTreeSet::new();
        for index in &self.indexes {
            if index.name.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "table {} has an index with an empty name",
                    self.name
                )));
            }
            if !index_names.insert(index.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate index name {}",
                    index.name
                )));
            }
            check_attribute_name(&index.partition_key, &index.name)?;
            if let Some(sort_key) = &index.sort_key {
                check_attribute_name(sort_key, &index.name)?;
            }
        }

        let mut definitions: BTreeMap<&str, KeyType> = BTreeMap::new();
        for attribute in self.key_attributes() {
            match definitions.get(attribute.name.as_str()) {
                Some(existing) if *existing != attribute.key_type => {
                    return Err(Error::InvalidSchema(format!(
                        "attribute {} is declared as both {} and {}",
                        attribute.name, existing, attribute.key_type
                    )));
                }
                Some(_) => {}
                None => {
                    let _ = definitions.insert(attribute.name.as_str(), attribute.key_type);
                }
            }
        }

        Ok(())
    }

    /// Every key attribute declared by the table and its indexes
    fn key_attributes(&self) -> impl Iterator<Item = &KeyAttribute> {
        std::iter::once(&self.partition_key)
            .chain(self.sort_key.as_ref())
            .chain(self.indexes.iter().flat_map(|index| {
                std::iter::once(&index.partition_key).chain(index.sort_key.as_ref())
            }))
    }

    /// Names of the base table key attributes
    pub(crate) fn primary_key_names(&self) -> Vec<&str> {
        std::iter::once(self.partition_key.name.as_str())
            .chain(self.sort_key.as_ref().map(|k| k.name.as_str()))
            .collect()
    }
}

fn check_attribute_name(attribute: &KeyAttribute, owner: &str) -> Result<()> {
    if attribute.name.is_empty() {
        return Err(Error::InvalidSchema(format!(
            "{owner} has a key attribute with an empty name"
        )));
    }
    Ok(())
}

/// Schema and size of a live table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDescription {
    /// The table's schema
    pub schema: TableSchema,
    /// Number of items stored
    pub item_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_roles() -> TableSchema {
        TableSchema::new("MovieRoles", KeyAttribute::string("Actor"))
            .with_sort_key(KeyAttribute::string("Movie"))
            .with_index(
                IndexDefinition::new("GenreYearIndex", KeyAttribute::string("Genre"))
                    .with_sort_key(KeyAttribute::number("Year")),
            )
    }

    #[test]
    fn test_valid_schema() {
        assert!(movie_roles().validate().is_ok());
        assert!(
            TableSchema::new("Users", KeyAttribute::string("Username"))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_empty_names_rejected() {
        let err = TableSchema::new("", KeyAttribute::string("Username"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));

        let err = TableSchema::new("Users", KeyAttribute::string(""))
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));

        let err = movie_roles()
            .with_index(IndexDefinition::new("", KeyAttribute::string("Genre")))
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = movie_roles()
            .with_index(IndexDefinition::new(
                "GenreYearIndex",
                KeyAttribute::string("Genre"),
            ))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate index name"));
    }

    #[test]
    fn test_conflicting_attribute_types_rejected() {
        let err = movie_roles()
            .with_index(IndexDefinition::new(
                "YearIndex",
                KeyAttribute::string("Year"),
            ))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("Year"));
    }

    #[test]
    fn test_base_key_reuse_rejected_but_index_reuse_allowed() {
        let err = TableSchema::new("T", KeyAttribute::string("a"))
            .with_sort_key(KeyAttribute::string("a"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));

        let schema = TableSchema::new("T", KeyAttribute::string("a")).with_index(
            IndexDefinition::new("ByB", KeyAttribute::string("b"))
                .with_sort_key(KeyAttribute::string("b")),
        );
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_projection_apply() {
        let item = Item::new()
            .with_string("Actor", "Tom Hanks")
            .with_string("Movie", "Cast Away")
            .with_string("Genre", "Drama")
            .with_number("Year", 2000)
            .with_string("Role", "Chuck Noland");
        let keys = ["Actor", "Movie", "Genre", "Year"];

        assert_eq!(Projection::All.apply(&item, &keys), item);

        let keys_only = Projection::KeysOnly.apply(&item, &keys);
        assert_eq!(keys_only.len(), 4);
        assert!(!keys_only.contains("Role"));

        let include = Projection::Include(vec!["Role".into()]).apply(&item, &["Actor"]);
        assert_eq!(include.len(), 2);
        assert!(include.contains("Role"));
    }
}
