use serde_dynamo::Error as SerdeDynamoError;
use std::fmt;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of resource a [`Error::NotFound`] refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// A table
    Table,
    /// A secondary index on a table
    Index,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Table => f.write_str("table"),
            ResourceKind::Index => f.write_str("index"),
        }
    }
}

/// Table engine operation error
#[derive(Debug, Error)]
pub enum Error {
    /// A table or index required by the operation does not exist
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What was looked up
        kind: ResourceKind,
        /// Name of the missing table or index
        name: String,
    },
    /// A table with the same name already exists
    #[error("table already exists: {0}")]
    AlreadyExists(String),
    /// The precondition attached to a put was not met; nothing was written
    #[error("the conditional request failed")]
    ConditionFailed,
    /// The table or index definition is malformed
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The item is missing a key attribute or carries one with the wrong type
    #[error("invalid item: {0}")]
    InvalidItem(String),
    /// The primary key does not match the table's key schema
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// The query's key condition does not match the queried key schema
    #[error("invalid key condition: {0}")]
    InvalidCondition(String),
    /// A batch request exceeds the engine's declared maximum
    #[error("batch of {requested} requests exceeds the maximum of {max}")]
    BatchTooLarge {
        /// Number of requests submitted
        requested: usize,
        /// Maximum accepted per call
        max: usize,
    },
    /// Typed model serialization/deserialization error
    #[error("item serialization error: {0}")]
    Serialization(#[from] SerdeDynamoError),
}

impl Error {
    pub(crate) fn table_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: ResourceKind::Table,
            name: name.into(),
        }
    }

    pub(crate) fn index_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: ResourceKind::Index,
            name: name.into(),
        }
    }

    /// Check if the error reports a missing table or index
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if the error is a failed put precondition
    ///
    /// Mirrors DynamoDB's `ConditionalCheckFailedException`: the write was
    /// rejected and the stored item is unchanged.
    pub fn is_conditional_check_failed(&self) -> bool {
        matches!(self, Error::ConditionFailed)
    }

    /// Check if the error is a serialization/deserialization error
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::Serialization(_))
    }

    /// Check if the request itself was malformed
    ///
    /// Returns `true` for schema, item, key and key condition errors. These are
    /// never worth retrying unchanged.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSchema(_)
                | Error::InvalidItem(_)
                | Error::InvalidKey(_)
                | Error::InvalidCondition(_)
        )
    }
}
