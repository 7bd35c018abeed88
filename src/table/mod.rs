mod batch;
mod gsi;
mod helpers;
mod operations;
mod schema;
pub(crate) mod storage;
mod types;

pub(crate) use helpers::retry_config;

pub use batch::{BatchGetOutput, BatchWriteOutput, WriteRequest};
pub use schema::{IndexDefinition, KeyAttribute, Projection, TableDescription, TableSchema};
pub use types::{
    CompositeKey, Item, KeyType, KeyValue, Number, OutputItems, PartitionKey, PrimaryKey,
    PutCondition, Query, SortKey, SortKeyCondition,
};
