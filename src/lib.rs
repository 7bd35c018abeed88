//! # Embedded Table Engine
//!
//! An in-process, async, DynamoDB-style table engine:
//! - Tables keyed by a partition key and an optional sort key
//! - Sparse secondary indexes with `All`, `KeysOnly` and `Include` projections
//! - Conditional puts (`NotExists` / `Exists`)
//! - Range queries over one partition, ascending or descending
//! - Bounded batch get and batch write
//! - Caller-side re-submission of unprocessed writes with exponential backoff
//!
//! ## Features
//!
//! - **Explicit handle**: an [`Engine`] value owns every table; clones share it
//! - **Atomic index maintenance**: a write updates the base item and all of its
//!   index entries before it returns
//! - **Typed models**: map a `serde` struct onto a table with [`TableModel`]
//!   and store it through `serde_dynamo`
//!
//! ## Quick Start
//!
//! ```rust
//! use dynamo_engine::{Engine, Error, KeyValue, TableModel, setup};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     #[serde(rename = "Username")]
//!     username: String,
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! impl TableModel for User {
//!     const TABLE: &'static str = "Users";
//!     const PARTITION_KEY: &'static str = "Username";
//!
//!     fn partition_key(&self) -> KeyValue {
//!         self.username.as_str().into()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let engine = Engine::new();
//!     setup::table::<User>(&engine).await?;
//!
//!     let user = User {
//!         username: "alexdebrie".to_string(),
//!         name: "Alex DeBrie".to_string(),
//!     };
//!     user.put_new(&engine).await?;
//!
//!     let stored = User::get(&engine, "alexdebrie", None).await?;
//!     assert_eq!(stored, Some(user));
//!
//!     Ok(())
//! }
//! ```
#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod engine;
mod error;

pub use engine::Engine;
pub use error::{Error, ResourceKind, Result};

/// Engine limits
pub mod config;

/// Tables, items, keys and queries
pub mod table;

/// Typed models over tables
pub mod model;

/// Methods of typed models
pub mod methods;

/// Re-submission of unprocessed batch writes
pub mod retry;

/// Table setup for typed models
pub mod setup;

pub use config::EngineConfig;
pub use methods::TableModelMethods;
pub use model::{BatchReadOutput, IndexedModel, TableModel};
pub use retry::{BatchWriter, RetryConfig, WriteAllOutput, write_all};
pub use table::{
    BatchGetOutput, BatchWriteOutput, CompositeKey, IndexDefinition, Item, KeyAttribute, KeyType,
    KeyValue, Number, OutputItems, PrimaryKey, Projection, PutCondition, Query, SortKeyCondition,
    TableDescription, TableSchema, WriteRequest,
};
