/// Test helpers and fixtures for engine integration tests
///
/// Every test builds its own [`Engine`], so tests run in parallel without
/// sharing state.
pub mod fixtures;

#[allow(unused_imports)]
pub use dynamo_engine::{
    Engine, Error, IndexDefinition, Item, KeyAttribute, PrimaryKey, PutCondition, Query,
    SortKeyCondition, TableModel, TableSchema, setup,
};
#[allow(unused_imports)]
pub use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
pub use serde_json::json;

#[allow(unused_imports)]
pub use fixtures::{MovieRole, User, movie_roles};

use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh engine with default limits
pub fn engine() -> Engine {
    init_tracing();
    Engine::new()
}

/// Build an item from a JSON object
pub fn item(value: serde_json::Value) -> Item {
    serde_dynamo::to_item(value).unwrap()
}

/// `Users`: partition key `Username`, no sort key
pub fn users_schema() -> TableSchema {
    TableSchema::new("Users", KeyAttribute::string("Username"))
}

/// `MovieRoles`: `Actor` / `Movie`, indexed by `Genre` / `Year`
pub fn movie_roles_schema() -> TableSchema {
    TableSchema::new("MovieRoles", KeyAttribute::string("Actor"))
        .with_sort_key(KeyAttribute::string("Movie"))
        .with_index(
            IndexDefinition::new("GenreYearIndex", KeyAttribute::string("Genre"))
                .with_sort_key(KeyAttribute::number("Year")),
        )
}

/// Engine holding `MovieRoles` loaded with [`movie_roles`]
#[allow(dead_code)]
pub async fn movie_roles_engine() -> Engine {
    let engine = engine();
    let _ = engine.create_table(movie_roles_schema()).await.unwrap();
    for role in movie_roles() {
        let _ = engine.put_item("MovieRoles", role, None).await.unwrap();
    }
    engine
}

/// Values of one string attribute across `items`, in order
#[allow(dead_code)]
pub fn strings<'a>(items: &'a [Item], name: &str) -> Vec<&'a str> {
    items.iter().filter_map(|item| item.get_string(name)).collect()
}
