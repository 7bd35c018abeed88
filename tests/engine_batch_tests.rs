/// Batch get, batch write and retry tests
mod helpers;
use dynamo_engine::{
    BatchWriteOutput, BatchWriter, EngineConfig, RetryConfig, WriteRequest, write_all,
};
use helpers::*;
use std::sync::Mutex;
use std::time::Duration;

fn user(name: &str) -> Item {
    item(json!({ "Username": name, "Name": name.to_uppercase() }))
}

fn users(count: usize) -> Vec<Item> {
    (0..count).map(|i| user(&format!("user{i:03}"))).collect()
}

async fn users_engine(config: EngineConfig) -> Engine {
    init_tracing();
    let engine = Engine::with_config(config);
    let _ = engine.create_table(users_schema()).await.unwrap();
    engine
}

fn fast_retries() -> RetryConfig {
    RetryConfig {
        max_retries: 10,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        concurrency: 4,
    }
}

#[tokio::test]
async fn test_batch_get_found_and_missing() {
    let engine = movie_roles_engine().await;

    let cast_away = PrimaryKey::new("Tom Hanks").with_sort("Cast Away");
    let black_swan = PrimaryKey::new("Natalie Portman").with_sort("Black Swan");
    let missing = PrimaryKey::new("Tom Hanks").with_sort("Big");

    let output = engine
        .batch_get_item(
            "MovieRoles",
            vec![cast_away.clone(), missing.clone(), black_swan.clone()],
        )
        .await
        .unwrap();

    assert_eq!(output.len(), 2);
    assert_eq!(output.get(&cast_away), Some(&movie_roles()[0]));
    assert_eq!(output.get(&black_swan), Some(&movie_roles()[3]));
    assert!(output.get(&missing).is_none());
}

#[tokio::test]
async fn test_batch_get_missing_table() {
    let engine = engine();
    let err = engine
        .batch_get_item("MovieRoles", vec![PrimaryKey::new("Tom Hanks")])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_batch_get_size_boundary() {
    let engine = users_engine(EngineConfig::default()).await;

    let keys: Vec<PrimaryKey> = (0..100).map(|i| PrimaryKey::new(format!("user{i:03}"))).collect();
    let output = engine.batch_get_item("Users", keys.clone()).await.unwrap();
    assert!(output.is_empty());

    let mut too_many = keys;
    too_many.push(PrimaryKey::new("one-more"));
    let err = engine.batch_get_item("Users", too_many).await.unwrap_err();
    assert!(matches!(err, Error::BatchTooLarge { requested: 101, max: 100 }));
}

/// Exceeding the write limit fails fast and writes nothing
#[tokio::test]
async fn test_batch_write_size_boundary() {
    let engine = users_engine(EngineConfig::default()).await;

    let output = engine.batch_write_item("Users", users(25), vec![]).await.unwrap();
    assert!(output.is_success());
    assert_eq!(engine.describe_table("Users").await.unwrap().item_count, 25);

    let err = engine
        .batch_write_item("Users", users(20), vec![PrimaryKey::new("x"); 6])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BatchTooLarge { requested: 26, max: 25 }));
    assert_eq!(engine.describe_table("Users").await.unwrap().item_count, 25);
}

/// Puts and deletes land in one call and indexes follow
#[tokio::test]
async fn test_batch_write_puts_and_deletes() {
    let engine = movie_roles_engine().await;

    let heat = item(json!({
        "Actor": "Al Pacino",
        "Movie": "Heat",
        "Role": "Vincent Hanna",
        "Year": 1995,
        "Genre": "Drama"
    }));
    let output = engine
        .batch_write_item(
            "MovieRoles",
            vec![heat.clone()],
            vec![PrimaryKey::new("Tom Hanks").with_sort("Cast Away")],
        )
        .await
        .unwrap();
    assert!(output.is_success());
    assert_eq!(output.unprocessed_count(), 0);

    let dramas = engine
        .query("MovieRoles", &Query::new("Drama").index("GenreYearIndex"))
        .await
        .unwrap();
    assert_eq!(strings(&dramas.items, "Movie"), vec!["Heat", "Black Swan"]);
}

/// Hands back the last request of a batch as unprocessed, `deferrals` times
struct FlakyWriter {
    engine: Engine,
    deferrals_left: Mutex<usize>,
}

impl FlakyWriter {
    fn new(engine: Engine, deferrals: usize) -> Self {
        Self {
            engine,
            deferrals_left: Mutex::new(deferrals),
        }
    }
}

impl BatchWriter for FlakyWriter {
    fn max_batch_write(&self) -> usize {
        self.engine.config().max_batch_write
    }

    async fn batch_write(
        &self,
        table_name: &str,
        mut puts: Vec<Item>,
        mut deletes: Vec<PrimaryKey>,
    ) -> Result<BatchWriteOutput, Error> {
        let defer = {
            let mut left = self.deferrals_left.lock().unwrap();
            let defer = *left > 0;
            if defer {
                *left -= 1;
            }
            defer
        };

        let mut deferred = BatchWriteOutput::default();
        if defer {
            if let Some(key) = deletes.pop() {
                deferred.unprocessed_deletes.push(key);
            } else if let Some(item) = puts.pop() {
                deferred.unprocessed_puts.push(item);
            }
        }

        let output = self.engine.batch_write_item(table_name, puts, deletes).await?;
        assert!(output.is_success());
        Ok(deferred)
    }
}

/// Re-submitting until nothing is unprocessed applies every operation
#[tokio::test]
async fn test_write_all_until_no_unprocessed() {
    let engine = users_engine(EngineConfig::default().with_max_batch_write(5)).await;
    let _ = engine
        .batch_write_item("Users", vec![user("stale1"), user("stale2")], vec![])
        .await
        .unwrap();

    let writer = FlakyWriter::new(engine.clone(), 7);
    let deletes = vec![PrimaryKey::new("stale1"), PrimaryKey::new("stale2")];

    let output = write_all(&writer, "Users", users(12), deletes, &fast_retries())
        .await
        .unwrap();

    assert!(output.is_success(), "left over: {:?}", output.unprocessed);
    assert_eq!(output.processed, 14);
    assert!(output.retry_count > 0);

    let all = engine.scan("Users", None).await.unwrap();
    assert_eq!(all.count, 12);
    assert!(strings(&all.items, "Username").iter().all(|name| name.starts_with("user")));
}

#[tokio::test]
async fn test_write_all_reports_leftovers() {
    let engine = users_engine(EngineConfig::default()).await;
    let writer = FlakyWriter::new(engine.clone(), usize::MAX);

    let config = RetryConfig {
        max_retries: 1,
        ..fast_retries()
    };
    let output = write_all(&writer, "Users", users(3), vec![], &config)
        .await
        .unwrap();

    assert!(!output.is_success());
    assert_eq!(output.retry_count, 1);
    assert_eq!(output.processed, 2);
    assert_eq!(output.unprocessed, vec![WriteRequest::Put(users(3)[2].clone())]);
}

#[tokio::test]
async fn test_typed_batch_get_and_write() {
    let engine = engine();
    let _ = setup::table_with_index::<MovieRole>(&engine).await.unwrap();

    let roles = vec![
        MovieRole::new("Tom Hanks", "Cast Away", "Chuck Noland", 2000, "Drama"),
        MovieRole::new("Tom Hanks", "Toy Story", "Woody", 1995, "Children"),
        MovieRole::new("Tim Allen", "Toy Story", "Buzz Lightyear", 1995, "Children"),
    ];
    let written = MovieRole::batch_write(&engine, roles.clone(), vec![]).await.unwrap();
    assert!(written.is_success());
    assert_eq!(written.processed, 3);

    let missing = PrimaryKey::new("Tim Allen").with_sort("Galaxy Quest");
    let keys = vec![
        roles[2].primary_key(),
        missing.clone(),
        roles[0].primary_key(),
    ];
    let output = MovieRole::batch_get(&engine, keys).await.unwrap();

    assert_eq!(output.items, vec![roles[2].clone(), roles[0].clone()]);
    assert_eq!(output.missing_keys, vec![missing]);
}
