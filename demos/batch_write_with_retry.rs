/// Example: Handling unprocessed batch writes with exponential backoff
///
/// A batch write may return requests it did not apply. This shows the loop
/// written by hand and the same loop through `write_all`, against a writer
/// that throttles every other call.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dynamo_engine::{
    BatchWriteOutput, BatchWriter, Engine, Error, IndexDefinition, Item, KeyAttribute, PrimaryKey,
    Query, RetryConfig, TableSchema, write_all,
};

/// Wraps an engine and leaves half of every odd-numbered batch unprocessed
struct ThrottledEngine {
    engine: Engine,
    calls: AtomicUsize,
}

impl BatchWriter for ThrottledEngine {
    fn max_batch_write(&self) -> usize {
        self.engine.config().max_batch_write
    }

    async fn batch_write(
        &self,
        table_name: &str,
        mut puts: Vec<Item>,
        deletes: Vec<PrimaryKey>,
    ) -> Result<BatchWriteOutput, Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let throttled = if call % 2 == 0 {
            puts.split_off(puts.len() / 2)
        } else {
            Vec::new()
        };

        let mut output = self.engine.batch_write_item(table_name, puts, deletes).await?;
        output.unprocessed_puts.extend(throttled);
        Ok(output)
    }
}

fn movie_role(actor: &str, movie: &str, year: i64, genre: &str) -> Item {
    Item::new()
        .with_string("Actor", actor)
        .with_string("Movie", movie)
        .with_key("Year", year)
        .with_string("Genre", genre)
}

fn movie_roles() -> Vec<Item> {
    (0..60)
        .map(|i| {
            let genre = if i % 3 == 0 { "Drama" } else { "Comedy" };
            movie_role(&format!("Actor {i:02}"), &format!("Movie {i:02}"), 1960 + i, genre)
        })
        .collect()
}

/// Re-submit unprocessed requests by hand until none remain
async fn batch_write_with_retry(
    writer: &ThrottledEngine,
    items: Vec<Item>,
    max_retries: usize,
) -> Result<(), Error> {
    let mut unprocessed = items;
    let mut delay = Duration::from_millis(10);

    for attempt in 0..=max_retries {
        let mut next = Vec::new();
        for chunk in unprocessed.chunks(writer.max_batch_write()) {
            let output = writer.batch_write("MovieRoles", chunk.to_vec(), vec![]).await?;
            next.extend(output.unprocessed_puts);
        }

        println!(
            "Attempt {}: wrote {} items, {} unprocessed",
            attempt + 1,
            unprocessed.len() - next.len(),
            next.len()
        );

        unprocessed = next;
        if unprocessed.is_empty() {
            return Ok(());
        }

        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(Duration::from_millis(200));
    }

    eprintln!("{} items still unprocessed", unprocessed.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = Engine::new();
    let _ = engine
        .create_table(
            TableSchema::new("MovieRoles", KeyAttribute::string("Actor"))
                .with_sort_key(KeyAttribute::string("Movie"))
                .with_index(
                    IndexDefinition::new("GenreYearIndex", KeyAttribute::string("Genre"))
                        .with_sort_key(KeyAttribute::number("Year")),
                ),
        )
        .await?;

    let writer = ThrottledEngine {
        engine: engine.clone(),
        calls: AtomicUsize::new(0),
    };

    let roles = movie_roles();
    let (first_half, second_half) = roles.split_at(roles.len() / 2);

    batch_write_with_retry(&writer, first_half.to_vec(), 5).await?;

    let config = RetryConfig {
        initial_delay: Duration::from_millis(10),
        ..RetryConfig::default()
    };
    let output = write_all(&writer, "MovieRoles", second_half.to_vec(), vec![], &config).await?;
    println!(
        "write_all: {} processed, {} unprocessed, {} retries in {:?}",
        output.processed,
        output.unprocessed.len(),
        output.retry_count,
        output.total_duration
    );

    let dramas = engine
        .query("MovieRoles", &Query::new("Drama").index("GenreYearIndex"))
        .await?;
    println!("{} dramas indexed", dramas.count);

    Ok(())
}
