//! Caller-side handling of unprocessed batch writes.
//!
//! A batch write may hand back requests it did not apply. The engine never
//! retries on its own; the caller re-submits the leftovers until nothing is
//! returned. [`write_all`] is that loop: it chunks the requests to the
//! writer's batch limit, submits the chunks concurrently, and re-submits
//! unprocessed requests with exponential backoff.

use futures_util::{StreamExt, TryStreamExt};
use std::cmp;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_stream::{self as stream};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::table::{BatchWriteOutput, Item, PrimaryKey, WriteRequest, retry_config};

/// Retry configuration for batch writes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of re-submissions after the first attempt
    pub max_retries: usize,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Maximum number of batches in flight at once
    pub concurrency: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(2000),
            concurrency: 10,
        }
    }
}

/// Something that accepts batch writes and may leave requests unprocessed
pub trait BatchWriter: Send + Sync {
    /// Maximum number of requests accepted per call
    fn max_batch_write(&self) -> usize;

    /// Apply a batch, returning the requests that were not applied
    fn batch_write(
        &self,
        table_name: &str,
        puts: Vec<Item>,
        deletes: Vec<PrimaryKey>,
    ) -> impl Future<Output = Result<BatchWriteOutput>> + Send;
}

impl BatchWriter for Engine {
    fn max_batch_write(&self) -> usize {
        self.config().max_batch_write
    }

    fn batch_write(
        &self,
        table_name: &str,
        puts: Vec<Item>,
        deletes: Vec<PrimaryKey>,
    ) -> impl Future<Output = Result<BatchWriteOutput>> + Send {
        self.batch_write_item(table_name, puts, deletes)
    }
}

/// Output of [`write_all`]
#[must_use = "write results contain requests that could not be applied"]
#[derive(Debug)]
pub struct WriteAllOutput {
    /// Number of requests applied
    pub processed: usize,
    /// Requests still unprocessed after the retry budget ran out
    pub unprocessed: Vec<WriteRequest>,
    /// Number of retry rounds made (0 means no retries needed)
    pub retry_count: usize,
    /// Total execution time including all retries
    pub total_duration: Duration,
}

impl WriteAllOutput {
    /// Check if every request was applied
    pub fn is_success(&self) -> bool {
        self.unprocessed.is_empty()
    }
}

/// Write every put and delete, re-submitting unprocessed requests
///
/// Requests are split into chunks of at most `writer.max_batch_write()` and
/// submitted with up to `config.concurrency` chunks in flight. Whatever comes
/// back unprocessed is retried after `initial_delay * 2^attempt` (capped at
/// `max_delay`) until nothing is left or `max_retries` rounds have run.
///
/// # Errors
///
/// The first error returned by the writer aborts the loop. Requests in
/// chunks that already succeeded stay applied.
///
/// # Example
///
/// ```rust,no_run
/// use dynamo_engine::{Engine, Item, RetryConfig, write_all};
///
/// # async fn example(engine: Engine) -> Result<(), dynamo_engine::Error> {
/// let roles: Vec<Item> = Vec::new();
/// let output = write_all(&engine, "MovieRoles", roles, vec![], &RetryConfig::default()).await?;
/// assert!(output.is_success());
/// # Ok(())
/// # }
/// ```
pub async fn write_all<W>(
    writer: &W,
    table_name: &str,
    puts: Vec<Item>,
    deletes: Vec<PrimaryKey>,
    config: &RetryConfig,
) -> Result<WriteAllOutput>
where
    W: BatchWriter,
{
    let start_time = Instant::now();

    let mut pending: Vec<WriteRequest> = puts
        .into_iter()
        .map(WriteRequest::Put)
        .chain(deletes.into_iter().map(WriteRequest::Delete))
        .collect();
    let requested = pending.len();

    let mut retry_count = 0;
    pending = submit(writer, table_name, pending, config).await?;

    while !pending.is_empty() && retry_count < config.max_retries {
        let delay = retry_config::retry_delay(retry_count, config.initial_delay, config.max_delay);
        tracing::debug!(
            table = %table_name,
            unprocessed = pending.len(),
            attempt = retry_count + 1,
            delay_ms = delay.as_millis() as u64,
            "Retrying unprocessed batch requests"
        );
        sleep(delay).await;

        retry_count += 1;
        pending = submit(writer, table_name, pending, config).await?;
    }

    if !pending.is_empty() {
        tracing::warn!(
            table = %table_name,
            unprocessed = pending.len(),
            retries = retry_count,
            "Batch requests still unprocessed after all retries"
        );
    }

    Ok(WriteAllOutput {
        processed: requested - pending.len(),
        unprocessed: pending,
        retry_count,
        total_duration: start_time.elapsed(),
    })
}

/// One round: chunk, submit concurrently, collect what came back
async fn submit<W>(
    writer: &W,
    table_name: &str,
    requests: Vec<WriteRequest>,
    config: &RetryConfig,
) -> Result<Vec<WriteRequest>>
where
    W: BatchWriter,
{
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = cmp::max(1, writer.max_batch_write());
    let batches: Vec<(Vec<Item>, Vec<PrimaryKey>)> = requests
        .chunks(chunk_size)
        .map(|chunk| {
            let mut puts = Vec::new();
            let mut deletes = Vec::new();
            for request in chunk {
                match request {
                    WriteRequest::Put(item) => puts.push(item.clone()),
                    WriteRequest::Delete(key) => deletes.push(key.clone()),
                }
            }
            (puts, deletes)
        })
        .collect();

    let concurrency = cmp::max(1, batches.len().min(config.concurrency));

    stream::iter(
        batches
            .into_iter()
            .map(|(puts, deletes)| writer.batch_write(table_name, puts, deletes)),
    )
    .buffer_unordered(concurrency)
    .try_fold(Vec::new(), |mut unprocessed, output| async move {
        unprocessed.extend(output.into_requests());
        Ok::<_, Error>(unprocessed)
    })
    .await
}
