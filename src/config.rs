/// Default maximum number of keys per `batch_get_item` call (DynamoDB's limit)
pub const DEFAULT_MAX_BATCH_GET: usize = 100;

/// Default maximum number of requests per `batch_write_item` call (DynamoDB's limit)
pub const DEFAULT_MAX_BATCH_WRITE: usize = 25;

/// Engine limits
///
/// ```
/// use dynamo_engine::EngineConfig;
///
/// let config = EngineConfig::default().with_max_batch_write(10);
/// assert_eq!(config.max_batch_get, 100);
/// assert_eq!(config.max_batch_write, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Batch gets above this size fail with `BatchTooLarge`
    pub max_batch_get: usize,
    /// Batch writes above this size fail with `BatchTooLarge`
    pub max_batch_write: usize,
}

impl EngineConfig {
    /// Set the batch get limit
    pub fn with_max_batch_get(mut self, max: usize) -> Self {
        self.max_batch_get = max;
        self
    }

    /// Set the batch write limit
    pub fn with_max_batch_write(mut self, max: usize) -> Self {
        self.max_batch_write = max;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_get: DEFAULT_MAX_BATCH_GET,
            max_batch_write: DEFAULT_MAX_BATCH_WRITE,
        }
    }
}
