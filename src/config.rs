//! Run configuration consumed by the driver.

use crate::error::{FreqError, Result};

/// Default number of partitions (one worker thread each).
pub const DEFAULT_PARTITION_COUNT: usize = 4;

/// Default number of hash buckets in the frequency table.
pub const DEFAULT_BUCKET_COUNT: usize = 4096;

/// Default scanner block size in bytes.
/// Larger blocks mean fewer reads but more memory per worker, and the block
/// must be longer than the longest word in the corpus.
pub const DEFAULT_BLOCK_SIZE: usize = 2048;

/// Partition, bucket and block sizing for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreqConfig {
    partition_count: usize,
    bucket_count: usize,
    block_size: usize,
}

impl FreqConfig {
    /// Build a validated configuration with the default block size.
    pub fn new(partition_count: usize, bucket_count: usize) -> Result<Self> {
        let config = Self {
            partition_count,
            bucket_count,
            block_size: DEFAULT_BLOCK_SIZE,
        };
        config.validate()?;
        Ok(config)
    }

    /// Unvalidated; call [`FreqConfig::validate`] before use.
    pub fn with_partition_count(mut self, n: usize) -> Self {
        self.partition_count = n;
        self
    }

    /// Unvalidated; call [`FreqConfig::validate`] before use.
    pub fn with_bucket_count(mut self, n: usize) -> Self {
        self.bucket_count = n;
        self
    }

    /// Unvalidated; call [`FreqConfig::validate`] before use.
    pub fn with_block_size(mut self, n: usize) -> Self {
        self.block_size = n;
        self
    }

    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Reject any non-positive count.
    pub fn validate(&self) -> Result<()> {
        if self.partition_count == 0 {
            return Err(FreqError::config("partition count must be positive"));
        }
        if self.bucket_count == 0 {
            return Err(FreqError::config("bucket count must be positive"));
        }
        if self.block_size == 0 {
            return Err(FreqError::config("block size must be positive"));
        }
        Ok(())
    }
}

impl Default for FreqConfig {
    fn default() -> Self {
        Self {
            partition_count: DEFAULT_PARTITION_COUNT,
            bucket_count: DEFAULT_BUCKET_COUNT,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}
