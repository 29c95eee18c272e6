//! Error type shared by every stage of a counting run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a counting run.
///
/// Tokenization and table updates never fail; only configuration, source
/// I/O and the block-boundary check can.
#[derive(Debug, Error)]
pub enum FreqError {
    /// A partition, bucket or block count was not positive.
    #[error("invalid configuration: {message}")]
    Config { message: &'static str },

    /// The corpus could not be opened or sized.
    #[error("cannot open '{}': {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single word is longer than one scanner block, so it cannot be
    /// carried over to the next block without truncating it.
    #[error("word at byte offset {offset} exceeds the {block_size}-byte scan block")]
    BoundaryOverflow { offset: u64, block_size: usize },

    /// A read failed after the source was opened.
    #[error("read error: {0}")]
    Io(#[from] io::Error),

    /// A worker thread panicked before finishing its range.
    #[error("worker for partition {part} panicked")]
    WorkerPanicked { part: usize },
}

impl FreqError {
    pub(crate) fn config(message: &'static str) -> Self {
        FreqError::Config { message }
    }
}

pub type Result<T> = std::result::Result<T, FreqError>;
