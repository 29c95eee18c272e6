//! Parallel word-frequency counting.
//!
//! A corpus is split into word-aligned byte ranges ([`partition`]), each range
//! is streamed block by block ([`scan`]) through the tokenizer
//! ([`tokenize`]), and every word lands in a shared lock-free table
//! ([`table`]). The [`freq`] drivers tie the stages together and produce a
//! sorted [`report::Report`].
#![allow(
    clippy::collapsible_if,
    clippy::needless_range_loop,
    clippy::len_without_is_empty,
    clippy::doc_lazy_continuation
)]

/// Use mimalloc as the global allocator for all binaries.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod config;
pub mod error;
pub mod freq;
pub mod instrument;
pub mod partition;
pub mod report;
pub mod scan;
pub mod source;
pub mod table;
pub mod tokenize;

pub use config::FreqConfig;
pub use error::FreqError;
pub use freq::{Mode, count_file, count_words};
pub use report::Report;
pub use table::FrequencyTable;
