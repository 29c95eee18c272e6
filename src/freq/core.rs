//! Counting drivers.
//!
//! All modes share the same pipeline: plan partitions, scan each range with a
//! [`RangeScanner`], count, then build a sorted [`Report`]. They differ only
//! in where counts go:
//!
//! - [`Mode::Sequential`]: one range, one `HashMap`.
//! - [`Mode::Std`]: one `HashMap` per partition on the rayon pool, merged
//!   after every task has finished.
//! - [`Mode::LockFree`]: one OS thread per partition, all writing into a
//!   single shared [`FrequencyTable`].

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use log::{debug, error, trace};
use rayon::prelude::*;

use crate::config::FreqConfig;
use crate::error::{FreqError, Result};
use crate::instrument::{CpuTimeAccumulator, ThreadCpuTimer};
use crate::partition::plan_for;
use crate::report::Report;
use crate::scan::RangeScanner;
use crate::source::{ByteSource, FileSource, load};
use crate::table::FrequencyTable;

/// How a run counts words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    Std,
    LockFree,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Sequential, Mode::Std, Mode::LockFree];

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Sequential => "seq",
            Mode::Std => "std",
            Mode::LockFree => "lockfree",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "seq" | "sequential" => Ok(Mode::Sequential),
            "std" => Ok(Mode::Std),
            "lockfree" | "lock-free" | "lf" => Ok(Mode::LockFree),
            _ => Err(format!(
                "unknown mode '{}' (expected one of: seq, std, lockfree)",
                s
            )),
        }
    }
}

/// Count `source` with the given mode. `cpu` collects the CPU time spent by
/// every scanning thread.
pub fn count_words<S: ByteSource + ?Sized>(
    source: &S,
    mode: Mode,
    config: &FreqConfig,
    cpu: &CpuTimeAccumulator,
) -> Result<Report> {
    config.validate()?;
    debug!(
        "{}: {} bytes, {} partitions, {} buckets, {}-byte blocks",
        mode,
        source.len(),
        config.partition_count(),
        config.bucket_count(),
        config.block_size()
    );
    match mode {
        Mode::Sequential => count_sequential(source, config, cpu),
        Mode::Std => count_std(source, config, cpu),
        Mode::LockFree => count_lock_free(source, config, cpu),
    }
}

/// Open `path` and count it. With `mmap` the file is loaded through
/// [`load`]; otherwise workers share one positional-read handle.
pub fn count_file(
    path: &Path,
    mode: Mode,
    config: &FreqConfig,
    mmap: bool,
    cpu: &CpuTimeAccumulator,
) -> Result<Report> {
    if mmap {
        let data = load(path)?;
        count_words(&*data, mode, config, cpu)
    } else {
        let source = FileSource::open(path)?;
        count_words(&source, mode, config, cpu)
    }
}

fn bump(counts: &mut HashMap<String, u64>, word: &str) {
    match counts.get_mut(word) {
        Some(c) => *c += 1,
        None => {
            counts.insert(word.to_string(), 1);
        }
    }
}

/// Scan one range into a fresh map, timing the calling thread.
fn count_range_into_map<S: ByteSource + ?Sized>(
    source: &S,
    range: Range<u64>,
    block_size: usize,
    cpu: &CpuTimeAccumulator,
) -> Result<(u64, HashMap<String, u64>)> {
    let timer = ThreadCpuTimer::start();
    let mut counts = HashMap::new();
    let mut scanner = RangeScanner::new(block_size)?;
    let words = scanner.scan_range(source, range, |w| bump(&mut counts, w));
    timer.record(cpu);
    Ok((words?, counts))
}

/// The whole source as one range into one `HashMap`.
pub fn count_sequential<S: ByteSource + ?Sized>(
    source: &S,
    config: &FreqConfig,
    cpu: &CpuTimeAccumulator,
) -> Result<Report> {
    let (total, counts) = count_range_into_map(source, 0..source.len(), config.block_size(), cpu)?;
    Ok(Report::from_pairs(total, counts.into_iter().collect()))
}

/// One private `HashMap` per partition on the rayon pool, merged at the end.
pub fn count_std<S: ByteSource + ?Sized>(
    source: &S,
    config: &FreqConfig,
    cpu: &CpuTimeAccumulator,
) -> Result<Report> {
    let plan = plan_for(source, config.partition_count())?;
    let ranges: Vec<Range<u64>> = plan.ranges().collect();
    let block_size = config.block_size();

    let partials: Vec<(u64, HashMap<String, u64>)> = ranges
        .into_par_iter()
        .map(|range| count_range_into_map(source, range, block_size, cpu))
        .collect::<Result<_>>()?;

    // Merge into the largest map to move the fewest keys.
    let mut partials = partials.into_iter();
    let (mut total, mut merged) = partials.next().unwrap_or_default();
    for (words, counts) in partials {
        total += words;
        if counts.len() > merged.len() {
            let smaller = std::mem::replace(&mut merged, counts);
            for (w, c) in smaller {
                *merged.entry(w).or_insert(0) += c;
            }
        } else {
            for (w, c) in counts {
                *merged.entry(w).or_insert(0) += c;
            }
        }
    }
    Ok(Report::from_pairs(total, merged.into_iter().collect()))
}

/// One OS thread per partition, all sharing one [`FrequencyTable`].
///
/// The table is drained only after the thread scope has joined every
/// worker. If any worker fails, the others still run to completion, but the
/// run returns the first error since its report would be incomplete.
pub fn count_lock_free<S: ByteSource + ?Sized>(
    source: &S,
    config: &FreqConfig,
    cpu: &CpuTimeAccumulator,
) -> Result<Report> {
    let plan = plan_for(source, config.partition_count())?;
    let block_size = config.block_size();
    let mut table = FrequencyTable::new(config.bucket_count());

    let outcomes: Vec<Result<u64>> = std::thread::scope(|s| {
        let handles: Vec<_> = plan
            .ranges()
            .enumerate()
            .map(|(part, range)| {
                let table = &table;
                s.spawn(move || {
                    let timer = ThreadCpuTimer::start();
                    let result = RangeScanner::new(block_size).and_then(|mut scanner| {
                        scanner.scan_range(source, range.clone(), |w| {
                            table.increment_count(w, 1);
                        })
                    });
                    let elapsed = timer.record(cpu);
                    trace!(
                        "part {}: [{}, {}) done in {:?} cpu",
                        part, range.start, range.end, elapsed
                    );
                    result
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(part, h)| {
                h.join()
                    .unwrap_or_else(|_| Err(FreqError::WorkerPanicked { part }))
            })
            .collect()
    });

    let mut total = 0u64;
    let mut first_err = None;
    for (part, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(words) => {
                debug!("part {}: {} words", part, words);
                total += words;
            }
            Err(e) => {
                error!("part {}: {}", part, e);
                first_err.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    let stats = table.stats();
    debug!(
        "table: {} entries in {} buckets ({} empty, longest chain {})",
        stats.entries, stats.buckets, stats.empty_buckets, stats.longest_chain
    );
    debug_assert_eq!(table.total(), total);
    Ok(Report::from_pairs(total, table.drain()))
}
