use std::cmp::Ordering;
use std::io::{self, Write};

use rayon::prelude::*;

/// Below this many pairs a serial sort beats rayon's fork/join overhead.
const PAR_SORT_THRESHOLD: usize = 64 * 1024;

/// Output buffer size for `.freq` writers.
const OUTPUT_BUF_SIZE: usize = 256 * 1024;

/// Count descending, then word ascending.
#[inline]
pub fn compare_pairs(a: &(String, u64), b: &(String, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Sort pairs into report order. Words are unique, so an unstable sort
/// still yields one deterministic order.
pub fn sort_pairs(pairs: &mut [(String, u64)]) {
    if pairs.len() >= PAR_SORT_THRESHOLD {
        pairs.par_sort_unstable_by(compare_pairs);
    } else {
        pairs.sort_unstable_by(compare_pairs);
    }
}

/// Result of one counting run, pairs in report order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub total_words: u64,
    pub unique_words: u64,
    pub pairs: Vec<(String, u64)>,
}

impl Report {
    /// Build a report from unsorted `(word, count)` pairs.
    pub fn from_pairs(total_words: u64, mut pairs: Vec<(String, u64)>) -> Self {
        sort_pairs(&mut pairs);
        Self {
            total_words,
            unique_words: pairs.len() as u64,
            pairs,
        }
    }

    /// The `n` most frequent words (fewer if the report is shorter).
    pub fn top(&self, n: usize) -> &[(String, u64)] {
        &self.pairs[..n.min(self.pairs.len())]
    }

    /// Hand the report to a sink.
    pub fn write_to(&self, sink: &mut impl ReportSink) -> io::Result<()> {
        sink.accept(self.total_words, self.unique_words, &self.pairs)
    }
}

/// Receives a finished report. Rendering is entirely up to the sink.
pub trait ReportSink {
    fn accept(&mut self, total_words: u64, unique_words: u64, pairs: &[(String, u64)]) -> io::Result<()>;
}

/// Writes the `.freq` layout: the total word count, the unique word count,
/// then one `"<count> <word>"` line per pair.
pub struct FreqWriter<W: Write> {
    out: io::BufWriter<W>,
}

impl<W: Write> FreqWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: io::BufWriter::with_capacity(OUTPUT_BUF_SIZE, out),
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> ReportSink for FreqWriter<W> {
    fn accept(&mut self, total_words: u64, unique_words: u64, pairs: &[(String, u64)]) -> io::Result<()> {
        let mut num = itoa::Buffer::new();
        self.out.write_all(num.format(total_words).as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.write_all(num.format(unique_words).as_bytes())?;
        self.out.write_all(b"\n")?;
        for (word, count) in pairs {
            self.out.write_all(num.format(*count).as_bytes())?;
            self.out.write_all(b" ")?;
            self.out.write_all(word.as_bytes())?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }
}
