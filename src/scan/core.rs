use std::ops::Range;

use log::trace;

use crate::error::{FreqError, Result};
use crate::source::ByteSource;
use crate::tokenize::{for_each_word, is_space, last_space};

/// Streams a byte range through a fixed-size block buffer and reports every
/// word in it, in order.
///
/// A block that fills up and ends inside a word is cut back to its last
/// whitespace byte; the cut-off tail is re-read at the start of the next
/// block, so no word is ever split between two blocks. One scanner per
/// thread: the scanner owns its buffer and nothing else.
pub struct RangeScanner {
    block_size: usize,
    buf: Vec<u8>,
}

impl RangeScanner {
    pub fn new(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(FreqError::config("block size must be positive"));
        }
        Ok(Self {
            block_size,
            buf: vec![0u8; block_size],
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Scan `[start, end)` of `source`, calling `on_word` for every word.
    /// Returns the number of words reported.
    ///
    /// Fails with [`FreqError::BoundaryOverflow`] if a full block that is not
    /// the last one of the range contains no whitespace at all: that word is
    /// longer than a block and cannot be carried over without truncation.
    /// A source shorter than `end` simply ends the scan early.
    pub fn scan<S, F>(&mut self, source: &S, start: u64, end: u64, mut on_word: F) -> Result<u64>
    where
        S: ByteSource + ?Sized,
        F: FnMut(&str),
    {
        debug_assert!(start <= end, "scan range start {} > end {}", start, end);
        let mut pos = start;
        let mut emitted = 0u64;

        while pos < end {
            let to_read = (end - pos).min(self.block_size as u64) as usize;
            let n = source.read_full_at(pos, &mut self.buf[..to_read])?;
            if n == 0 {
                break;
            }

            let mut block = &self.buf[..n];
            if n == to_read && pos + (n as u64) < end && !is_space(block[n - 1]) {
                match last_space(block) {
                    Some(ws) => block = &block[..=ws],
                    None => {
                        return Err(FreqError::BoundaryOverflow {
                            offset: pos,
                            block_size: self.block_size,
                        });
                    }
                }
            }

            emitted += for_each_word(block, &mut on_word);
            pos += block.len() as u64;
        }

        trace!("scan: [{}, {}) -> {} words", start, end, emitted);
        Ok(emitted)
    }

    /// [`RangeScanner::scan`] over a `Range`.
    pub fn scan_range<S, F>(&mut self, source: &S, range: Range<u64>, on_word: F) -> Result<u64>
    where
        S: ByteSource + ?Sized,
        F: FnMut(&str),
    {
        self.scan(source, range.start, range.end, on_word)
    }
}
