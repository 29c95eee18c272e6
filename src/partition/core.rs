use std::ops::Range;

use log::debug;

use crate::error::Result;
use crate::source::ByteSource;
use crate::tokenize::is_space;

/// `N+1` non-decreasing byte offsets `[0, o1, …, S]` splitting a source into
/// `N` contiguous ranges whose inner boundaries all sit on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    offsets: Vec<u64>,
}

impl PartitionPlan {
    /// The single-range plan `[0, size]`.
    pub fn whole(size: u64) -> Self {
        Self {
            offsets: vec![0, size],
        }
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Number of ranges (`offsets().len() - 1`).
    pub fn parts(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Range `k` is `offsets[k]..offsets[k + 1]`. Ranges may be empty when a
    /// long word swallows a whole target slice.
    pub fn ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        self.offsets.windows(2).map(|w| w[0]..w[1])
    }

    pub fn into_offsets(self) -> Vec<u64> {
        self.offsets
    }
}

/// Split `source` (of `size` bytes) into `parts` ranges without cutting a word.
///
/// Degenerate requests (`parts == 0`, `size == 0`, or `size < parts`) yield
/// the single range `[0, size]`; callers must treat that as one part.
///
/// Boundary `i` starts at `i * size / parts`. If that byte is not
/// whitespace, the probe consumes the token it lands in and the boundary
/// becomes the whitespace byte that ends it. Probes past the end clamp to
/// `size`, and each boundary is at least the previous one.
pub fn plan<S: ByteSource + ?Sized>(source: &S, size: u64, parts: usize) -> Result<PartitionPlan> {
    if parts == 0 || size == 0 || size < parts as u64 {
        debug!(
            "partition: degenerate request (size={}, parts={}), using one range",
            size, parts
        );
        return Ok(PartitionPlan::whole(size));
    }

    let mut offsets = Vec::with_capacity(parts + 1);
    offsets.push(0u64);
    let mut prev = 0u64;

    for i in 1..parts {
        let target = (i as u128 * size as u128 / parts as u128) as u64;
        let pos = match source.byte_at(target)? {
            Some(b) if !is_space(b) => source.token_end(target)?,
            Some(_) => target,
            None => size,
        };
        let pos = pos.min(size).max(prev);
        offsets.push(pos);
        prev = pos;
    }

    offsets.push(size);
    debug!("partition: {} parts over {} bytes: {:?}", parts, size, offsets);
    Ok(PartitionPlan { offsets })
}

/// [`plan`] over the whole of `source`.
pub fn plan_for<S: ByteSource + ?Sized>(source: &S, parts: usize) -> Result<PartitionPlan> {
    plan(source, source.len(), parts)
}
