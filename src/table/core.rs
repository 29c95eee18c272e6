//! Lock-free word → count table.
//!
//! A fixed array of buckets, each the head of a singly linked chain of
//! nodes. Chains only ever grow at the tail, and a node, once linked, is
//! never moved or freed until the table itself is dropped. That is what
//! makes the raw-pointer traversal below sound without any reclamation
//! scheme: every pointer loaded from a chain stays valid for `&self`.
//!
//! Writers:
//! - walk the chain with acquire loads, so a node observed through a link
//!   is fully initialized;
//! - on a key match, bump the count with a relaxed `fetch_add`;
//! - at the end of the chain, CAS their (lazily allocated, reused across
//!   retries) node into the empty slot with acq-rel / acquire ordering;
//! - on CAS failure, continue the walk from the node that won the slot, so
//!   a concurrently inserted node for the same key is always seen before a
//!   duplicate can be linked.
//!
//! This is lock-free, not wait-free: a writer can lose the tail race many
//! times in a row. Readers ([`FrequencyTable::get`]) never retry.

use std::hash::BuildHasher;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use crossbeam_utils::CachePadded;
use rustc_hash::FxBuildHasher;

pub(crate) struct Node {
    key: Box<str>,
    count: AtomicU64,
    next: AtomicPtr<Node>,
}

impl Node {
    fn alloc(key: &str, count: u64) -> *mut Node {
        Box::into_raw(Box::new(Node {
            key: key.into(),
            count: AtomicU64::new(count),
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// One bucket head per cache line, so a hot word only contends with words
/// in its own bucket.
pub(crate) type Bucket = CachePadded<AtomicPtr<Node>>;

/// Shape of the table after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    pub buckets: usize,
    pub entries: usize,
    pub empty_buckets: usize,
    pub longest_chain: usize,
}

/// Concurrent word-frequency table with a fixed bucket count.
///
/// Shared by reference between any number of writer threads calling
/// [`increment_count`](FrequencyTable::increment_count). Bulk reads go
/// through [`drain`](FrequencyTable::drain), which takes `&mut self` and so
/// cannot overlap with a writer.
pub struct FrequencyTable<S = FxBuildHasher> {
    buckets: Box<[Bucket]>,
    hasher: S,
}

impl FrequencyTable<FxBuildHasher> {
    /// Table with `bucket_count` buckets (clamped to at least one).
    pub fn new(bucket_count: usize) -> Self {
        Self::with_hasher(bucket_count, FxBuildHasher)
    }
}

impl<S: BuildHasher> FrequencyTable<S> {
    pub fn with_hasher(bucket_count: usize, hasher: S) -> Self {
        let buckets = (0..bucket_count.max(1))
            .map(|_| CachePadded::new(AtomicPtr::new(ptr::null_mut())))
            .collect();
        Self { buckets, hasher }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_for(&self, word: &str) -> &AtomicPtr<Node> {
        let idx = (self.hasher.hash_one(word) % self.buckets.len() as u64) as usize;
        &self.buckets[idx]
    }

    /// Add `delta` to the count for `word`, inserting it with count `delta`
    /// if absent. Returns `true` if this call created the entry.
    pub fn increment_count(&self, word: &str, delta: u64) -> bool {
        let mut slot = self.bucket_for(word);
        let mut current = slot.load(Ordering::Acquire);
        let mut fresh: *mut Node = ptr::null_mut();

        loop {
            // SAFETY: non-null pointers in a chain come from `Node::alloc`
            // and stay live until `drop(&mut self)`.
            while let Some(node) = unsafe { current.as_ref() } {
                if *node.key == *word {
                    node.count.fetch_add(delta, Ordering::Relaxed);
                    if !fresh.is_null() {
                        // SAFETY: `fresh` was never published.
                        drop(unsafe { Box::from_raw(fresh) });
                    }
                    return false;
                }
                slot = &node.next;
                current = slot.load(Ordering::Acquire);
            }

            if fresh.is_null() {
                fresh = Node::alloc(word, delta);
            }

            match slot.compare_exchange_weak(
                ptr::null_mut(),
                fresh,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                // Someone else linked first (or a spurious failure left
                // `actual` null): resume the walk from what is there now.
                Err(actual) => current = actual,
            }
        }
    }

    /// Current count for `word`. Safe to call while writers are running; the
    /// answer may be stale by the time it returns.
    pub fn get(&self, word: &str) -> Option<u64> {
        let mut current = self.bucket_for(word).load(Ordering::Acquire);
        // SAFETY: see `increment_count`.
        while let Some(node) = unsafe { current.as_ref() } {
            if *node.key == *word {
                return Some(node.count.load(Ordering::Relaxed));
            }
            current = node.next.load(Ordering::Acquire);
        }
        None
    }

    /// Best-effort copy of the contents while writers may still be running.
    /// Each entry is read atomically, but the result is not a consistent cut.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut out = Vec::new();
        for head in self.buckets.iter() {
            let mut current = head.load(Ordering::Acquire);
            // SAFETY: see `increment_count`.
            while let Some(node) = unsafe { current.as_ref() } {
                out.push((node.key.to_string(), node.count.load(Ordering::Relaxed)));
                current = node.next.load(Ordering::Acquire);
            }
        }
        out
    }

    /// Visit every entry with plain reads, bucket by bucket, each chain in
    /// insertion order.
    fn for_each_entry(&mut self, mut f: impl FnMut(&str, u64)) {
        for head in self.buckets.iter_mut() {
            let mut current = *head.get_mut();
            while !current.is_null() {
                // SAFETY: `&mut self` rules out concurrent writers, and the
                // node is live until drop.
                let node = unsafe { &mut *current };
                f(&node.key, *node.count.get_mut());
                current = *node.next.get_mut();
            }
        }
    }

    /// Flatten the table into `(word, count)` pairs. Requires exclusive
    /// access: every writer must have finished (joined) first. The table is
    /// left intact, so draining twice yields the same pairs.
    pub fn drain(&mut self) -> Vec<(String, u64)> {
        let mut out = Vec::new();
        self.for_each_entry(|word, count| out.push((word.to_string(), count)));
        out
    }

    /// Sum of all counts.
    pub fn total(&mut self) -> u64 {
        let mut total = 0;
        self.for_each_entry(|_, count| total += count);
        total
    }

    pub fn stats(&mut self) -> TableStats {
        let mut stats = TableStats {
            buckets: self.buckets.len(),
            ..TableStats::default()
        };
        for head in self.buckets.iter_mut() {
            let mut chain = 0usize;
            let mut current = *head.get_mut();
            while !current.is_null() {
                chain += 1;
                // SAFETY: exclusive access, node live until drop.
                current = unsafe { *(*current).next.get_mut() };
            }
            if chain == 0 {
                stats.empty_buckets += 1;
            }
            stats.entries += chain;
            stats.longest_chain = stats.longest_chain.max(chain);
        }
        stats
    }
}

impl<S> Drop for FrequencyTable<S> {
    fn drop(&mut self) {
        for head in self.buckets.iter_mut() {
            let mut current = std::mem::replace(head.get_mut(), ptr::null_mut());
            while !current.is_null() {
                // SAFETY: each node was produced by `Box::into_raw` and is
                // reachable from exactly one link.
                let mut node = unsafe { Box::from_raw(current) };
                current = *node.next.get_mut();
            }
        }
    }
}
