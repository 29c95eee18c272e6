use super::*;

use std::io::Write;

use proptest::prelude::*;

use crate::error::FreqError;
use crate::partition::plan_for;
use crate::source::FileSource;

fn words_in(data: &[u8], block_size: usize, start: u64, end: u64) -> Vec<String> {
    let mut scanner = RangeScanner::new(block_size).unwrap();
    let mut out = Vec::new();
    scanner
        .scan(data, start, end, |w| out.push(w.to_string()))
        .unwrap();
    out
}

// ──────────────────────────────────────────────────
// Basic scanning
// ──────────────────────────────────────────────────

#[test]
fn test_zero_block_size_rejected() {
    assert!(matches!(
        RangeScanner::new(0),
        Err(FreqError::Config { .. })
    ));
}

#[test]
fn test_scan_whole_sentence() {
    let data = b"The cat sat. The dog sat!";
    assert_eq!(
        words_in(data, 2048, 0, data.len() as u64),
        vec!["the", "cat", "sat", "the", "dog", "sat"]
    );
}

#[test]
fn test_scan_empty_range() {
    let data = b"hello world";
    assert!(words_in(data, 16, 5, 5).is_empty());
}

#[test]
fn test_scan_returns_emitted_count() {
    let data: &[u8] = b"one, two... 3 four";
    let mut scanner = RangeScanner::new(8).unwrap();
    let n = scanner.scan(data, 0, data.len() as u64, |_| {}).unwrap();
    // "3" cleans to nothing and is not reported
    assert_eq!(n, 3);
}

#[test]
fn test_scan_subrange() {
    let data = b"alpha beta gamma delta";
    assert_eq!(words_in(data, 64, 5, 16), vec!["beta", "gamma"]);
}

// ──────────────────────────────────────────────────
// Block boundaries
// ──────────────────────────────────────────────────

#[test]
fn test_block_boundary_mid_word_backtracks() {
    let data = b"ab cd ef";
    assert_eq!(words_in(data, 4, 0, 8), vec!["ab", "cd", "ef"]);
}

#[test]
fn test_block_boundary_on_whitespace() {
    let data = b"abc def ghi";
    assert_eq!(words_in(data, 4, 0, 11), vec!["abc", "def", "ghi"]);
}

#[test]
fn test_small_blocks_match_large_blocks() {
    let data = b"It was the best of times, it was the worst of times; it was the age of wisdom";
    let end = data.len() as u64;
    assert_eq!(words_in(data, 12, 0, end), words_in(data, 4096, 0, end));
}

#[test]
fn test_word_longer_than_block_is_overflow() {
    let data: &[u8] = b"abcdefgh ij";
    let mut scanner = RangeScanner::new(4).unwrap();
    let err = scanner.scan(data, 0, 11, |_| {}).unwrap_err();
    assert!(matches!(
        err,
        FreqError::BoundaryOverflow {
            offset: 0,
            block_size: 4
        }
    ));
}

#[test]
fn test_overflow_reports_offset_of_failing_block() {
    let data: &[u8] = b"ab abcdefgh";
    let mut scanner = RangeScanner::new(4).unwrap();
    let mut seen = Vec::new();
    let err = scanner
        .scan(data, 0, 11, |w| seen.push(w.to_string()))
        .unwrap_err();
    assert!(matches!(err, FreqError::BoundaryOverflow { offset: 3, .. }));
    // words before the failing block were still reported, never a fragment
    assert_eq!(seen, vec!["ab"]);
}

#[test]
fn test_long_final_word_in_last_block_is_fine() {
    // the last block of a range may end mid-word: nothing follows it
    let data = b"ab cdef";
    assert_eq!(words_in(data, 4, 0, 7), vec!["ab", "cdef"]);
}

#[test]
fn test_source_shorter_than_range_ends_early() {
    let data = b"hello world";
    assert_eq!(words_in(data, 64, 0, 100), vec!["hello", "world"]);
}

// ──────────────────────────────────────────────────
// File-backed scanning
// ──────────────────────────────────────────────────

#[test]
fn test_scan_file_source_multiple_blocks() {
    let mut text = Vec::new();
    for i in 0..500 {
        text.extend_from_slice(if i % 3 == 0 { b"Peace " } else { b"war, " });
    }
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&text).unwrap();
    file.flush().unwrap();

    let source = FileSource::open(file.path()).unwrap();
    let mut scanner = RangeScanner::new(64).unwrap();
    let mut peace = 0;
    let mut war = 0;
    let n = scanner
        .scan(&source, 0, text.len() as u64, |w| match w {
            "peace" => peace += 1,
            "war" => war += 1,
            other => panic!("unexpected word {}", other),
        })
        .unwrap();
    assert_eq!(n, 500);
    assert_eq!(peace, 167);
    assert_eq!(war, 333);
}

// ──────────────────────────────────────────────────
// Partitioned scanning recovers the same token stream
// ──────────────────────────────────────────────────

fn text() -> impl Strategy<Value = Vec<u8>> {
    let word = "[A-Za-z.,!']{1,10}";
    let sep = prop_oneof![Just(" "), Just("\n"), Just("  "), Just("\t"), Just(" -- ")];
    proptest::collection::vec((word, sep), 0..120).prop_map(|parts| {
        let mut out = Vec::new();
        for (w, s) in parts {
            out.extend_from_slice(w.as_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        out
    })
}

proptest! {
    #[test]
    fn prop_partitioned_scan_matches_whole_scan(
        data in text(),
        parts in 1usize..9,
        block_size in 16usize..64,
    ) {
        let size = data.len() as u64;
        let whole = words_in(&data, block_size, 0, size);

        let p = plan_for(&data[..], parts).unwrap();
        let mut pieced = Vec::new();
        for r in p.ranges() {
            pieced.extend(words_in(&data, block_size, r.start, r.end));
        }
        prop_assert_eq!(pieced, whole);
    }
}
