use super::*;

use std::time::Duration;

#[test]
fn test_accumulator_starts_at_zero() {
    assert_eq!(CpuTimeAccumulator::new().total(), Duration::ZERO);
}

#[test]
fn test_accumulator_sums_across_threads() {
    let acc = CpuTimeAccumulator::new();
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    acc.add(Duration::from_micros(10));
                }
            });
        }
    });
    assert_eq!(acc.total(), Duration::from_millis(8));
}

#[test]
fn test_thread_timer_records_into_accumulator() {
    let acc = CpuTimeAccumulator::new();
    let timer = ThreadCpuTimer::start();
    let mut x = 0u64;
    for i in 0..200_000u64 {
        x = x.wrapping_mul(31).wrapping_add(i);
    }
    std::hint::black_box(x);
    let elapsed = timer.record(&acc);
    assert_eq!(acc.total(), elapsed);
}

#[cfg(target_os = "linux")]
#[test]
fn test_resident_memory_reports_nonzero_on_linux() {
    let rss = resident_memory();
    assert!(rss.current > 0);
    assert!(rss.peak > 0);
}

#[test]
fn test_mem_rss_display() {
    let rss = MemRss {
        current: 2048,
        peak: 4096,
    };
    assert_eq!(rss.to_string(), "rss 2 KiB (peak 4 KiB)");
}
